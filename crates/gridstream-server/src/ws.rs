//! The WebSocket session: protocol messages in, channel messages out.
//!
//! One socket drives at most one simulation at a time. A start request
//! creates the session and subscribes the socket to its room; frames
//! are then forwarded until the session ends or the client stops it.
//! Closing the socket while a session it started is still live tears
//! that session down.

use crate::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::StreamExt;
use gridstream_types::{ClientMessage, ServerMessage};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut subscription: Option<broadcast::Receiver<ServerMessage>> = None;
    let mut owned_session: Option<String> = None;

    loop {
        tokio::select! {
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let parsed = serde_json::from_str::<ClientMessage>(&text);
                        let alive = match parsed {
                            Ok(message) => {
                                handle_client_message(
                                    &mut socket,
                                    &state,
                                    message,
                                    &mut subscription,
                                    &mut owned_session,
                                )
                                .await
                            }
                            // Malformed requests are rejected before the
                            // registry is ever touched.
                            Err(err) => send_message(
                                &mut socket,
                                &ServerMessage::SimulationError {
                                    error: format!("malformed request: {err}"),
                                },
                            )
                            .await
                            .is_ok(),
                        };
                        if !alive {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!("websocket receive error: {err}");
                        break;
                    }
                }
            }
            event = room_message(&mut subscription) => {
                match event {
                    Ok(message) => {
                        let session_over = matches!(
                            message,
                            ServerMessage::SimulationStopped {}
                                | ServerMessage::SimulationError { .. }
                        );
                        if send_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                        if session_over {
                            subscription = None;
                            owned_session = None;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Staleness is the client's burden; the renderer
                        // only needs the latest frame.
                        warn!(skipped, "subscriber lagged; continuing with newer frames");
                    }
                    Err(RecvError::Closed) => {
                        // Implicit completion: the session ran out of
                        // steps and its room closed.
                        subscription = None;
                        owned_session = None;
                    }
                }
            }
        }
    }

    // Owning connection loss destroys the session it started.
    if let Some(session_id) = owned_session {
        info!(session_id, "connection lost, stopping session");
        state.service.stop(&session_id).await;
    }
}

/// Receives the next room message, or parks forever when the socket has
/// no live subscription.
async fn room_message(
    subscription: &mut Option<broadcast::Receiver<ServerMessage>>,
) -> Result<ServerMessage, RecvError> {
    match subscription.as_mut() {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Handles one parsed client message. Returns false once the socket is
/// no longer usable.
async fn handle_client_message(
    socket: &mut WebSocket,
    state: &AppState,
    message: ClientMessage,
    subscription: &mut Option<broadcast::Receiver<ServerMessage>>,
    owned_session: &mut Option<String>,
) -> bool {
    match message {
        ClientMessage::StartSimulation {
            sim_id,
            parameters,
            initial_conditions,
            steps,
        } => {
            match state
                .service
                .start(&sim_id, &parameters, &initial_conditions, steps)
                .await
            {
                Ok(handle) => {
                    info!(session_id = %handle.session_id, sim_id, "simulation started");
                    let started = ServerMessage::SimulationStarted {
                        session_id: handle.session_id.clone(),
                    };
                    if send_message(socket, &started).await.is_err() {
                        // The requester vanished before the ack; don't
                        // leave its session running unattended.
                        state.service.stop(&handle.session_id).await;
                        return false;
                    }
                    *subscription = Some(handle.receiver);
                    *owned_session = Some(handle.session_id);
                }
                // Config errors go to the requesting client only.
                Err(err) => {
                    warn!(sim_id, %err, "start request rejected");
                    return send_message(
                        socket,
                        &ServerMessage::SimulationError {
                            error: err.to_string(),
                        },
                    )
                    .await
                    .is_ok();
                }
            }
        }
        ClientMessage::StopSimulation { session_id } => {
            // Idempotent: the stopped notification, if any, arrives
            // through the room.
            state.service.stop(&session_id).await;
        }
    }
    true
}

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(err) => {
            error!("failed to serialize server message: {err}");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await
}
