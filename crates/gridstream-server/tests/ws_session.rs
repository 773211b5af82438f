//! End-to-end protocol tests over a real WebSocket.

use futures::{SinkExt, StreamExt};
use gridstream_core::catalog::SimulatorCatalog;
use gridstream_core::session::SessionRegistry;
use gridstream_core::simulator::SimulatorBuilders;
use gridstream_execution::SessionService;
use gridstream_server::{AppState, routes};
use gridstream_types::ServerMessage;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> String {
    let mut builders = SimulatorBuilders::new();
    gridstream_sim::register_builtins(&mut builders);
    let state = AppState {
        service: SessionService::new(Arc::new(SessionRegistry::new(
            SimulatorCatalog::builtin(),
            builders,
        ))),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes::router(state)).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

async fn connect(url: &str) -> WsClient {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

async fn send_json(client: &mut WsClient, payload: serde_json::Value) {
    client
        .send(Message::Text(payload.to_string().into()))
        .await
        .unwrap();
}

async fn next_message(client: &mut WsClient) -> ServerMessage {
    loop {
        match client.next().await.expect("socket closed").unwrap() {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

async fn expect_silence(client: &mut WsClient) {
    let outcome = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(outcome.is_err(), "expected no further messages");
}

fn start_heat(steps: u64, time_step: f64) -> serde_json::Value {
    json!({
        "type": "start_simulation",
        "sim_id": "heat",
        "parameters": { "width": 6, "height": 6, "time_step": time_step },
        "initial_conditions": { "sources": [ { "x": 2, "y": 2, "value": 50.0 } ] },
        "steps": steps,
    })
}

#[tokio::test]
async fn test_run_to_completion_protocol_sequence() {
    let url = spawn_server().await;
    let mut client = connect(&url).await;

    send_json(&mut client, start_heat(3, 0.0)).await;

    let session_id = match next_message(&mut client).await {
        ServerMessage::SimulationStarted { session_id } => session_id,
        other => panic!("expected simulation_started, got {other:?}"),
    };
    assert!(!session_id.is_empty());

    for expected in 0..3u64 {
        match next_message(&mut client).await {
            ServerMessage::GridUpdate { step, grid, metric } => {
                assert_eq!(step, expected);
                // 6x6 interior plus the boundary ring.
                assert_eq!(grid.len(), 8);
                assert!(grid.iter().all(|row| row.len() == 8));
                assert!(metric.is_finite());
            }
            other => panic!("expected grid_update, got {other:?}"),
        }
    }

    // Run-to-completion is implicit: no stopped message follows, and
    // stopping the finished session stays a silent no-op.
    send_json(
        &mut client,
        json!({ "type": "stop_simulation", "session_id": session_id }),
    )
    .await;
    expect_silence(&mut client).await;
}

#[tokio::test]
async fn test_stop_after_first_frame() {
    let url = spawn_server().await;
    let mut client = connect(&url).await;

    send_json(&mut client, start_heat(100, 0.25)).await;

    let session_id = match next_message(&mut client).await {
        ServerMessage::SimulationStarted { session_id } => session_id,
        other => panic!("expected simulation_started, got {other:?}"),
    };
    match next_message(&mut client).await {
        ServerMessage::GridUpdate { step, .. } => assert_eq!(step, 0),
        other => panic!("expected grid_update, got {other:?}"),
    }

    send_json(
        &mut client,
        json!({ "type": "stop_simulation", "session_id": session_id }),
    )
    .await;

    match next_message(&mut client).await {
        ServerMessage::SimulationStopped {} => {}
        other => panic!("expected simulation_stopped, got {other:?}"),
    }
    expect_silence(&mut client).await;
}

#[tokio::test]
async fn test_malformed_request_is_rejected_before_the_registry() {
    let url = spawn_server().await;
    let mut client = connect(&url).await;

    send_json(&mut client, json!({ "type": "make_me_a_sandwich" })).await;

    match next_message(&mut client).await {
        ServerMessage::SimulationError { error } => {
            assert!(error.contains("malformed request"));
        }
        other => panic!("expected simulation_error, got {other:?}"),
    }

    // The socket survives the rejection and can still start a session.
    send_json(&mut client, start_heat(1, 0.0)).await;
    assert!(matches!(
        next_message(&mut client).await,
        ServerMessage::SimulationStarted { .. }
    ));
}

#[tokio::test]
async fn test_unknown_simulator_reports_config_error() {
    let url = spawn_server().await;
    let mut client = connect(&url).await;

    send_json(
        &mut client,
        json!({ "type": "start_simulation", "sim_id": "plasma" }),
    )
    .await;

    match next_message(&mut client).await {
        ServerMessage::SimulationError { error } => {
            assert!(error.contains("Unknown simulator"));
        }
        other => panic!("expected simulation_error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sessions_are_isolated_per_socket() {
    let url = spawn_server().await;
    let mut slow = connect(&url).await;
    let mut fast = connect(&url).await;

    // A slow-paced session on one socket...
    send_json(&mut slow, start_heat(100, 0.25)).await;
    let slow_id = match next_message(&mut slow).await {
        ServerMessage::SimulationStarted { session_id } => session_id,
        other => panic!("expected simulation_started, got {other:?}"),
    };

    // ...does not leak frames into another socket's session.
    send_json(&mut fast, start_heat(2, 0.0)).await;
    let fast_id = match next_message(&mut fast).await {
        ServerMessage::SimulationStarted { session_id } => session_id,
        other => panic!("expected simulation_started, got {other:?}"),
    };
    assert_ne!(slow_id, fast_id);

    let mut fast_steps = Vec::new();
    for _ in 0..2 {
        match next_message(&mut fast).await {
            ServerMessage::GridUpdate { step, .. } => fast_steps.push(step),
            other => panic!("expected grid_update, got {other:?}"),
        }
    }
    assert_eq!(fast_steps, vec![0, 1]);
    expect_silence(&mut fast).await;

    send_json(
        &mut slow,
        json!({ "type": "stop_simulation", "session_id": slow_id }),
    )
    .await;
}
