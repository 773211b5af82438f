//! HTTP/WebSocket transport for GridStream.
//!
//! Thin binding of the streaming protocol onto axum: JSON routes expose
//! the simulator catalog, and one WebSocket endpoint carries the
//! `ClientMessage`/`ServerMessage` exchange for session start, frame
//! streaming, and stop.

pub mod routes;
pub mod ws;

use gridstream_execution::SessionService;

/// Shared state for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub service: SessionService,
}
