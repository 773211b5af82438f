//! Catalog routes and router assembly.

use crate::AppState;
use crate::ws::ws_handler;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use gridstream_core::catalog::{SimulatorConfig, SimulatorSummary};
use serde_json::{Value, json};

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/simulators", get(list_simulators))
        .route("/api/simulators/{sim_id}", get(get_simulator))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// The simulator selection listing.
async fn list_simulators(State(state): State<AppState>) -> Json<Vec<SimulatorSummary>> {
    Json(state.service.registry().catalog().list())
}

/// Full configuration for one simulator: parameter schema,
/// initial-condition schema, default color scheme.
async fn get_simulator(
    State(state): State<AppState>,
    Path(sim_id): Path<String>,
) -> Result<Json<SimulatorConfig>, (StatusCode, Json<Value>)> {
    match state.service.registry().catalog().get(&sim_id) {
        Some(config) => Ok(Json(config.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Simulator '{sim_id}' not found") })),
        )),
    }
}
