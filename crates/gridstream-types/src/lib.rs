//! Wire-level types shared across the GridStream workspace.
//!
//! This crate sits at the bottom of the dependency graph and defines the
//! payloads that cross the streaming channel: frames, the client/server
//! protocol messages, and the initial-condition shapes. Everything here is
//! plain data with serde derives; no async, no domain logic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Number of steps a simulation runs when the client does not say otherwise.
pub const DEFAULT_STEPS: u64 = 1000;

/// One published snapshot of simulation state.
///
/// A frame is immutable once constructed and is sent exactly once per
/// simulation step. The grid is rectangular (all rows the same length);
/// violating that is a construction bug upstream, not something consumers
/// are expected to tolerate. Non-finite cells are allowed in memory and
/// serialize as `null` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonically increasing step index, starting at 0.
    pub step: u64,
    /// H x W matrix of cell values, row-major.
    pub grid: Vec<Vec<f64>>,
    /// Scalar summary of the grid (e.g. total heat).
    pub metric: f64,
}

impl Frame {
    /// Grid height in rows.
    pub fn height(&self) -> usize {
        self.grid.len()
    }

    /// Grid width in columns (0 for an empty grid).
    pub fn width(&self) -> usize {
        self.grid.first().map(|row| row.len()).unwrap_or(0)
    }

    /// Checks the rectangularity invariant: H >= 1, W >= 1, all rows equal length.
    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        width >= 1 && self.grid.iter().all(|row| row.len() == width)
    }
}

/// A single point source injected into the grid before the run starts.
///
/// Coordinates are in interior space (excluding any boundary ring the
/// kernel maintains internally).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSource {
    pub x: usize,
    pub y: usize,
    pub value: f64,
}

/// Initial conditions supplied with a start request.
///
/// The boolean toggles are forwarded verbatim to the kernel's step
/// operation. When absent, diagonals default to enabled and wrap to
/// disabled, matching the behavior of the legacy stepping loop.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InitialConditions {
    #[serde(default)]
    pub use_diagonals: Option<bool>,
    #[serde(default)]
    pub wrap: Option<bool>,
    #[serde(default)]
    pub sources: Vec<PointSource>,
}

impl InitialConditions {
    /// Diagonal-neighbor toggle with the legacy default applied.
    pub fn use_diagonals_or_default(&self) -> bool {
        self.use_diagonals.unwrap_or(true)
    }

    /// Periodic-wrap toggle with the legacy default applied.
    pub fn wrap_or_default(&self) -> bool {
        self.wrap.unwrap_or(false)
    }
}

fn default_steps() -> u64 {
    DEFAULT_STEPS
}

/// Messages a client sends over the streaming channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request a new simulation session.
    StartSimulation {
        sim_id: String,
        #[serde(default)]
        parameters: HashMap<String, Value>,
        #[serde(default)]
        initial_conditions: InitialConditions,
        #[serde(default = "default_steps")]
        steps: u64,
    },
    /// Request teardown of a running session. Idempotent on the server.
    StopSimulation { session_id: String },
}

/// Messages the server publishes to a session's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The session was created and its runner is live.
    SimulationStarted { session_id: String },
    /// One frame of simulation state.
    GridUpdate {
        step: u64,
        grid: Vec<Vec<f64>>,
        metric: f64,
    },
    /// The session was torn down by an explicit stop request.
    SimulationStopped {},
    /// The session failed; the session transitions to stopped.
    SimulationError { error: String },
}

impl ServerMessage {
    /// Builds a `GridUpdate` from a frame, consuming it.
    pub fn from_frame(frame: Frame) -> Self {
        Self::GridUpdate {
            step: frame.step,
            grid: frame.grid,
            metric: frame.metric,
        }
    }
}
