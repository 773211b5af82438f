//! The per-session step loop.
//!
//! One runner task drives one simulator: step, snapshot, publish, pace,
//! until the target step count is reached or a stop arrives. The pacing
//! sleep is the loop's only suspension point and holds no lock, so many
//! runners coexist without stalling each other.

use gridstream_core::error::{GridStreamError, Result};
use gridstream_core::session::{CreatedSession, Session, SessionRegistry};
use gridstream_core::simulator::{Simulator, StepOptions};
use gridstream_types::{Frame, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Drives a single session to completion, stop, or failure.
///
/// Whatever way the loop exits, the runner deregisters its session, so
/// the registry only ever holds entries with a live runner behind them.
pub struct SessionRunner {
    registry: Arc<SessionRegistry>,
    session: Session,
    simulator: Box<dyn Simulator>,
    cancel: CancellationToken,
    options: StepOptions,
}

impl SessionRunner {
    pub fn new(registry: Arc<SessionRegistry>, created: CreatedSession) -> Self {
        Self {
            registry,
            session: created.session,
            simulator: created.simulator,
            cancel: created.cancel,
            options: created.options,
        }
    }

    /// Runs the step loop. Consumes the runner; intended to be spawned.
    pub async fn run(mut self) {
        let session_id = self.session.id.clone();

        for step in 0..self.session.steps {
            // Stop wins over the next step: nothing is stepped or
            // published once the token is cancelled.
            if self.cancel.is_cancelled() {
                break;
            }

            let frame = match advance(self.simulator.as_mut(), self.options, step) {
                Ok(frame) => frame,
                Err(err) => {
                    error!(session_id = %session_id, step, %err, "simulation failed");
                    self.registry
                        .publish_if_active(
                            &session_id,
                            ServerMessage::SimulationError {
                                error: err.to_string(),
                            },
                        )
                        .await;
                    break;
                }
            };

            if self.cancel.is_cancelled() {
                break;
            }
            // Publication is gated on registry membership: if a stop
            // raced us here, the frame is dropped and the loop ends.
            if !self
                .registry
                .publish_if_active(&session_id, ServerMessage::from_frame(frame))
                .await
            {
                break;
            }

            let pace = self.simulator.time_step();
            if pace > 0.0 {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs_f64(pace)) => {}
                }
            }
        }

        debug!(session_id = %session_id, "runner exiting");
        self.registry.finish(&session_id).await;
    }
}

/// Advances the simulator one step and snapshots the result.
fn advance(simulator: &mut dyn Simulator, options: StepOptions, step: u64) -> Result<Frame> {
    simulator
        .step(options)
        .map_err(|err| GridStreamError::kernel(step, err.to_string()))?;

    let frame = Frame {
        step,
        grid: simulator.grid().to_vec(),
        metric: simulator.metric(),
    };
    // Rectangularity is a construction invariant of every kernel, not a
    // runtime condition to tolerate.
    debug_assert!(frame.is_rectangular(), "kernel produced a ragged grid");

    if !frame.metric.is_finite() {
        return Err(GridStreamError::NonFiniteMetric(step));
    }
    Ok(frame)
}
