//! The session lifecycle seam the transport layer talks to.

use crate::runner::SessionRunner;
use gridstream_core::error::Result;
use gridstream_core::session::{SessionHandle, SessionRegistry};
use gridstream_types::InitialConditions;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Starts and stops sessions against a shared registry.
///
/// `start` is the composition point: registry creation (validation,
/// construction, insertion) followed by spawning the runner task. The
/// returned handle's receiver joined the session's room before the
/// runner existed, so the subscriber observes every frame from step 0.
#[derive(Clone)]
pub struct SessionService {
    registry: Arc<SessionRegistry>,
}

impl SessionService {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry backing this service.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Creates a session and spawns its runner.
    ///
    /// Returns without blocking on simulation execution.
    ///
    /// # Errors
    ///
    /// Configuration errors from validation or kernel construction; no
    /// session is registered when this fails.
    pub async fn start(
        &self,
        sim_id: &str,
        parameters: &HashMap<String, Value>,
        initial_conditions: &InitialConditions,
        steps: u64,
    ) -> Result<SessionHandle> {
        let created = self
            .registry
            .create(sim_id, parameters, initial_conditions, steps)
            .await?;

        let session_id = created.session.id.clone();
        let receiver = created.channel.subscribe();

        let runner = SessionRunner::new(self.registry.clone(), created);
        tokio::spawn(runner.run());

        Ok(SessionHandle {
            session_id,
            receiver,
        })
    }

    /// Stops a session. Idempotent; returns whether a live session was
    /// torn down.
    pub async fn stop(&self, session_id: &str) -> bool {
        self.registry.stop(session_id).await
    }
}
