//! Session model and the process-wide session registry.
//!
//! The registry is the only shared mutable state in the service: a map
//! from session identifier to live session entry, mutated by start and
//! stop operations arriving from different request contexts. Insert and
//! remove go through one `RwLock`, so a stop can never race a
//! not-yet-registered start into a half-torn-down entry, and frame
//! publication is gated on membership so nothing is published for a
//! session after its entry is removed.

use crate::catalog::SimulatorCatalog;
use crate::channel::SessionChannel;
use crate::error::Result;
use crate::simulator::{Simulator, SimulatorBuilders, StepOptions};
use gridstream_types::{InitialConditions, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Descriptive record for one live session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Opaque unique identifier (UUID v4).
    pub id: String,
    /// Catalog identifier of the simulator this session runs.
    pub sim_id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Target step count for the run.
    pub steps: u64,
}

/// What a start request hands back to the requesting client context:
/// the session identifier plus a receiver that joined the session's
/// room before the runner published anything.
pub struct SessionHandle {
    pub session_id: String,
    pub receiver: broadcast::Receiver<ServerMessage>,
}

/// Everything the runner needs to drive a freshly created session.
///
/// The simulator is moved out here, exclusively owned by one runner and
/// never shared. The registry retains the channel and the cancellation
/// token for the stop path.
pub struct CreatedSession {
    pub session: Session,
    pub simulator: Box<dyn Simulator>,
    pub channel: SessionChannel,
    pub cancel: CancellationToken,
    pub options: StepOptions,
}

struct SessionEntry {
    session: Session,
    channel: SessionChannel,
    cancel: CancellationToken,
}

/// Process-wide map of active sessions.
pub struct SessionRegistry {
    catalog: SimulatorCatalog,
    builders: SimulatorBuilders,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new(catalog: SimulatorCatalog, builders: SimulatorBuilders) -> Self {
        Self {
            catalog,
            builders,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The catalog backing this registry (used by listing surfaces).
    pub fn catalog(&self) -> &SimulatorCatalog {
        &self.catalog
    }

    /// Validates a start request and registers a new session.
    ///
    /// Parameter resolution and simulator construction happen before any
    /// state is touched: a configuration error never leaves a partial
    /// session behind. Every call constructs a brand-new simulator; two
    /// sessions can never share one instance. The returned
    /// `CreatedSession` carries the simulator out for the runner; the
    /// caller is responsible for actually driving it.
    ///
    /// # Errors
    ///
    /// `UnknownSimulator`, `InvalidParameter`, or `Unstable` when the
    /// request fails validation or the kernel rejects its configuration.
    pub async fn create(
        &self,
        sim_id: &str,
        parameters: &HashMap<String, serde_json::Value>,
        initial_conditions: &InitialConditions,
        steps: u64,
    ) -> Result<CreatedSession> {
        let resolved = self.catalog.resolve(sim_id, parameters)?;
        let mut simulator = self.builders.build(sim_id, &resolved)?;

        for source in &initial_conditions.sources {
            simulator.inject(source.x, source.y, source.value);
        }
        let options = StepOptions {
            use_diagonals: initial_conditions.use_diagonals_or_default(),
            wrap: initial_conditions.wrap_or_default(),
        };

        let session = Session {
            id: Uuid::new_v4().to_string(),
            sim_id: sim_id.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            steps,
        };
        let channel = SessionChannel::new();
        let cancel = CancellationToken::new();

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                channel: channel.clone(),
                cancel: cancel.clone(),
            },
        );
        drop(sessions);

        info!(session_id = %session.id, sim_id, steps, "session registered");

        Ok(CreatedSession {
            session,
            simulator,
            channel,
            cancel,
            options,
        })
    }

    /// Stops a session: signals its runner, removes the entry, and
    /// notifies the room.
    ///
    /// Idempotent: stopping an unknown or already-stopped session is a
    /// no-op and publishes nothing. Returns whether a live session was
    /// actually stopped.
    pub async fn stop(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.remove(session_id) else {
            return false;
        };
        entry.cancel.cancel();
        drop(sessions);

        entry.channel.publish(ServerMessage::SimulationStopped {});
        info!(session_id, "session stopped");
        true
    }

    /// Removes a session that ran to completion (or died on an error).
    ///
    /// Unlike `stop`, nothing is published: completion is implicit, and
    /// dropping the entry's channel clone closes subscriber streams once
    /// the runner's own clone goes away.
    pub async fn finish(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(session_id).is_some() {
            info!(session_id, "session finished");
        }
    }

    /// Publishes a message iff the session is still registered.
    ///
    /// The membership check and the publish happen under the registry
    /// lock, so no message can be delivered for an entry that a
    /// concurrent stop has already removed.
    pub async fn publish_if_active(&self, session_id: &str, message: ServerMessage) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(entry) => {
                entry.channel.publish(message);
                true
            }
            None => false,
        }
    }

    /// Joins a session's room. `None` if the session is not registered.
    pub async fn subscribe(&self, session_id: &str) -> Option<broadcast::Receiver<ServerMessage>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|entry| entry.channel.subscribe())
    }

    /// True if the session is currently registered.
    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResolvedParams;
    use crate::error::GridStreamError;

    struct FlatSim {
        grid: Vec<Vec<f64>>,
        injected: Vec<(usize, usize, f64)>,
    }

    impl FlatSim {
        fn new() -> Self {
            Self {
                grid: vec![vec![0.0; 4]; 4],
                injected: Vec::new(),
            }
        }
    }

    impl Simulator for FlatSim {
        fn step(&mut self, _options: StepOptions) -> Result<()> {
            Ok(())
        }

        fn grid(&self) -> &[Vec<f64>] {
            &self.grid
        }

        fn metric(&self) -> f64 {
            0.0
        }

        fn time_step(&self) -> f64 {
            0.0
        }

        fn inject(&mut self, x: usize, y: usize, value: f64) {
            self.injected.push((x, y, value));
        }
    }

    fn test_registry() -> SessionRegistry {
        let catalog = SimulatorCatalog::from_toml_str(
            r#"
                [flat]
                name = "Flat"
                description = "constant grid"
            "#,
        )
        .unwrap();
        let mut builders = SimulatorBuilders::new();
        builders.register("flat", |_params: &ResolvedParams| {
            Ok(Box::new(FlatSim::new()) as Box<dyn Simulator>)
        });
        SessionRegistry::new(catalog, builders)
    }

    #[tokio::test]
    async fn test_create_registers_session() {
        let registry = test_registry();
        let created = registry
            .create("flat", &HashMap::new(), &InitialConditions::default(), 10)
            .await
            .unwrap();

        assert!(registry.contains(&created.session.id).await);
        assert_eq!(registry.len().await, 1);
        assert_eq!(created.session.sim_id, "flat");
        assert_eq!(created.session.steps, 10);
        assert!(created.options.use_diagonals);
        assert!(!created.options.wrap);
    }

    #[tokio::test]
    async fn test_each_create_gets_a_fresh_adapter() {
        let registry = test_registry();
        let a = registry
            .create("flat", &HashMap::new(), &InitialConditions::default(), 1)
            .await
            .unwrap();
        let b = registry
            .create("flat", &HashMap::new(), &InitialConditions::default(), 1)
            .await
            .unwrap();

        assert_ne!(a.session.id, b.session.id);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_config_error_registers_nothing() {
        let registry = test_registry();
        let err = registry
            .create("missing", &HashMap::new(), &InitialConditions::default(), 1)
            .await
            .err()
            .unwrap();

        assert!(matches!(err, GridStreamError::UnknownSimulator(_)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let registry = test_registry();
        let created = registry
            .create("flat", &HashMap::new(), &InitialConditions::default(), 1)
            .await
            .unwrap();
        let mut rx = created.channel.subscribe();
        let id = created.session.id.clone();

        assert!(registry.stop(&id).await);
        assert!(!registry.stop(&id).await);
        assert!(!registry.stop("never-existed").await);

        // Exactly one stopped notification for the double stop.
        assert_eq!(
            rx.recv().await.unwrap(),
            ServerMessage::SimulationStopped {}
        );
        assert!(rx.try_recv().is_err());
        assert!(created.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_publish_gated_on_membership() {
        let registry = test_registry();
        let created = registry
            .create("flat", &HashMap::new(), &InitialConditions::default(), 1)
            .await
            .unwrap();
        let id = created.session.id.clone();

        assert!(
            registry
                .publish_if_active(&id, ServerMessage::SimulationStarted { session_id: id.clone() })
                .await
        );

        registry.stop(&id).await;
        assert!(
            !registry
                .publish_if_active(&id, ServerMessage::SimulationStopped {})
                .await
        );
    }

    #[tokio::test]
    async fn test_sources_reach_the_simulator() {
        let registry = test_registry();
        let conditions = InitialConditions {
            use_diagonals: Some(false),
            wrap: Some(true),
            sources: vec![gridstream_types::PointSource {
                x: 2,
                y: 3,
                value: 30.0,
            }],
        };
        let created = registry
            .create("flat", &HashMap::new(), &conditions, 1)
            .await
            .unwrap();

        assert!(!created.options.use_diagonals);
        assert!(created.options.wrap);
        assert_eq!(created.session.steps, 1);
    }
}
