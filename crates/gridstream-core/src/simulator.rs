//! The simulator seam and the builder registration table.
//!
//! The core never knows which physical model it is stepping: it only
//! requires the `Simulator` contract. Concrete kernels live in
//! `gridstream-sim` and are wired in through `SimulatorBuilders`, so a
//! new model can be added without touching this crate.

use crate::catalog::ResolvedParams;
use crate::error::{GridStreamError, Result};
use std::collections::HashMap;

/// Per-step toggles forwarded verbatim from the client's initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOptions {
    /// Include diagonal neighbors in the update stencil.
    pub use_diagonals: bool,
    /// Periodic boundary conditions instead of insulated edges.
    pub wrap: bool,
}

impl Default for StepOptions {
    // Legacy stepping loop behavior: diagonals on, wrap off.
    fn default() -> Self {
        Self {
            use_diagonals: true,
            wrap: false,
        }
    }
}

/// A polymorphic stepping unit.
///
/// One instance is exclusively owned by one session; the registry never
/// shares an instance between sessions. `grid()` must return a
/// rectangular matrix (H >= 1, W >= 1, all rows equal length) after
/// every successful step.
pub trait Simulator: Send {
    /// Advances the simulation by one time step.
    fn step(&mut self, options: StepOptions) -> Result<()>;

    /// Read-only snapshot of the current grid, row-major.
    fn grid(&self) -> &[Vec<f64>];

    /// Scalar summary of the current state (e.g. total heat).
    fn metric(&self) -> f64;

    /// Pacing interval between steps, in seconds. Zero means
    /// back-to-back stepping with no delay.
    fn time_step(&self) -> f64;

    /// Injects a point source value at interior coordinates (x, y).
    /// Out-of-range coordinates are clamped to the interior.
    fn inject(&mut self, x: usize, y: usize, value: f64);
}

/// Constructor closure producing a fresh simulator from resolved parameters.
pub type BuilderFn = dyn Fn(&ResolvedParams) -> Result<Box<dyn Simulator>> + Send + Sync;

/// Registration table mapping simulator identifiers to constructors.
///
/// Every `build` call constructs a brand-new instance; the table holds
/// no simulator state of its own.
#[derive(Default)]
pub struct SimulatorBuilders {
    builders: HashMap<String, Box<BuilderFn>>,
}

impl SimulatorBuilders {
    /// Creates an empty registration table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under an identifier, replacing any
    /// previous registration for the same id.
    pub fn register<F>(&mut self, sim_id: impl Into<String>, builder: F)
    where
        F: Fn(&ResolvedParams) -> Result<Box<dyn Simulator>> + Send + Sync + 'static,
    {
        self.builders.insert(sim_id.into(), Box::new(builder));
    }

    /// Constructs a new simulator for the identifier.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSimulator` if no builder is registered, or
    /// whatever configuration error the constructor itself raises.
    pub fn build(&self, sim_id: &str, params: &ResolvedParams) -> Result<Box<dyn Simulator>> {
        let builder = self
            .builders
            .get(sim_id)
            .ok_or_else(|| GridStreamError::UnknownSimulator(sim_id.to_string()))?;
        builder(params)
    }

    /// True if a builder is registered for the identifier.
    pub fn contains(&self, sim_id: &str) -> bool {
        self.builders.contains_key(sim_id)
    }

    /// Registered identifiers, in arbitrary order.
    pub fn ids(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResolvedParams;

    struct NullSim;

    impl Simulator for NullSim {
        fn step(&mut self, _options: StepOptions) -> Result<()> {
            Ok(())
        }

        fn grid(&self) -> &[Vec<f64>] {
            &[]
        }

        fn metric(&self) -> f64 {
            0.0
        }

        fn time_step(&self) -> f64 {
            0.0
        }

        fn inject(&mut self, _x: usize, _y: usize, _value: f64) {}
    }

    #[test]
    fn test_register_and_build() {
        let mut builders = SimulatorBuilders::new();
        builders.register("null", |_params| Ok(Box::new(NullSim) as Box<dyn Simulator>));

        assert!(builders.contains("null"));
        let params = ResolvedParams::default();
        assert!(builders.build("null", &params).is_ok());
    }

    #[test]
    fn test_unknown_id() {
        let builders = SimulatorBuilders::new();
        let params = ResolvedParams::default();
        let err = builders.build("nope", &params).err().unwrap();
        assert!(matches!(err, GridStreamError::UnknownSimulator(_)));
    }

    #[test]
    fn test_default_step_options() {
        let options = StepOptions::default();
        assert!(options.use_diagonals);
        assert!(!options.wrap);
    }
}
