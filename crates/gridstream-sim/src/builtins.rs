//! Registration of the builtin kernels.

use crate::heat::HeatKernel;
use crate::ripples::RippleKernel;
use gridstream_core::simulator::{Simulator, SimulatorBuilders};

/// Wires the builtin kernels into a builder table under the same
/// identifiers the builtin catalog uses.
pub fn register_builtins(builders: &mut SimulatorBuilders) {
    builders.register("heat", |params| {
        let kernel = HeatKernel::new(
            params.get_usize("width")?,
            params.get_usize("height")?,
            params.get_f64("time_step")?,
            params.get_f64("thermal_diffusivity")?,
        )?;
        Ok(Box::new(kernel) as Box<dyn Simulator>)
    });
    builders.register("ripples", |params| {
        let kernel = RippleKernel::new(
            params.get_usize("width")?,
            params.get_usize("height")?,
            params.get_f64("time_step")?,
        );
        Ok(Box::new(kernel) as Box<dyn Simulator>)
    });
}
