//! Ripple propagation kernel.
//!
//! Disturbances expand outward one cell per step: a freshly-written cell
//! carries a flag; on the next step the flagged cell clears while every
//! untouched neighbor copies the disturbance value and flags itself.
//! The flag grid is not double buffered: the in-sweep mutation is what
//! keeps a wavefront from re-igniting the cells it just left.

use crate::grid::SimGrid;
use gridstream_core::error::Result;
use gridstream_core::simulator::{Simulator, StepOptions};

pub struct RippleKernel {
    grid: SimGrid,
    flags: Vec<Vec<f64>>,
    time_step: f64,
}

impl RippleKernel {
    /// Creates a still pool with the given interior dimensions.
    pub fn new(width: usize, height: usize, time_step: f64) -> Self {
        let grid = SimGrid::new(width, height);
        let flags = vec![vec![0.0; grid.width()]; grid.height()];
        Self {
            grid,
            flags,
            time_step,
        }
    }
}

impl Simulator for RippleKernel {
    fn step(&mut self, _options: StepOptions) -> Result<()> {
        let flags = &mut self.flags;
        let height = self.grid.height();
        let width = self.grid.width();

        self.grid.sweep(|g, i, j| {
            if flags[i][j] > 0.0 {
                flags[i][j] = 0.0;
                return 0.0;
            }
            let mut value = 0.0;
            for ii in i.saturating_sub(1)..=(i + 1).min(height - 1) {
                for jj in j.saturating_sub(1)..=(j + 1).min(width - 1) {
                    if g.get(ii, jj) > 0.0 {
                        value = g.get(ii, jj);
                    }
                }
            }
            flags[i][j] = value;
            value
        });
        Ok(())
    }

    fn grid(&self) -> &[Vec<f64>] {
        self.grid.cells()
    }

    fn metric(&self) -> f64 {
        self.grid.interior_sum()
    }

    fn time_step(&self) -> f64 {
        self.time_step
    }

    fn inject(&mut self, x: usize, y: usize, value: f64) {
        self.grid.inject_interior(x, y, value);
        let j = (x + 1).min(self.grid.width() - 2);
        let i = (y + 1).min(self.grid.height() - 2);
        self.flags[i][j] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disturbance_expands_into_a_ring() {
        let mut kernel = RippleKernel::new(9, 9, 0.1);
        kernel.inject(4, 4, 30.0);
        kernel.step(StepOptions::default()).unwrap();

        // Total coordinates of the source are (5, 5): the source clears,
        // its eight neighbors light up.
        let cells = kernel.grid();
        assert_eq!(cells[5][5], 0.0);
        assert_eq!(cells[4][5], 30.0);
        assert_eq!(cells[5][4], 30.0);
        assert_eq!(cells[4][4], 30.0);
    }

    #[test]
    fn test_metric_tracks_active_cells() {
        let mut kernel = RippleKernel::new(9, 9, 0.1);
        kernel.inject(4, 4, 30.0);
        assert_eq!(kernel.metric(), 30.0);

        kernel.step(StepOptions::default()).unwrap();
        assert!(kernel.metric() > 30.0);
    }

    #[test]
    fn test_still_pool_stays_still() {
        let mut kernel = RippleKernel::new(5, 5, 0.0);
        for _ in 0..3 {
            kernel.step(StepOptions::default()).unwrap();
        }
        assert_eq!(kernel.metric(), 0.0);
    }
}
