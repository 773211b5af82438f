//! Concrete simulation kernels for GridStream.
//!
//! Each kernel implements the `Simulator` contract from
//! `gridstream-core` over a bordered, double-buffered grid. Kernels are
//! exposed to the rest of the system only through the builder table; see
//! `register_builtins`.

pub mod builtins;
pub mod grid;
pub mod heat;
pub mod ripples;

pub use builtins::register_builtins;
pub use grid::SimGrid;
pub use heat::HeatKernel;
pub use ripples::RippleKernel;
