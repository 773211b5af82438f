//! GridStream core: domain types and session lifecycle.
//!
//! This crate is transport-agnostic. It defines the simulator seam, the
//! catalog that validates start requests, the per-session pub/sub
//! channel, and the registry that owns live sessions. Driving a session
//! (the step loop) lives in `gridstream-execution`; the wire transport
//! lives in `gridstream-server`.

pub mod catalog;
pub mod channel;
pub mod error;
pub mod session;
pub mod simulator;

pub use error::{GridStreamError, Result};
