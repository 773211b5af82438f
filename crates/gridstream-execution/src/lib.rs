//! Session execution for GridStream.
//!
//! Couples the registry's lifecycle operations with the per-session
//! runner task: `SessionService::start` registers a session and spawns
//! its `SessionRunner`; `stop` tears it down cooperatively.

pub mod runner;
pub mod service;

pub use runner::SessionRunner;
pub use service::SessionService;
