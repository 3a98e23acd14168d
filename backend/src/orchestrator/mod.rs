//! Orchestrator - the simulator instance and its error taxonomy
//!
//! See `engine.rs` for the dispatch loop.

mod engine;
mod error;

pub use engine::Simulator;
pub use error::{ErrorKind, SimulationError};
