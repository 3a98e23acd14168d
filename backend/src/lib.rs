//! Queue Simulator Core - Rust Engine
//!
//! Discrete-event simulation of arrivals competing for finite-capacity
//! resources, with deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Simulated clock
//! - **events**: Time-ordered event queue
//! - **models**: Domain types (Arrival, Resource, handle table)
//! - **arrivals**: Generators and the inter-arrival capability
//! - **activity**: Activity capability and built-in trajectories
//! - **distributions**: Built-in delay distributions
//! - **stats**: Arrival records and resource observations
//! - **orchestrator**: The `Simulator` and its error taxonomy
//! - **config**: JSON scenario files
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Only the event loop advances simulated time
//! 2. Same-time events run in insertion order (deterministic replay)
//! 3. A resource never serves more units than its capacity
//! 4. Contention (queued, rejected) is a status, misuse is an error

// Module declarations
pub mod activity;
pub mod arrivals;
pub mod config;
pub mod core;
pub mod distributions;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod stats;

// Re-exports for convenience
pub use activity::{ActivityContext, NextStep, Trajectory, Transition};
pub use arrivals::NextDelay;
pub use config::{Scenario, ScenarioConfig};
pub use core::{SimClock, SimTime};
pub use models::{
    arrival::{Arrival, ArrivalError, ArrivalStatus},
    arrival_table::ArrivalHandle,
    resource::{QueueSize, RequestStatus, Resource, ResourceError},
};
pub use orchestrator::{ErrorKind, SimulationError, Simulator};
pub use rng::RngManager;
pub use stats::{ArrivalRecord, ResourceObservation};
