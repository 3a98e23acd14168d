//! Domain models for the queueing engine

pub mod arrival;
pub mod arrival_table;
pub mod resource;

// Re-exports
pub use arrival::{Arrival, ArrivalError, ArrivalStatus};
pub use arrival_table::{ArrivalHandle, ArrivalTable};
pub use resource::{QueueSize, QueuedRequest, RequestStatus, Resource, ResourceError};
