//! Engine error taxonomy
//!
//! Misuse of the engine is an error; modeled contention is not. A seize that
//! ends up queued or rejected is reported through `RequestStatus`, never here.

use crate::core::SimTime;
use crate::models::{ArrivalError, ResourceError};
use thiserror::Error;

/// Coarse error category, stable across variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad registration (duplicate name, zero capacity, bad queue size)
    Configuration,

    /// A single request larger than the resource's total capacity
    CapacityExceeded,

    /// Unknown resource/generator, stale or foreign arrival handle,
    /// or a release of units the arrival does not hold
    Lookup,

    /// `step()` with nothing scheduled
    EmptyQueue,

    /// Bad value from a caller capability or argument
    InvalidInput,

    /// Statistics could not be serialized
    Serialization,
}

/// Errors returned by the simulator
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Resource '{0}' is already registered")]
    DuplicateResource(String),

    #[error("Generator '{0}' is already registered")]
    DuplicateGenerator(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Generator not found: {0}")]
    GeneratorNotFound(String),

    #[error("Arrival handle is stale or belongs to another simulator")]
    ArrivalNotFound,

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Arrival error: {0}")]
    Arrival(#[from] ArrivalError),

    #[error("No pending events")]
    EmptyQueue,

    #[error("Invalid delay {delay} drawn by '{origin}'")]
    InvalidDelay { origin: String, delay: SimTime },

    #[error("Distribution of '{0}' ran out of values")]
    DistributionExhausted(String),

    #[error("Activity '{activity}' parked arrival '{arrival}' that is not in any queue")]
    ParkedWithoutQueue { arrival: String, activity: String },

    #[error("Activity '{activity}' advanced arrival '{arrival}' that is waiting in a queue")]
    AdvancedWhileQueued { arrival: String, activity: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimulationError {
    /// Category of this error
    ///
    /// # Example
    /// ```
    /// use queue_simulator_core_rs::{ErrorKind, SimulationError};
    ///
    /// assert_eq!(SimulationError::EmptyQueue.kind(), ErrorKind::EmptyQueue);
    /// assert_eq!(
    ///     SimulationError::ResourceNotFound("x".to_string()).kind(),
    ///     ErrorKind::Lookup
    /// );
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimulationError::InvalidConfig(_)
            | SimulationError::DuplicateResource(_)
            | SimulationError::DuplicateGenerator(_) => ErrorKind::Configuration,
            SimulationError::ResourceNotFound(_)
            | SimulationError::GeneratorNotFound(_)
            | SimulationError::ArrivalNotFound
            | SimulationError::Arrival(ArrivalError::InsufficientHold { .. }) => ErrorKind::Lookup,
            SimulationError::Resource(err) => match err {
                ResourceError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
                ResourceError::InvalidCapacity(_) | ResourceError::InvalidQueueSize(_) => {
                    ErrorKind::Configuration
                }
                ResourceError::InvalidAmount => ErrorKind::InvalidInput,
            },
            SimulationError::EmptyQueue => ErrorKind::EmptyQueue,
            SimulationError::InvalidDelay { .. }
            | SimulationError::DistributionExhausted(_)
            | SimulationError::ParkedWithoutQueue { .. }
            | SimulationError::AdvancedWhileQueued { .. } => ErrorKind::InvalidInput,
            SimulationError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}
