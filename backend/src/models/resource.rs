//! Resource model
//!
//! A resource is a named contention point with a fixed number of servers
//! and a FIFO waiting queue that may be bounded.
//!
//! # Admission Flow
//!
//! ```text
//! request(amount)
//!   ├─ amount fits in free servers ─────→ Success  (server_count += amount)
//!   ├─ queue has room (or unbounded) ──→ Enqueued (pushed at the tail)
//!   └─ otherwise ──────────────────────→ Rejected (no state change)
//! ```
//!
//! Admission is all-or-nothing: a request is never partially served. Waiting
//! requests are served strictly from the head of the queue once a release
//! frees enough servers.
//!
//! # Critical Invariants
//!
//! - `server_count <= capacity` at all times
//! - `queue_len() <= limit` when the queue is bounded

use crate::core::SimTime;
use crate::models::arrival_table::ArrivalHandle;
use crate::stats::ResourceObservation;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Waiting room limit of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueSize {
    /// At most this many waiting requests (0 = no waiting room)
    Bounded(u32),

    /// No limit on waiting requests
    Unbounded,
}

impl QueueSize {
    /// Whether a queue currently holding `len` requests can take another
    pub fn has_room(&self, len: usize) -> bool {
        match self {
            QueueSize::Bounded(limit) => len < *limit as usize,
            QueueSize::Unbounded => true,
        }
    }
}

impl From<Option<u32>> for QueueSize {
    fn from(limit: Option<u32>) -> Self {
        limit.map_or(QueueSize::Unbounded, QueueSize::Bounded)
    }
}

impl TryFrom<i64> for QueueSize {
    type Error = ResourceError;

    /// Convert a raw host integer; negative values are invalid
    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw < 0 {
            return Err(ResourceError::InvalidQueueSize(raw));
        }
        Ok(u32::try_from(raw).map_or(QueueSize::Unbounded, QueueSize::Bounded))
    }
}

impl fmt::Display for QueueSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueSize::Bounded(limit) => write!(f, "{}", limit),
            QueueSize::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Outcome of a seize or release request
///
/// `Enqueued` and `Rejected` are modeled contention, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Success,
    Enqueued,
    Rejected,
}

/// Errors raised by resource admission control
#[derive(Debug, Error, PartialEq)]
pub enum ResourceError {
    #[error("Requested amount must be positive")]
    InvalidAmount,

    #[error("Request for {requested} units of '{resource}' exceeds its capacity {capacity}")]
    CapacityExceeded {
        resource: String,
        requested: u32,
        capacity: u32,
    },

    #[error("Capacity of '{0}' must be positive")]
    InvalidCapacity(String),

    #[error("Queue size must be non-negative, got {0}")]
    InvalidQueueSize(i64),
}

/// A waiting request at a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedRequest {
    pub arrival: ArrivalHandle,
    pub amount: u32,
}

/// Finite-capacity resource with a FIFO waiting queue
///
/// # Example
/// ```
/// use queue_simulator_core_rs::{QueueSize, Resource};
///
/// let resource = Resource::new("doctor".to_string(), 2, QueueSize::Bounded(5), true).unwrap();
/// assert_eq!(resource.capacity(), 2);
/// assert_eq!(resource.queue_size(), QueueSize::Bounded(5));
/// assert_eq!(resource.server_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    capacity: u32,
    queue_size: QueueSize,

    /// Whether occupancy observations are recorded
    monitored: bool,

    /// Units currently in service
    server_count: u32,

    /// Waiting requests in admission order
    queue: VecDeque<QueuedRequest>,
}

impl Resource {
    /// Create an idle resource
    ///
    /// # Errors
    /// `ResourceError::InvalidCapacity` if `capacity` is zero.
    pub fn new(
        name: String,
        capacity: u32,
        queue_size: QueueSize,
        monitored: bool,
    ) -> Result<Self, ResourceError> {
        if capacity == 0 {
            return Err(ResourceError::InvalidCapacity(name));
        }

        Ok(Self {
            name,
            capacity,
            queue_size,
            monitored,
            server_count: 0,
            queue: VecDeque::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn queue_size(&self) -> QueueSize {
        self.queue_size
    }

    pub fn is_monitored(&self) -> bool {
        self.monitored
    }

    /// Units currently in service
    pub fn server_count(&self) -> u32 {
        self.server_count
    }

    /// Number of waiting requests
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Waiting requests, head first
    pub fn waiting(&self) -> impl Iterator<Item = &QueuedRequest> {
        self.queue.iter()
    }

    fn fits(&self, amount: u32) -> bool {
        self.server_count + amount <= self.capacity
    }

    /// Ask for `amount` units on behalf of `arrival`
    ///
    /// The caller is responsible for the arrival side of the bookkeeping
    /// (held units on `Success`, queued status on `Enqueued`).
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero
    /// - `CapacityExceeded` if `amount` can never be served
    pub fn request(
        &mut self,
        arrival: ArrivalHandle,
        amount: u32,
    ) -> Result<RequestStatus, ResourceError> {
        if amount == 0 {
            return Err(ResourceError::InvalidAmount);
        }
        if amount > self.capacity {
            return Err(ResourceError::CapacityExceeded {
                resource: self.name.clone(),
                requested: amount,
                capacity: self.capacity,
            });
        }

        if self.fits(amount) {
            self.server_count += amount;
            return Ok(RequestStatus::Success);
        }

        if self.queue_size.has_room(self.queue.len()) {
            self.queue.push_back(QueuedRequest { arrival, amount });
            return Ok(RequestStatus::Enqueued);
        }

        Ok(RequestStatus::Rejected)
    }

    /// Return `amount` units to the pool
    ///
    /// The arrival-side check (does the caller hold them) happens before this.
    ///
    /// # Panics
    /// Panics if more units are released than are in service.
    pub fn release(&mut self, amount: u32) {
        assert!(
            amount <= self.server_count,
            "release of {} exceeds {} in service at '{}'",
            amount,
            self.server_count,
            self.name
        );
        self.server_count -= amount;
    }

    /// Pop the head of the queue if its request fits in the free servers
    ///
    /// The request is *not* admitted yet; call [`Resource::admit`] once the
    /// waiting arrival has been confirmed live.
    pub fn pop_admissible(&mut self) -> Option<QueuedRequest> {
        let head = *self.queue.front()?;
        if !self.fits(head.amount) {
            return None;
        }
        self.queue.pop_front()
    }

    /// Put a dequeued request into service
    pub fn admit(&mut self, amount: u32) {
        assert!(self.fits(amount), "admission would exceed capacity");
        self.server_count += amount;
    }

    /// Occupancy snapshot at `time`
    pub fn observe(&self, time: SimTime) -> ResourceObservation {
        ResourceObservation {
            time,
            server: self.server_count,
            queue: self.queue.len(),
        }
    }

    /// Back to idle; configuration is kept
    pub fn reset(&mut self) {
        self.server_count = 0;
        self.queue.clear();
    }
}
