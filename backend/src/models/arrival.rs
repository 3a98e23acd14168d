//! Arrival model
//!
//! An arrival is one simulated entity walking through a chain of activities.
//! Each arrival tracks:
//! - Name (generator prefix + creation counter)
//! - Start and end time
//! - Accumulated activity time (completed timeouts only, never queue waiting)
//! - Status (Active, Queued, Finished)
//! - Cursor into its activity chain
//! - Activation token: only the latest scheduled activation may run
//! - Units currently held per resource (for release bookkeeping)

use crate::activity::NextStep;
use crate::core::SimTime;
use crate::stats::ArrivalRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;
use thiserror::Error;

/// Arrival lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrivalStatus {
    /// Executing activities or waiting on a timeout
    Active,

    /// Parked in a resource's waiting queue
    Queued,

    /// Reached the end of its chain
    Finished,
}

/// Errors raised by arrival bookkeeping
#[derive(Debug, Error, PartialEq)]
pub enum ArrivalError {
    #[error("Arrival '{arrival}' holds {held} units of '{resource}', cannot release {requested}")]
    InsufficientHold {
        arrival: String,
        resource: String,
        held: u32,
        requested: u32,
    },
}

/// A simulated entity traversing an activity chain
///
/// # Example
/// ```
/// use queue_simulator_core_rs::{Arrival, ArrivalStatus, Trajectory};
///
/// let chain = Trajectory::new().timeout_fixed(3.0).build().unwrap();
/// let arrival = Arrival::new("customer0".to_string(), 0, 1.5, chain, true);
///
/// assert_eq!(arrival.name(), "customer0");
/// assert_eq!(arrival.start_time(), 1.5);
/// assert_eq!(arrival.status(), ArrivalStatus::Active);
/// assert_eq!(arrival.end_time(), None);
/// ```
#[derive(Debug, Clone)]
pub struct Arrival {
    /// Unique name within the simulator (prefix + counter)
    name: String,

    /// Global creation order, used to order unfinished records
    serial: u64,

    start_time: SimTime,

    /// Unset until the arrival finishes or leaves
    end_time: Option<SimTime>,

    /// Time spent in completed timeouts; queue waiting is excluded
    activity_time: SimTime,

    /// Token of the one pending activation allowed to run
    activation: u64,

    /// Timeout delay charged when the pending activation fires
    pending_delay: SimTime,

    status: ArrivalStatus,

    /// Next activity to execute; `None` means the chain is exhausted
    cursor: Option<Rc<dyn NextStep>>,

    /// Resource name → units currently held
    held: BTreeMap<String, u32>,

    /// Whether the arrival's record is part of the monitored output
    monitored: bool,
}

impl Arrival {
    /// Create a new active arrival positioned at `first`
    pub fn new(
        name: String,
        serial: u64,
        start_time: SimTime,
        first: Rc<dyn NextStep>,
        monitored: bool,
    ) -> Self {
        Self {
            name,
            serial,
            start_time,
            end_time: None,
            activity_time: 0.0,
            activation: 0,
            pending_delay: 0.0,
            status: ArrivalStatus::Active,
            cursor: Some(first),
            held: BTreeMap::new(),
            monitored,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn start_time(&self) -> SimTime {
        self.start_time
    }

    pub fn end_time(&self) -> Option<SimTime> {
        self.end_time
    }

    pub fn activity_time(&self) -> SimTime {
        self.activity_time
    }

    pub fn status(&self) -> ArrivalStatus {
        self.status
    }

    pub fn is_monitored(&self) -> bool {
        self.monitored
    }

    /// Activity that will run on the next activation
    pub fn cursor(&self) -> Option<Rc<dyn NextStep>> {
        self.cursor.clone()
    }

    /// Move the cursor (activity completion or queue parking)
    pub fn set_cursor(&mut self, next: Option<Rc<dyn NextStep>>) {
        self.cursor = next;
    }

    /// Units of `resource` currently held
    pub fn held(&self, resource: &str) -> u32 {
        self.held.get(resource).copied().unwrap_or(0)
    }

    /// Total units held across all resources
    pub fn total_held(&self) -> u32 {
        self.held.values().sum()
    }

    /// Record `amount` more units of `resource` as held
    pub fn hold(&mut self, resource: &str, amount: u32) {
        *self.held.entry(resource.to_string()).or_insert(0) += amount;
    }

    /// Give back `amount` units of `resource`
    ///
    /// # Errors
    /// `ArrivalError::InsufficientHold` if fewer than `amount` units are held.
    /// No state changes in that case.
    pub fn unhold(&mut self, resource: &str, amount: u32) -> Result<(), ArrivalError> {
        let held = self.held(resource);
        if held < amount {
            return Err(ArrivalError::InsufficientHold {
                arrival: self.name.clone(),
                resource: resource.to_string(),
                held,
                requested: amount,
            });
        }

        if held == amount {
            self.held.remove(resource);
        } else {
            self.held.insert(resource.to_string(), held - amount);
        }
        Ok(())
    }

    /// Issue a new activation token after a `delay` timeout
    ///
    /// Any activation scheduled earlier becomes stale. `delay` is charged as
    /// activity time only if this activation actually fires.
    pub fn schedule_activation(&mut self, delay: SimTime) -> u64 {
        self.activation += 1;
        self.pending_delay = delay;
        self.activation
    }

    /// Accept a dispatched activation
    ///
    /// Returns false for a stale token. A current token charges the pending
    /// delay and is consumed.
    pub fn take_activation(&mut self, token: u64) -> bool {
        if token != self.activation {
            return false;
        }
        self.activation += 1;
        self.activity_time += self.pending_delay;
        self.pending_delay = 0.0;
        true
    }

    /// Park in a queue; a pending activation no longer runs
    pub fn mark_queued(&mut self) {
        self.status = ArrivalStatus::Queued;
        self.activation += 1;
        self.pending_delay = 0.0;
    }

    pub fn mark_active(&mut self) {
        self.status = ArrivalStatus::Active;
    }

    /// Chain exhausted at `now`
    pub fn finish(&mut self, now: SimTime) {
        self.status = ArrivalStatus::Finished;
        self.end_time = Some(now);
        self.cursor = None;
    }

    /// Left the system early at `now` (e.g. a rejected seize)
    ///
    /// The end time is recorded but the status never becomes Finished.
    pub fn depart(&mut self, now: SimTime) {
        self.end_time = Some(now);
        self.cursor = None;
    }

    /// Snapshot as a statistics record
    pub fn to_record(&self) -> ArrivalRecord {
        ArrivalRecord {
            name: self.name.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            activity_time: self.activity_time,
            finished: self.status == ArrivalStatus::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Trajectory;

    fn create_test_arrival() -> Arrival {
        let chain = Trajectory::new().timeout_fixed(1.0).build().unwrap();
        Arrival::new("customer0".to_string(), 0, 0.0, chain, true)
    }

    #[test]
    fn test_hold_and_unhold_bookkeeping() {
        let mut arrival = create_test_arrival();
        arrival.hold("server", 2);
        arrival.hold("server", 1);
        assert_eq!(arrival.held("server"), 3);

        arrival.unhold("server", 2).unwrap();
        assert_eq!(arrival.held("server"), 1);

        arrival.unhold("server", 1).unwrap();
        assert_eq!(arrival.held("server"), 0);
        assert_eq!(arrival.total_held(), 0);
    }

    #[test]
    fn test_unhold_more_than_held_fails_without_change() {
        let mut arrival = create_test_arrival();
        arrival.hold("server", 1);

        let result = arrival.unhold("server", 2);
        assert_eq!(
            result,
            Err(ArrivalError::InsufficientHold {
                arrival: "customer0".to_string(),
                resource: "server".to_string(),
                held: 1,
                requested: 2,
            })
        );
        assert_eq!(arrival.held("server"), 1);
    }

    #[test]
    fn test_depart_is_not_finished() {
        let mut arrival = create_test_arrival();
        arrival.depart(4.0);

        let record = arrival.to_record();
        assert!(!record.finished);
        assert_eq!(record.end_time, Some(4.0));
    }

    #[test]
    fn test_finish_sets_end_time_and_status() {
        let mut arrival = create_test_arrival();
        let token = arrival.schedule_activation(2.5);
        assert!(arrival.take_activation(token));
        arrival.finish(7.0);

        assert_eq!(arrival.status(), ArrivalStatus::Finished);
        let record = arrival.to_record();
        assert!(record.finished);
        assert_eq!(record.end_time, Some(7.0));
        assert_eq!(record.activity_time, 2.5);
    }

    #[test]
    fn test_stale_activation_is_refused_and_not_charged() {
        let mut arrival = create_test_arrival();
        let first = arrival.schedule_activation(10.0);
        let second = arrival.schedule_activation(1.0);

        assert!(!arrival.take_activation(first));
        assert!(arrival.take_activation(second));
        assert_eq!(arrival.activity_time(), 1.0);
        // Consumed: the same token cannot fire twice
        assert!(!arrival.take_activation(second));
    }

    #[test]
    fn test_queueing_voids_pending_timeout() {
        let mut arrival = create_test_arrival();
        let token = arrival.schedule_activation(1000.0);
        arrival.mark_queued();

        assert!(!arrival.take_activation(token));
        assert_eq!(arrival.activity_time(), 0.0);
    }
}
