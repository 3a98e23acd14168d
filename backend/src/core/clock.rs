//! Simulated clock
//!
//! The simulation operates in continuous logical time. The clock only moves
//! forward, and only the event scheduler loop is allowed to move it.

use serde::{Deserialize, Serialize};

/// Simulated time, in caller-defined units
pub type SimTime = f64;

/// Holds the current simulated time of one simulator instance
///
/// # Example
/// ```
/// use queue_simulator_core_rs::SimClock;
///
/// let mut clock = SimClock::new();
/// assert_eq!(clock.now(), 0.0);
///
/// clock.advance_to(2.5);
/// assert_eq!(clock.now(), 2.5);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    /// Time of the most recently dispatched event
    current_time: SimTime,
}

impl SimClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self { current_time: 0.0 }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.current_time
    }

    /// Move the clock to `time`
    ///
    /// # Panics
    /// Panics if `time` is earlier than the current time. The scheduler
    /// pops events in time order, so this only fires on an engine bug.
    ///
    /// # Example
    /// ```
    /// use queue_simulator_core_rs::SimClock;
    ///
    /// let mut clock = SimClock::new();
    /// clock.advance_to(1.0);
    /// clock.advance_to(1.0); // same instant is fine
    /// assert_eq!(clock.now(), 1.0);
    /// ```
    pub fn advance_to(&mut self, time: SimTime) {
        assert!(
            time >= self.current_time,
            "clock cannot move backwards: {} -> {}",
            self.current_time,
            time
        );
        self.current_time = time;
    }

    /// Rewind to time zero (run reset only)
    pub fn reset(&mut self) {
        self.current_time = 0.0;
    }
}
