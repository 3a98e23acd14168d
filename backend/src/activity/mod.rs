//! Activity execution interface
//!
//! An arrival's process is a chain of activities. The engine does not know
//! what an activity means; it only calls the [`NextStep`] capability under the
//! arrival's cursor and acts on the returned [`Transition`].
//!
//! # Activity Interface
//!
//! ```rust
//! use queue_simulator_core_rs::activity::{ActivityContext, NextStep, Transition};
//! use queue_simulator_core_rs::SimulationError;
//!
//! struct Pause;
//!
//! impl NextStep for Pause {
//!     fn name(&self) -> &str {
//!         "Pause"
//!     }
//!
//!     fn execute(&self, _ctx: &mut ActivityContext<'_>) -> Result<Transition, SimulationError> {
//!         // Spend 3 time units, then end the chain
//!         Ok(Transition::Advance { delay: 3.0, next: None })
//!     }
//! }
//! ```
//!
//! Built-in seize/release/timeout activities live in [`trajectory`].

use crate::core::SimTime;
use crate::models::{ArrivalHandle, RequestStatus};
use crate::orchestrator::{SimulationError, Simulator};
use std::fmt;
use std::rc::Rc;

pub mod trajectory;

pub use trajectory::Trajectory;

/// One step of an arrival's process chain
pub trait NextStep {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Run the activity for the arrival in `ctx`
    fn execute(&self, ctx: &mut ActivityContext<'_>) -> Result<Transition, SimulationError>;

    /// Rewind any internal state (called on run reset)
    fn reset(&self) {}
}

impl fmt::Debug for dyn NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NextStep({})", self.name())
    }
}

/// What the engine does with the arrival after an activity ran
#[derive(Debug, Clone)]
pub enum Transition {
    /// Continue at `next` after `delay` (zero = same instant).
    /// `None` ends the chain once the delay has elapsed. An arrival the
    /// activity just enqueued must `Park` instead.
    Advance {
        delay: SimTime,
        next: Option<Rc<dyn NextStep>>,
    },

    /// The arrival is waiting in a resource queue; the resource resumes it
    /// at `next` once admitted.
    Park { next: Option<Rc<dyn NextStep>> },

    /// Leave the system without finishing
    Leave,
}

impl Transition {
    /// Zero-duration move to `next`
    pub fn proceed(next: Option<Rc<dyn NextStep>>) -> Self {
        Transition::Advance { delay: 0.0, next }
    }
}

/// View of the simulator handed to an executing activity
///
/// Everything an activity can do to the engine goes through here, so all
/// mutation stays inside the synchronous dispatch of one event.
pub struct ActivityContext<'a> {
    sim: &'a mut Simulator,
    arrival: ArrivalHandle,
}

impl<'a> ActivityContext<'a> {
    pub(crate) fn new(sim: &'a mut Simulator, arrival: ArrivalHandle) -> Self {
        Self { sim, arrival }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    /// Handle of the executing arrival
    pub fn arrival(&self) -> ArrivalHandle {
        self.arrival
    }

    /// Name of the executing arrival
    pub fn arrival_name(&self) -> Result<&str, SimulationError> {
        self.sim.arrival_name(self.arrival)
    }

    /// Units of `resource` the arrival holds
    pub fn held(&self, resource: &str) -> Result<u32, SimulationError> {
        self.sim.arrival_held(self.arrival, resource)
    }

    /// Seize `amount` units of `resource` for this arrival
    pub fn seize(&mut self, resource: &str, amount: u32) -> Result<RequestStatus, SimulationError> {
        self.sim.seize(resource, self.arrival, amount)
    }

    /// Release `amount` units of `resource` held by this arrival
    pub fn release(
        &mut self,
        resource: &str,
        amount: u32,
    ) -> Result<RequestStatus, SimulationError> {
        self.sim.release(resource, self.arrival, amount)
    }
}
