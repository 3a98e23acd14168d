//! Simulator Engine
//!
//! Owns every piece of run state and is the only place that moves the clock:
//! - Event queue (generator firings, arrival activations)
//! - Resource registry (admission control, FIFO queues)
//! - Generator registry (arrival creation)
//! - Live arrivals (generation-checked handle table)
//! - Statistics (arrival records, resource observations)
//!
//! # Dispatch Loop
//!
//! ```text
//! step():
//! 1. Pop the earliest event (EmptyQueue if none)
//! 2. Advance the clock to its time
//! 3. Generator event → create arrival, schedule its activation at now,
//!    draw the next delay and schedule the next creation
//! 4. Arrival event → drop it if its token is stale, otherwise run the
//!    activity under the cursor and apply its Transition
//!    - Advance { delay, next } → cursor = next, reactivate at now + delay
//!    - Park { next }          → cursor = next, wait for queue admission
//!    - Leave                  → retire unfinished
//!    An arrival activated with an empty cursor has finished its chain.
//!    An activity error retires the arrival unfinished, then propagates.
//! ```
//!
//! # Critical Invariants
//!
//! 1. Only `step()` (and `run()`, through it) advances the clock
//! 2. Events at the same instant dispatch in insertion order
//! 3. A resource never serves more than its capacity
//! 4. A bounded queue never holds more than its limit
//! 5. Handles from another simulator, or from before a reset, never resolve
//! 6. An arrival has at most one live activation; queueing voids it and
//!    admission issues a new one
//!
//! # Example
//!
//! ```rust
//! use queue_simulator_core_rs::distributions::Fixed;
//! use queue_simulator_core_rs::{QueueSize, Simulator, Trajectory};
//!
//! let mut sim = Simulator::new("bank", false);
//! sim.add_resource("teller", 1, QueueSize::Unbounded, true).unwrap();
//!
//! let chain = Trajectory::new()
//!     .seize("teller", 1)
//!     .timeout_fixed(3.0)
//!     .release("teller", 1)
//!     .build()
//!     .unwrap();
//! sim.add_generator("customer", chain, Box::new(Fixed::new(2.0)), true)
//!     .unwrap();
//!
//! sim.run(10.0).unwrap();
//! assert!(sim.now() <= 10.0);
//! assert_eq!(sim.get_n_generated("customer").unwrap(), 5);
//! ```

use super::error::SimulationError;
use crate::activity::{ActivityContext, NextStep, Transition};
use crate::arrivals::{validate_delay, Generator, GeneratorPool, NextDelay};
use crate::core::{SimClock, SimTime};
use crate::events::{EventScheduler, EventTarget};
use crate::models::{
    Arrival, ArrivalHandle, ArrivalStatus, ArrivalTable, QueueSize, RequestStatus, Resource,
    ResourceError,
};
use crate::stats::{self, ArrivalRecord, ResourceObservation, StatisticsCollector};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Per-event log line: `info!` for verbose simulators, `trace!` otherwise
macro_rules! dispatch_log {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            info!($($arg)+);
        } else {
            trace!($($arg)+);
        }
    };
}

/// Append an occupancy snapshot unless the resource is unmonitored
fn record_observation(stats: &mut StatisticsCollector, resource: &Resource, now: SimTime) {
    if resource.is_monitored() {
        stats.observe(resource.name(), resource.observe(now));
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// One independent discrete-event simulation
///
/// Instances share nothing; several can live in the same process.
#[derive(Debug)]
pub struct Simulator {
    /// Identity stamped into every arrival handle
    id: Uuid,

    name: String,

    /// Raise per-event logging from trace to info
    verbose: bool,

    clock: SimClock,
    scheduler: EventScheduler,
    resources: HashMap<String, Resource>,
    generators: GeneratorPool,
    arrivals: ArrivalTable,
    stats: StatisticsCollector,

    /// Creation order across all generators (orders live arrival records)
    next_serial: u64,
}

impl Simulator {
    /// Create an empty simulator at time zero
    pub fn new(name: impl Into<String>, verbose: bool) -> Self {
        let id = Uuid::new_v4();
        let name = name.into();
        debug!(sim = %name, id = %id, verbose, "simulator created");

        Self {
            id,
            name,
            verbose,
            clock: SimClock::new(),
            scheduler: EventScheduler::new(),
            resources: HashMap::new(),
            generators: GeneratorPool::new(),
            arrivals: ArrivalTable::new(id),
            stats: StatisticsCollector::new(),
            next_serial: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    // ========================================================================
    // Run control
    // ========================================================================

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// Time of the next pending event, `None` when nothing is scheduled
    pub fn peek(&self) -> Option<SimTime> {
        self.scheduler.peek_time()
    }

    /// Number of pending events
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    /// Dispatch exactly one event
    ///
    /// # Errors
    /// - `EmptyQueue` if nothing is scheduled
    /// - any error raised by the dispatched generator or activity
    pub fn step(&mut self) -> Result<(), SimulationError> {
        let event = self.scheduler.pop().ok_or(SimulationError::EmptyQueue)?;
        self.clock.advance_to(event.time);

        match event.target {
            EventTarget::Generator(index) => self.fire_generator(index),
            EventTarget::Arrival(handle, token) => self.activate(handle, token),
        }
    }

    /// Dispatch events while the next one is due no later than `until`
    ///
    /// Reaching the horizon is not an error; the clock stays at the last
    /// dispatched event.
    ///
    /// # Errors
    /// `InvalidConfig` for a NaN horizon, otherwise whatever `step()` raises.
    pub fn run(&mut self, until: SimTime) -> Result<(), SimulationError> {
        if until.is_nan() {
            return Err(SimulationError::InvalidConfig(
                "run horizon must not be NaN".to_string(),
            ));
        }

        let mut dispatched = 0u64;
        while let Some(next) = self.scheduler.peek_time() {
            if next > until {
                break;
            }
            self.step()?;
            dispatched += 1;
        }

        debug!(
            sim = %self.name,
            until,
            time = self.now(),
            dispatched,
            pending = self.scheduler.len(),
            "run returned"
        );
        Ok(())
    }

    /// Start a fresh run with the same registrations
    ///
    /// Time goes back to zero and pending events, live arrivals and statistics
    /// are discarded. Resources keep capacity and queue size; generators keep
    /// their distributions, which are rewound and drawn again to schedule the
    /// first creation of the new run.
    ///
    /// # Errors
    /// `InvalidDelay` if a rewound distribution yields a bad first delay.
    pub fn reset(&mut self) -> Result<(), SimulationError> {
        self.clock.reset();
        self.scheduler.clear();
        self.arrivals.clear();
        self.stats.clear();
        self.next_serial = 0;

        for resource in self.resources.values_mut() {
            resource.reset();
        }
        self.generators.reset_all();
        for index in 0..self.generators.len() {
            self.schedule_next_creation(index)?;
        }

        debug!(
            sim = %self.name,
            resources = self.resources.len(),
            generators = self.generators.len(),
            "simulator reset"
        );
        Ok(())
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a generator and schedule its first creation
    ///
    /// The first delay is drawn right away; a distribution that yields
    /// `None` registers a generator that never fires.
    ///
    /// # Errors
    /// - `InvalidConfig` for an empty prefix
    /// - `DuplicateGenerator` if the prefix is taken
    /// - `InvalidDelay` if the first draw is negative or NaN
    pub fn add_generator(
        &mut self,
        name_prefix: &str,
        first_activity: Rc<dyn NextStep>,
        distribution: Box<dyn NextDelay>,
        monitor: bool,
    ) -> Result<(), SimulationError> {
        if name_prefix.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "generator name prefix must not be empty".to_string(),
            ));
        }
        if self.generators.index_of(name_prefix).is_some() {
            return Err(SimulationError::DuplicateGenerator(name_prefix.to_string()));
        }

        let generator = Generator::new(
            name_prefix.to_string(),
            first_activity,
            distribution,
            monitor,
        );
        let index = self.generators.register(generator)?;
        debug!(sim = %self.name, generator = name_prefix, monitor, "generator registered");

        self.schedule_next_creation(index)
    }

    /// Register a resource
    ///
    /// # Errors
    /// - `InvalidConfig` for an empty name
    /// - `DuplicateResource` if the name is taken
    /// - `Resource(InvalidCapacity)` for zero capacity
    pub fn add_resource(
        &mut self,
        name: &str,
        capacity: u32,
        queue_size: QueueSize,
        monitor: bool,
    ) -> Result<(), SimulationError> {
        if name.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "resource name must not be empty".to_string(),
            ));
        }
        if self.resources.contains_key(name) {
            return Err(SimulationError::DuplicateResource(name.to_string()));
        }

        let resource = Resource::new(name.to_string(), capacity, queue_size, monitor)?;
        self.resources.insert(name.to_string(), resource);
        debug!(
            sim = %self.name,
            resource = name,
            capacity,
            queue_size = %queue_size,
            monitor,
            "resource registered"
        );
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Records of monitored arrivals
    ///
    /// Arrivals that finished or left come first, in the order they did so.
    /// Arrivals still in the system follow in creation order with
    /// `finished = false` and no end time.
    pub fn get_mon_arrivals(&self) -> Vec<ArrivalRecord> {
        let mut live: Vec<&Arrival> = self
            .arrivals
            .iter()
            .map(|(_, arrival)| arrival)
            .filter(|arrival| arrival.is_monitored())
            .collect();
        live.sort_by_key(|arrival| arrival.serial());

        let mut records = self.stats.arrivals().to_vec();
        records.extend(live.into_iter().map(Arrival::to_record));
        records
    }

    /// Observation log of a resource
    ///
    /// # Errors
    /// `ResourceNotFound` for an unregistered name.
    pub fn get_mon_resource(&self, name: &str) -> Result<&[ResourceObservation], SimulationError> {
        self.resource(name)?;
        Ok(self.stats.resource(name))
    }

    pub fn get_resource_capacity(&self, name: &str) -> Result<u32, SimulationError> {
        Ok(self.resource(name)?.capacity())
    }

    pub fn get_resource_queue_size(&self, name: &str) -> Result<QueueSize, SimulationError> {
        Ok(self.resource(name)?.queue_size())
    }

    /// Units of `name` currently in service
    pub fn get_resource_server_count(&self, name: &str) -> Result<u32, SimulationError> {
        Ok(self.resource(name)?.server_count())
    }

    /// Requests currently waiting at `name`
    pub fn get_resource_queue_count(&self, name: &str) -> Result<usize, SimulationError> {
        Ok(self.resource(name)?.queue_len())
    }

    /// Arrivals created by a generator in this run
    ///
    /// # Errors
    /// `GeneratorNotFound` for an unregistered prefix.
    pub fn get_n_generated(&self, name_prefix: &str) -> Result<u64, SimulationError> {
        self.generators
            .index_of(name_prefix)
            .and_then(|index| self.generators.get(index))
            .map(Generator::count)
            .ok_or_else(|| SimulationError::GeneratorNotFound(name_prefix.to_string()))
    }

    /// Number of arrivals currently in the system
    pub fn live_arrivals(&self) -> usize {
        self.arrivals.len()
    }

    /// Handle of the live arrival called `name`
    pub fn find_arrival(&self, name: &str) -> Option<ArrivalHandle> {
        self.arrivals
            .iter()
            .find(|(_, arrival)| arrival.name() == name)
            .map(|(handle, _)| handle)
    }

    pub fn arrival_name(&self, handle: ArrivalHandle) -> Result<&str, SimulationError> {
        Ok(self.arrival(handle)?.name())
    }

    pub fn arrival_status(&self, handle: ArrivalHandle) -> Result<ArrivalStatus, SimulationError> {
        Ok(self.arrival(handle)?.status())
    }

    /// Units of `resource` held by the arrival
    pub fn arrival_held(&self, handle: ArrivalHandle, resource: &str) -> Result<u32, SimulationError> {
        Ok(self.arrival(handle)?.held(resource))
    }

    /// Hex SHA-256 over the monitored arrival records (the same list
    /// `get_mon_arrivals` returns) and the observation logs
    pub fn digest(&self) -> Result<String, SimulationError> {
        stats::digest(&self.get_mon_arrivals(), self.stats.resources())
    }

    fn resource(&self, name: &str) -> Result<&Resource, SimulationError> {
        self.resources
            .get(name)
            .ok_or_else(|| SimulationError::ResourceNotFound(name.to_string()))
    }

    fn arrival(&self, handle: ArrivalHandle) -> Result<&Arrival, SimulationError> {
        self.arrivals
            .get(handle)
            .ok_or(SimulationError::ArrivalNotFound)
    }

    // ========================================================================
    // Seize / Release
    // ========================================================================

    /// Request `amount` units of `resource` for an arrival
    ///
    /// `Success` puts the units in service at once; `Enqueued` parks the
    /// arrival at the tail of the queue; `Rejected` changes nothing. Neither
    /// outcome schedules the arrival: the calling activity decides that.
    ///
    /// # Errors
    /// - `ArrivalNotFound` for a stale or foreign handle
    /// - `ResourceNotFound` for an unregistered resource
    /// - `Resource(CapacityExceeded)` if `amount` is more than the capacity
    /// - `Resource(InvalidAmount)` if `amount` is zero
    pub fn seize(
        &mut self,
        resource: &str,
        handle: ArrivalHandle,
        amount: u32,
    ) -> Result<RequestStatus, SimulationError> {
        let now = self.clock.now();
        let arrival = self
            .arrivals
            .get_mut(handle)
            .ok_or(SimulationError::ArrivalNotFound)?;
        let res = self
            .resources
            .get_mut(resource)
            .ok_or_else(|| SimulationError::ResourceNotFound(resource.to_string()))?;

        let status = res.request(handle, amount)?;
        match status {
            RequestStatus::Success => {
                arrival.hold(resource, amount);
                record_observation(&mut self.stats, res, now);
            }
            RequestStatus::Enqueued => {
                arrival.mark_queued();
                record_observation(&mut self.stats, res, now);
            }
            RequestStatus::Rejected => {}
        }

        dispatch_log!(
            self.verbose,
            sim = %self.name,
            time = now,
            arrival = arrival.name(),
            resource,
            amount,
            status = ?status,
            "seize"
        );
        Ok(status)
    }

    /// Give back `amount` units of `resource` held by an arrival
    ///
    /// Freed servers go to the head of the queue, one waiting request at a
    /// time, for as long as the head fits. Every admitted arrival is
    /// scheduled to continue at the current time; enqueueing already voided
    /// whatever activation it had pending.
    ///
    /// # Errors
    /// - `ArrivalNotFound` for a stale or foreign handle
    /// - `ResourceNotFound` for an unregistered resource
    /// - `Resource(InvalidAmount)` if `amount` is zero
    /// - `Arrival(InsufficientHold)` if the arrival holds fewer units
    pub fn release(
        &mut self,
        resource: &str,
        handle: ArrivalHandle,
        amount: u32,
    ) -> Result<RequestStatus, SimulationError> {
        let now = self.clock.now();
        if amount == 0 {
            return Err(ResourceError::InvalidAmount.into());
        }

        let res = self
            .resources
            .get_mut(resource)
            .ok_or_else(|| SimulationError::ResourceNotFound(resource.to_string()))?;
        let arrival = self
            .arrivals
            .get_mut(handle)
            .ok_or(SimulationError::ArrivalNotFound)?;

        arrival.unhold(resource, amount)?;
        res.release(amount);
        record_observation(&mut self.stats, res, now);

        dispatch_log!(
            self.verbose,
            sim = %self.name,
            time = now,
            arrival = arrival.name(),
            resource,
            amount,
            "release"
        );

        while let Some(request) = res.pop_admissible() {
            let Some(waiting) = self.arrivals.get_mut(request.arrival) else {
                warn!(sim = %self.name, resource, "dropping queue entry of a departed arrival");
                record_observation(&mut self.stats, res, now);
                continue;
            };

            res.admit(request.amount);
            waiting.hold(resource, request.amount);
            waiting.mark_active();
            let token = waiting.schedule_activation(0.0);
            self.scheduler
                .schedule(now, EventTarget::Arrival(request.arrival, token));
            record_observation(&mut self.stats, res, now);

            dispatch_log!(
                self.verbose,
                sim = %self.name,
                time = now,
                arrival = waiting.name(),
                resource,
                amount = request.amount,
                "admitted from queue"
            );
        }

        Ok(RequestStatus::Success)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Draw the next delay of generator `index` and schedule its firing
    fn schedule_next_creation(&mut self, index: usize) -> Result<(), SimulationError> {
        let now = self.clock.now();
        let generator = self
            .generators
            .get_mut(index)
            .ok_or_else(|| SimulationError::GeneratorNotFound(index.to_string()))?;

        match generator.draw_delay()? {
            Some(delay) => {
                self.scheduler
                    .schedule(now + delay, EventTarget::Generator(index));
            }
            None => {
                debug!(
                    sim = %self.name,
                    generator = generator.name_prefix(),
                    time = now,
                    "generator stopped"
                );
            }
        }
        Ok(())
    }

    fn fire_generator(&mut self, index: usize) -> Result<(), SimulationError> {
        let now = self.clock.now();
        let generator = self
            .generators
            .get_mut(index)
            .ok_or_else(|| SimulationError::GeneratorNotFound(index.to_string()))?;

        let name = generator.next_name();
        let mut arrival = Arrival::new(
            name,
            self.next_serial,
            now,
            generator.first_activity(),
            generator.is_monitored(),
        );
        self.next_serial += 1;

        dispatch_log!(
            self.verbose,
            sim = %self.name,
            time = now,
            arrival = arrival.name(),
            "arrival created"
        );

        let token = arrival.schedule_activation(0.0);
        let handle = self.arrivals.insert(arrival);
        self.scheduler.schedule(now, EventTarget::Arrival(handle, token));

        self.schedule_next_creation(index)
    }

    fn activate(&mut self, handle: ArrivalHandle, token: u64) -> Result<(), SimulationError> {
        let now = self.clock.now();
        let Some(arrival) = self.arrivals.get_mut(handle) else {
            trace!(sim = %self.name, time = now, "skipping activation of a departed arrival");
            return Ok(());
        };
        if !arrival.take_activation(token) {
            trace!(
                sim = %self.name,
                time = now,
                arrival = arrival.name(),
                "dropping stale activation"
            );
            return Ok(());
        }
        let Some(step) = arrival.cursor() else {
            self.retire(handle, true);
            return Ok(());
        };

        dispatch_log!(
            self.verbose,
            sim = %self.name,
            time = now,
            arrival = arrival.name(),
            activity = step.name(),
            "activity"
        );

        if let Err(err) = self.execute_step(handle, step.as_ref()) {
            warn!(
                sim = %self.name,
                time = now,
                activity = step.name(),
                error = %err,
                "activity failed, removing arrival"
            );
            self.retire(handle, false);
            return Err(err);
        }
        Ok(())
    }

    /// Run one activity for an arrival and apply the resulting transition
    fn execute_step(
        &mut self,
        handle: ArrivalHandle,
        step: &dyn NextStep,
    ) -> Result<(), SimulationError> {
        let now = self.clock.now();
        let transition = {
            let mut ctx = ActivityContext::new(self, handle);
            step.execute(&mut ctx)?
        };

        let arrival = self
            .arrivals
            .get_mut(handle)
            .ok_or(SimulationError::ArrivalNotFound)?;
        match transition {
            Transition::Advance { delay, next } => {
                if arrival.status() == ArrivalStatus::Queued {
                    return Err(SimulationError::AdvancedWhileQueued {
                        arrival: arrival.name().to_string(),
                        activity: step.name().to_string(),
                    });
                }
                let delay = validate_delay(step.name(), delay)?;
                arrival.set_cursor(next);
                let token = arrival.schedule_activation(delay);
                self.scheduler
                    .schedule(now + delay, EventTarget::Arrival(handle, token));
            }
            Transition::Park { next } => {
                if arrival.status() != ArrivalStatus::Queued {
                    return Err(SimulationError::ParkedWithoutQueue {
                        arrival: arrival.name().to_string(),
                        activity: step.name().to_string(),
                    });
                }
                arrival.set_cursor(next);
            }
            Transition::Leave => self.retire(handle, false),
        }
        Ok(())
    }

    /// Take an arrival out of the system and keep its record
    fn retire(&mut self, handle: ArrivalHandle, finished: bool) {
        let now = self.clock.now();
        let Some(mut arrival) = self.arrivals.remove(handle) else {
            return;
        };

        if finished {
            arrival.finish(now);
        } else {
            arrival.depart(now);
        }

        if arrival.total_held() > 0 {
            warn!(
                sim = %self.name,
                time = now,
                arrival = arrival.name(),
                held = arrival.total_held(),
                "arrival left the system still holding resources"
            );
        }

        dispatch_log!(
            self.verbose,
            sim = %self.name,
            time = now,
            arrival = arrival.name(),
            finished,
            activity_time = arrival.activity_time(),
            "arrival retired"
        );

        if arrival.is_monitored() {
            self.stats.record_arrival(arrival.to_record());
        }
    }
}
