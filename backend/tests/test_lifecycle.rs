//! Arrival Lifecycle and Reset Tests
//!
//! Completion records, horizon-truncated arrivals, activity errors and
//! what `reset()` keeps and discards.

use queue_simulator_core_rs::activity::{ActivityContext, Transition};
use queue_simulator_core_rs::distributions::{Fixed, Sequence};
use queue_simulator_core_rs::{
    ArrivalRecord, ErrorKind, NextStep, QueueSize, SimulationError, Simulator, Trajectory,
};
use std::rc::Rc;

// ============================================================================
// Test Helpers
// ============================================================================

/// Activity returning a fixed transition kind
struct Scripted {
    park: bool,
    delay: f64,
}

impl NextStep for Scripted {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn execute(&self, _ctx: &mut ActivityContext<'_>) -> Result<Transition, SimulationError> {
        if self.park {
            Ok(Transition::Park { next: None })
        } else {
            Ok(Transition::Advance {
                delay: self.delay,
                next: None,
            })
        }
    }
}

/// Seizes one unit, then always advances, even when it was queued
struct SeizeThenAdvance;

impl NextStep for SeizeThenAdvance {
    fn name(&self) -> &str {
        "SeizeThenAdvance"
    }

    fn execute(&self, ctx: &mut ActivityContext<'_>) -> Result<Transition, SimulationError> {
        ctx.seize("r", 1)?;
        Ok(Transition::Advance {
            delay: 1.0,
            next: None,
        })
    }
}

fn create_clinic() -> Simulator {
    let mut sim = Simulator::new("clinic", false);
    sim.add_resource("doctor", 2, QueueSize::Bounded(4), true)
        .unwrap();
    let chain = Trajectory::new()
        .seize("doctor", 1)
        .timeout_fixed(3.0)
        .release("doctor", 1)
        .build()
        .unwrap();
    sim.add_generator("p", chain, Box::new(Fixed::new(1.0)), true)
        .unwrap();
    sim
}

fn find<'a>(records: &'a [ArrivalRecord], name: &str) -> &'a ArrivalRecord {
    records.iter().find(|r| r.name == name).unwrap()
}

// ============================================================================
// Completion records
// ============================================================================

#[test]
fn test_completed_arrival_record() {
    let mut sim = create_clinic();
    sim.run(10.0).unwrap();

    let records = sim.get_mon_arrivals();
    let p0 = find(&records, "p0");
    assert_eq!(p0.start_time, 1.0);
    assert_eq!(p0.end_time, Some(4.0));
    assert_eq!(p0.activity_time, 3.0);
    assert!(p0.finished);
}

#[test]
fn test_horizon_truncated_arrivals_reported_unfinished() {
    let mut sim = create_clinic();
    sim.run(5.5).unwrap();

    let records = sim.get_mon_arrivals();
    // p0 (1..4) and p1 (2..5) finished, p2..p4 are still in the system
    assert_eq!(records.len(), 5);
    assert!(find(&records, "p0").finished);
    assert!(find(&records, "p1").finished);
    assert!(!find(&records, "p2").finished);

    let p4 = find(&records, "p4");
    assert!(!p4.finished);
    assert_eq!(p4.end_time, None);
    assert_eq!(p4.start_time, 5.0);
    assert_eq!(sim.live_arrivals(), 3);
}

#[test]
fn test_leave_records_end_time_but_not_finished() {
    let mut sim = Simulator::new("leave", false);
    sim.add_resource("r", 1, QueueSize::Bounded(0), true).unwrap();
    let chain = Trajectory::new()
        .seize("r", 1)
        .timeout_fixed(10.0)
        .release("r", 1)
        .build()
        .unwrap();
    sim.add_generator("a", chain, Box::new(Sequence::new(vec![0.0, 2.0])), true)
        .unwrap();

    sim.run(100.0).unwrap();

    let records = sim.get_mon_arrivals();
    let a1 = find(&records, "a1");
    assert!(!a1.finished);
    assert_eq!(a1.start_time, 2.0);
    assert_eq!(a1.end_time, Some(2.0));
    assert_eq!(a1.activity_time, 0.0);
}

// ============================================================================
// Activity errors
// ============================================================================

#[test]
fn test_negative_activity_delay_is_invalid_input() {
    let mut sim = Simulator::new("bad-delay", false);
    let step: Rc<dyn NextStep> = Rc::new(Scripted {
        park: false,
        delay: -2.0,
    });
    sim.add_generator("a", step, Box::new(Sequence::new(vec![1.0])), true)
        .unwrap();

    let err = sim.run(10.0).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidDelay { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_parking_outside_a_queue_is_an_error() {
    let mut sim = Simulator::new("bad-park", false);
    let step: Rc<dyn NextStep> = Rc::new(Scripted {
        park: true,
        delay: 0.0,
    });
    sim.add_generator("a", step, Box::new(Sequence::new(vec![1.0])), true)
        .unwrap();

    let err = sim.run(10.0).unwrap_err();
    assert_eq!(
        err,
        SimulationError::ParkedWithoutQueue {
            arrival: "a0".to_string(),
            activity: "Scripted".to_string(),
        }
    );
}

#[test]
fn test_exhausted_timeout_distribution_is_error() {
    let mut sim = Simulator::new("exhausted", false);
    let chain = Trajectory::new()
        .timeout(Sequence::new(vec![1.0]))
        .build()
        .unwrap();
    sim.add_generator("a", chain, Box::new(Fixed::new(5.0)), true)
        .unwrap();

    let err = sim.run(20.0).unwrap_err();
    assert_eq!(err, SimulationError::DistributionExhausted("Timeout".to_string()));
}

#[test]
fn test_advancing_a_queued_arrival_is_an_error() {
    let mut sim = Simulator::new("bad-advance", false);
    sim.add_resource("r", 1, QueueSize::Unbounded, true).unwrap();
    let step: Rc<dyn NextStep> = Rc::new(SeizeThenAdvance);
    sim.add_generator("a", step, Box::new(Sequence::new(vec![0.0, 0.0])), true)
        .unwrap();

    let err = sim.run(10.0).unwrap_err();
    assert_eq!(
        err,
        SimulationError::AdvancedWhileQueued {
            arrival: "a1".to_string(),
            activity: "SeizeThenAdvance".to_string(),
        }
    );
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_failed_activity_retires_the_arrival() {
    let mut sim = Simulator::new("oversized", false);
    sim.add_resource("r", 2, QueueSize::Unbounded, true).unwrap();
    let chain = Trajectory::new()
        .seize("r", 3)
        .timeout_fixed(1.0)
        .release("r", 3)
        .build()
        .unwrap();
    sim.add_generator("a", chain, Box::new(Fixed::new(1.0)), true)
        .unwrap();

    let err = sim.run(10.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    assert_eq!(sim.live_arrivals(), 0);

    // Resuming fails on the next arrival, again without leaving it behind
    assert!(sim.run(10.0).is_err());
    assert_eq!(sim.live_arrivals(), 0);

    let records = sim.get_mon_arrivals();
    assert_eq!(records.len(), 2);
    for (record, end) in records.iter().zip([1.0, 2.0]) {
        assert!(!record.finished);
        assert_eq!(record.end_time, Some(end));
    }
    assert_eq!(sim.get_resource_server_count("r").unwrap(), 0);
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn test_reset_clears_run_but_keeps_registrations() {
    let mut sim = create_clinic();
    sim.run(20.0).unwrap();
    assert!(sim.now() > 0.0);
    assert!(!sim.get_mon_arrivals().is_empty());

    sim.reset().unwrap();

    assert_eq!(sim.now(), 0.0);
    assert!(sim.get_mon_arrivals().is_empty());
    assert!(sim.get_mon_resource("doctor").unwrap().is_empty());
    assert_eq!(sim.get_resource_capacity("doctor").unwrap(), 2);
    assert_eq!(
        sim.get_resource_queue_size("doctor").unwrap(),
        QueueSize::Bounded(4)
    );
    assert_eq!(sim.get_resource_server_count("doctor").unwrap(), 0);
    assert_eq!(sim.get_n_generated("p").unwrap(), 0);
    assert_eq!(sim.live_arrivals(), 0);

    // The generator was primed again for the new run
    assert_eq!(sim.peek(), Some(1.0));
}

#[test]
fn test_run_after_reset_replays_first_run() {
    let mut sim = Simulator::new("replay", false);
    sim.add_resource("r", 1, QueueSize::Unbounded, true).unwrap();
    let chain = Trajectory::new()
        .seize("r", 1)
        .timeout(Sequence::new(vec![2.0, 0.5, 1.5, 3.0]))
        .release("r", 1)
        .build()
        .unwrap();
    sim.add_generator(
        "a",
        chain,
        Box::new(Sequence::new(vec![0.0, 1.0, 0.2, 0.1])),
        true,
    )
    .unwrap();

    sim.run(50.0).unwrap();
    let first_arrivals = sim.get_mon_arrivals();
    let first_resource = sim.get_mon_resource("r").unwrap().to_vec();

    sim.reset().unwrap();
    sim.run(50.0).unwrap();

    assert_eq!(sim.get_mon_arrivals(), first_arrivals);
    assert_eq!(sim.get_mon_resource("r").unwrap(), first_resource.as_slice());
}

#[test]
fn test_handles_go_stale_after_reset() {
    let mut sim = Simulator::new("stale", false);
    sim.add_resource("r", 1, QueueSize::Unbounded, true).unwrap();
    let idle = Trajectory::new().timeout_fixed(100.0).build().unwrap();
    sim.add_generator("a", idle, Box::new(Sequence::new(vec![0.0])), true)
        .unwrap();
    sim.run(0.0).unwrap();
    let handle = sim.find_arrival("a0").unwrap();

    sim.reset().unwrap();
    sim.run(0.0).unwrap();

    // A new a0 exists, but the old handle does not resolve to it
    assert!(sim.find_arrival("a0").is_some());
    let err = sim.seize("r", handle, 1).unwrap_err();
    assert_eq!(err, SimulationError::ArrivalNotFound);
    assert_eq!(sim.arrival_name(handle).unwrap_err().kind(), ErrorKind::Lookup);
}
