//! Property Tests for Engine Invariants
//!
//! Random arrival patterns and service times, checked after every step:
//! - servers in use never exceed capacity
//! - a bounded queue never exceeds its limit
//! - the clock never moves backwards
//! - a single-server FIFO queue serves arrivals in creation order
//! - identical inputs replay identically

use proptest::prelude::*;
use queue_simulator_core_rs::distributions::Sequence;
use queue_simulator_core_rs::{QueueSize, Simulator, Trajectory};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_random_simulator(
    capacity: u32,
    queue_size: QueueSize,
    amount: u32,
    gaps: Vec<f64>,
    services: Vec<f64>,
) -> Simulator {
    let mut sim = Simulator::new("prop", false);
    sim.add_resource("r", capacity, queue_size, true).unwrap();
    let chain = Trajectory::new()
        .seize("r", amount)
        .timeout(Sequence::new(services))
        .release("r", amount)
        .build()
        .unwrap();
    sim.add_generator("a", chain, Box::new(Sequence::new(gaps)), true)
        .unwrap();
    sim
}

fn queue_size_strategy() -> impl Strategy<Value = QueueSize> {
    prop_oneof![
        (0u32..4).prop_map(QueueSize::Bounded),
        Just(QueueSize::Unbounded),
    ]
}

/// Gaps and one service time per arrival
fn workload_strategy() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..30).prop_flat_map(|n| {
        (
            prop::collection::vec(0.0f64..3.0, n),
            prop::collection::vec(0.0f64..5.0, n),
        )
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_capacity_and_queue_bounds_hold(
        capacity in 1u32..4,
        queue_size in queue_size_strategy(),
        amount_seed in 0u32..4,
        (gaps, services) in workload_strategy(),
    ) {
        let amount = amount_seed % capacity + 1;
        let mut sim = create_random_simulator(capacity, queue_size, amount, gaps, services);

        let mut last_time = sim.now();
        while sim.peek().is_some() {
            sim.step().unwrap();

            prop_assert!(sim.now() >= last_time, "clock moved backwards");
            last_time = sim.now();

            let servers = sim.get_resource_server_count("r").unwrap();
            prop_assert!(servers <= capacity, "{} servers over capacity {}", servers, capacity);

            if let QueueSize::Bounded(limit) = queue_size {
                let queued = sim.get_resource_queue_count("r").unwrap();
                prop_assert!(queued <= limit as usize, "{} queued over limit {}", queued, limit);
            }
        }

        for observation in sim.get_mon_resource("r").unwrap() {
            prop_assert!(observation.server <= capacity);
        }
    }

    #[test]
    fn prop_single_server_serves_in_creation_order(
        (gaps, services) in workload_strategy(),
    ) {
        let n = gaps.len();
        let mut sim = create_random_simulator(1, QueueSize::Unbounded, 1, gaps, services);
        sim.run(f64::INFINITY).unwrap();

        let names: Vec<String> = sim.get_mon_arrivals().into_iter().map(|r| r.name).collect();
        let expected: Vec<String> = (0..n).map(|i| format!("a{}", i)).collect();
        prop_assert_eq!(names, expected);
    }

    #[test]
    fn prop_identical_inputs_replay_identically(
        capacity in 1u32..3,
        queue_size in queue_size_strategy(),
        (gaps, services) in workload_strategy(),
        horizon in 0.0f64..40.0,
    ) {
        let mut first =
            create_random_simulator(capacity, queue_size, 1, gaps.clone(), services.clone());
        let mut second = create_random_simulator(capacity, queue_size, 1, gaps, services);
        first.run(horizon).unwrap();
        second.run(horizon).unwrap();

        prop_assert_eq!(first.get_mon_arrivals(), second.get_mon_arrivals());
        prop_assert_eq!(first.digest().unwrap(), second.digest().unwrap());
    }
}
