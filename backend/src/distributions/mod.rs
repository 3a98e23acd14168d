//! Built-in delay distributions
//!
//! Ready-made [`NextDelay`] implementations for generators and timeouts.
//! Callers may supply their own; the engine never looks inside.
//!
//! | Type | Draws |
//! |---|---|
//! | [`Fixed`] | the same interval every time |
//! | [`Exponential`] | exponential with the given rate (seeded) |
//! | [`Uniform`] | uniform in `[min, max)` (seeded) |
//! | [`Sequence`] | a fixed list, then stops |

use crate::arrivals::NextDelay;
use crate::core::SimTime;
use crate::rng::RngManager;

/// Constant interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixed {
    interval: SimTime,
}

impl Fixed {
    /// # Panics
    /// Panics if `interval` is negative or NaN.
    pub fn new(interval: SimTime) -> Self {
        assert!(interval >= 0.0, "interval must be non-negative");
        Self { interval }
    }
}

impl NextDelay for Fixed {
    fn next_delay(&mut self) -> Option<SimTime> {
        Some(self.interval)
    }
}

/// Exponentially distributed delays (Poisson arrivals)
///
/// # Example
/// ```
/// use queue_simulator_core_rs::arrivals::NextDelay;
/// use queue_simulator_core_rs::distributions::Exponential;
///
/// let mut a = Exponential::new(0.5, 42);
/// let first = a.next_delay();
/// a.reset();
/// assert_eq!(a.next_delay(), first);
/// ```
#[derive(Debug, Clone)]
pub struct Exponential {
    rate: f64,
    seed: u64,
    rng: RngManager,
}

impl Exponential {
    /// # Panics
    /// Panics if `rate` is not strictly positive.
    pub fn new(rate: f64, seed: u64) -> Self {
        assert!(rate > 0.0, "exponential rate must be positive");
        Self {
            rate,
            seed,
            rng: RngManager::new(seed),
        }
    }

    /// Build from an already derived stream
    pub fn with_rng(rate: f64, rng: RngManager) -> Self {
        assert!(rate > 0.0, "exponential rate must be positive");
        Self {
            rate,
            seed: rng.get_state(),
            rng,
        }
    }
}

impl NextDelay for Exponential {
    fn next_delay(&mut self) -> Option<SimTime> {
        Some(self.rng.exponential(self.rate))
    }

    fn reset(&mut self) {
        self.rng = RngManager::new(self.seed);
    }
}

/// Uniformly distributed delays
#[derive(Debug, Clone)]
pub struct Uniform {
    min: SimTime,
    max: SimTime,
    seed: u64,
    rng: RngManager,
}

impl Uniform {
    /// # Panics
    /// Panics unless `0 <= min <= max`.
    pub fn new(min: SimTime, max: SimTime, seed: u64) -> Self {
        Self::with_rng(min, max, RngManager::new(seed))
    }

    pub fn with_rng(min: SimTime, max: SimTime, rng: RngManager) -> Self {
        assert!(min >= 0.0 && min <= max, "uniform bounds must satisfy 0 <= min <= max");
        Self {
            min,
            max,
            seed: rng.get_state(),
            rng,
        }
    }
}

impl NextDelay for Uniform {
    fn next_delay(&mut self) -> Option<SimTime> {
        Some(self.rng.uniform(self.min, self.max))
    }

    fn reset(&mut self) {
        self.rng = RngManager::new(self.seed);
    }
}

/// Replays a fixed list of delays, then stops
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    values: Vec<SimTime>,
    position: usize,
}

impl Sequence {
    pub fn new(values: Vec<SimTime>) -> Self {
        Self {
            values,
            position: 0,
        }
    }
}

impl NextDelay for Sequence {
    fn next_delay(&mut self) -> Option<SimTime> {
        let value = self.values.get(self.position).copied()?;
        self.position += 1;
        Some(value)
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}
