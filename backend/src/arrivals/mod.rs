//! Arrival generation
//!
//! Generators create new arrivals on a schedule driven by a caller-supplied
//! inter-arrival distribution. All generation is deterministic given the
//! distribution's sequence of delays.
//!
//! # Key Principles
//!
//! 1. **Self-perpetuating**: each creation event schedules the next one
//! 2. **Opaque distributions**: the engine only asks for the next delay
//! 3. **Unique names**: arrival name = prefix + creation counter
//! 4. **Stoppable**: a distribution returning `None` ends the generator
//!
//! # Example
//!
//! ```
//! use queue_simulator_core_rs::arrivals::{Generator, NextDelay};
//! use queue_simulator_core_rs::Trajectory;
//!
//! let chain = Trajectory::new().timeout_fixed(1.0).build().unwrap();
//! let mut every_two = || Some(2.0_f64);
//! assert_eq!(every_two.next_delay(), Some(2.0));
//!
//! let mut generator = Generator::new("customer".to_string(), chain, Box::new(every_two), true);
//! assert_eq!(generator.next_name(), "customer0");
//! assert_eq!(generator.next_name(), "customer1");
//! ```

use crate::activity::NextStep;
use crate::core::SimTime;
use crate::orchestrator::SimulationError;
use std::fmt;
use std::rc::Rc;

/// Inter-arrival distribution capability
///
/// Invoked synchronously by the engine; implementations must not block.
pub trait NextDelay {
    /// Next non-negative delay, or `None` to stop generating
    fn next_delay(&mut self) -> Option<SimTime>;

    /// Rewind to the start of the sequence (called on run reset)
    fn reset(&mut self) {}
}

impl<F> NextDelay for F
where
    F: FnMut() -> Option<SimTime>,
{
    fn next_delay(&mut self) -> Option<SimTime> {
        self()
    }
}

/// Check a drawn delay before it reaches the scheduler
pub(crate) fn validate_delay(origin: &str, delay: SimTime) -> Result<SimTime, SimulationError> {
    if delay.is_nan() || delay < 0.0 {
        return Err(SimulationError::InvalidDelay {
            origin: origin.to_string(),
            delay,
        });
    }
    Ok(delay)
}

/// Creates arrivals with a common name prefix and activity chain
pub struct Generator {
    name_prefix: String,

    /// Entry point of every arrival's chain
    first_activity: Rc<dyn NextStep>,

    distribution: Box<dyn NextDelay>,

    /// Whether created arrivals appear in the arrival statistics
    monitored: bool,

    /// Arrivals created so far in this run
    count: u64,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("name_prefix", &self.name_prefix)
            .field("first_activity", &self.first_activity.name())
            .field("monitored", &self.monitored)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl Generator {
    pub fn new(
        name_prefix: String,
        first_activity: Rc<dyn NextStep>,
        distribution: Box<dyn NextDelay>,
        monitored: bool,
    ) -> Self {
        Self {
            name_prefix,
            first_activity,
            distribution,
            monitored,
            count: 0,
        }
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn first_activity(&self) -> Rc<dyn NextStep> {
        Rc::clone(&self.first_activity)
    }

    pub fn is_monitored(&self) -> bool {
        self.monitored
    }

    /// Arrivals created since the last reset
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Name for the next arrival (post-increments the counter)
    pub fn next_name(&mut self) -> String {
        let name = format!("{}{}", self.name_prefix, self.count);
        self.count += 1;
        name
    }

    /// Draw the next inter-arrival delay
    ///
    /// # Errors
    /// `SimulationError::InvalidDelay` for a negative or NaN draw.
    pub fn draw_delay(&mut self) -> Result<Option<SimTime>, SimulationError> {
        match self.distribution.next_delay() {
            Some(delay) => validate_delay(&self.name_prefix, delay).map(Some),
            None => Ok(None),
        }
    }

    /// Forget this run: counter back to zero, capabilities rewound
    pub fn reset(&mut self) {
        self.count = 0;
        self.distribution.reset();
        self.first_activity.reset();
    }
}

/// Registry of generators, addressed by index or name prefix
#[derive(Debug, Default)]
pub struct GeneratorPool {
    generators: Vec<Generator>,
}

impl GeneratorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator, returning its index
    ///
    /// # Errors
    /// `DuplicateGenerator` if the prefix is already taken.
    pub fn register(&mut self, generator: Generator) -> Result<usize, SimulationError> {
        if self.index_of(generator.name_prefix()).is_some() {
            return Err(SimulationError::DuplicateGenerator(
                generator.name_prefix().to_string(),
            ));
        }
        self.generators.push(generator);
        Ok(self.generators.len() - 1)
    }

    pub fn index_of(&self, name_prefix: &str) -> Option<usize> {
        self.generators
            .iter()
            .position(|g| g.name_prefix() == name_prefix)
    }

    pub fn get(&self, index: usize) -> Option<&Generator> {
        self.generators.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Generator> {
        self.generators.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Generator> {
        self.generators.iter()
    }

    pub fn reset_all(&mut self) {
        for generator in &mut self.generators {
            generator.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Trajectory;
    use crate::distributions::Sequence;

    fn create_test_generator(prefix: &str, delays: Vec<SimTime>) -> Generator {
        let chain = Trajectory::new().timeout_fixed(1.0).build().unwrap();
        Generator::new(
            prefix.to_string(),
            chain,
            Box::new(Sequence::new(delays)),
            true,
        )
    }

    #[test]
    fn test_names_are_prefix_plus_counter() {
        let mut generator = create_test_generator("patient", vec![1.0]);
        assert_eq!(generator.next_name(), "patient0");
        assert_eq!(generator.next_name(), "patient1");
        assert_eq!(generator.count(), 2);
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        let mut generator = create_test_generator("g", vec![-1.0]);
        assert_eq!(
            generator.draw_delay(),
            Err(SimulationError::InvalidDelay {
                origin: "g".to_string(),
                delay: -1.0,
            })
        );
    }

    #[test]
    fn test_exhausted_distribution_stops() {
        let mut generator = create_test_generator("g", vec![1.0]);
        assert_eq!(generator.draw_delay(), Ok(Some(1.0)));
        assert_eq!(generator.draw_delay(), Ok(None));
    }

    #[test]
    fn test_reset_rewinds_counter_and_distribution() {
        let mut generator = create_test_generator("g", vec![1.0, 2.0]);
        generator.next_name();
        generator.draw_delay().unwrap();

        generator.reset();
        assert_eq!(generator.count(), 0);
        assert_eq!(generator.draw_delay(), Ok(Some(1.0)));
    }

    #[test]
    fn test_duplicate_prefix_is_rejected() {
        let mut pool = GeneratorPool::new();
        pool.register(create_test_generator("g", vec![1.0])).unwrap();

        let result = pool.register(create_test_generator("g", vec![2.0]));
        assert_eq!(
            result,
            Err(SimulationError::DuplicateGenerator("g".to_string()))
        );
        assert_eq!(pool.len(), 1);
    }
}
