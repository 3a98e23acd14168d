//! Scenario configuration
//!
//! A scenario describes a complete model as data: resources, generators,
//! the distributions they draw from and the trajectories their arrivals
//! follow. It is loaded from JSON, validated as a whole, and only then
//! registered on a fresh [`Simulator`].
//!
//! # Example
//!
//! ```rust
//! use queue_simulator_core_rs::config::Scenario;
//!
//! let json = r#"{
//!     "name": "clinic",
//!     "seed": 7,
//!     "horizon": 60.0,
//!     "resources": [
//!         { "name": "doctor", "capacity": 2, "queue_size": null }
//!     ],
//!     "generators": [{
//!         "name_prefix": "patient",
//!         "distribution": { "type": "exponential", "rate": 0.2 },
//!         "trajectory": [
//!             { "type": "seize", "resource": "doctor" },
//!             { "type": "timeout", "distribution": { "type": "uniform", "min": 5.0, "max": 10.0 } },
//!             { "type": "release", "resource": "doctor" }
//!         ]
//!     }]
//! }"#;
//!
//! let scenario = Scenario::from_json(json).unwrap();
//! let mut sim = scenario.build().unwrap();
//! sim.run(scenario.horizon()).unwrap();
//! assert_eq!(sim.get_resource_capacity("doctor").unwrap(), 2);
//! ```

use crate::activity::{NextStep, Trajectory};
use crate::arrivals::NextDelay;
use crate::core::SimTime;
use crate::distributions::{Exponential, Fixed, Sequence, Uniform};
use crate::models::QueueSize;
use crate::orchestrator::{SimulationError, Simulator};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

fn default_monitor() -> bool {
    true
}

fn default_amount() -> u32 {
    1
}

/// Complete scenario description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,

    /// Log every dispatched event at info level
    #[serde(default)]
    pub verbose: bool,

    /// Base seed for every random distribution in the scenario
    #[serde(default)]
    pub seed: u64,

    /// Default run horizon
    pub horizon: SimTime,

    #[serde(default)]
    pub resources: Vec<ResourceConfig>,

    #[serde(default)]
    pub generators: Vec<GeneratorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    pub capacity: u32,

    /// Waiting room limit; `null` or absent = unbounded
    #[serde(default)]
    pub queue_size: Option<i64>,

    #[serde(default = "default_monitor")]
    pub monitor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub name_prefix: String,

    /// Inter-arrival times
    pub distribution: DistributionConfig,

    pub trajectory: Vec<ActivityConfig>,

    #[serde(default = "default_monitor")]
    pub monitor: bool,
}

/// Built-in delay distributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionConfig {
    Fixed { interval: SimTime },
    Exponential { rate: f64 },
    Uniform { min: SimTime, max: SimTime },

    /// Replay the listed delays, then stop
    Sequence { values: Vec<SimTime> },
}

/// Built-in activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityConfig {
    Seize {
        resource: String,
        #[serde(default = "default_amount")]
        amount: u32,

        /// Where a rejected arrival goes; absent = it leaves the system
        #[serde(default)]
        on_reject: Option<Vec<ActivityConfig>>,
    },
    Release {
        resource: String,
        #[serde(default = "default_amount")]
        amount: u32,
    },
    Timeout {
        distribution: DistributionConfig,
    },
}

fn invalid(message: String) -> SimulationError {
    SimulationError::InvalidConfig(message)
}

impl DistributionConfig {
    fn validate(&self, owner: &str) -> Result<(), SimulationError> {
        let valid_delay = |d: SimTime| d.is_finite() && d >= 0.0;

        let ok = match self {
            DistributionConfig::Fixed { interval } => valid_delay(*interval),
            DistributionConfig::Exponential { rate } => rate.is_finite() && *rate > 0.0,
            DistributionConfig::Uniform { min, max } => {
                valid_delay(*min) && valid_delay(*max) && min <= max
            }
            DistributionConfig::Sequence { values } => values.iter().all(|v| valid_delay(*v)),
        };

        if ok {
            Ok(())
        } else {
            Err(invalid(format!("{}: invalid distribution {:?}", owner, self)))
        }
    }

    /// Instantiate, taking a fresh random stream if the distribution needs one
    fn build(&self, seed: u64, streams: &mut u64) -> Box<dyn NextDelay> {
        let mut next_rng = || {
            let rng = RngManager::derive(seed, *streams);
            *streams += 1;
            rng
        };

        match self {
            DistributionConfig::Fixed { interval } => Box::new(Fixed::new(*interval)),
            DistributionConfig::Exponential { rate } => {
                Box::new(Exponential::with_rng(*rate, next_rng()))
            }
            DistributionConfig::Uniform { min, max } => {
                Box::new(Uniform::with_rng(*min, *max, next_rng()))
            }
            DistributionConfig::Sequence { values } => Box::new(Sequence::new(values.clone())),
        }
    }
}

fn validate_trajectory(
    owner: &str,
    activities: &[ActivityConfig],
    capacities: &HashMap<&str, u32>,
    allow_empty: bool,
) -> Result<(), SimulationError> {
    if activities.is_empty() && !allow_empty {
        return Err(invalid(format!("{}: trajectory has no activities", owner)));
    }

    for activity in activities {
        match activity {
            ActivityConfig::Seize {
                resource,
                amount,
                on_reject,
            } => {
                check_resource_ref(owner, resource, *amount, capacities)?;
                if let Some(branch) = on_reject {
                    validate_trajectory(owner, branch, capacities, true)?;
                }
            }
            ActivityConfig::Release { resource, amount } => {
                check_resource_ref(owner, resource, *amount, capacities)?;
            }
            ActivityConfig::Timeout { distribution } => distribution.validate(owner)?,
        }
    }
    Ok(())
}

fn check_resource_ref(
    owner: &str,
    resource: &str,
    amount: u32,
    capacities: &HashMap<&str, u32>,
) -> Result<(), SimulationError> {
    let Some(&capacity) = capacities.get(resource) else {
        return Err(invalid(format!(
            "{}: unknown resource '{}'",
            owner, resource
        )));
    };
    if amount == 0 {
        return Err(invalid(format!(
            "{}: amount for '{}' must be positive",
            owner, resource
        )));
    }
    if amount > capacity {
        return Err(invalid(format!(
            "{}: amount {} for '{}' exceeds its capacity {}",
            owner, amount, resource, capacity
        )));
    }
    Ok(())
}

fn build_trajectory(
    activities: &[ActivityConfig],
    seed: u64,
    streams: &mut u64,
) -> Trajectory {
    activities
        .iter()
        .fold(Trajectory::new(), |trajectory, activity| match activity {
            ActivityConfig::Seize {
                resource,
                amount,
                on_reject: None,
            } => trajectory.seize(resource, *amount),
            ActivityConfig::Seize {
                resource,
                amount,
                on_reject: Some(branch),
            } => {
                let branch = build_trajectory(branch, seed, streams);
                trajectory.seize_or(resource, *amount, branch)
            }
            ActivityConfig::Release { resource, amount } => trajectory.release(resource, *amount),
            ActivityConfig::Timeout { distribution } => {
                trajectory.timeout_boxed(distribution.build(seed, streams))
            }
        })
}

impl ScenarioConfig {
    /// Parse a JSON scenario (not yet validated)
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json)
            .map_err(|e| invalid(format!("failed to parse scenario: {}", e)))
    }

    /// Check the whole scenario before anything is registered
    ///
    /// # Errors
    /// `InvalidConfig` naming the first problem found.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.name.is_empty() {
            return Err(invalid("scenario name must not be empty".to_string()));
        }
        if self.horizon.is_nan() || self.horizon < 0.0 {
            return Err(invalid(format!("horizon must be non-negative, got {}", self.horizon)));
        }

        let mut capacities = HashMap::new();
        for resource in &self.resources {
            if resource.name.is_empty() {
                return Err(invalid("resource name must not be empty".to_string()));
            }
            if capacities
                .insert(resource.name.as_str(), resource.capacity)
                .is_some()
            {
                return Err(SimulationError::DuplicateResource(resource.name.clone()));
            }
            if resource.capacity == 0 {
                return Err(invalid(format!(
                    "resource '{}': capacity must be positive",
                    resource.name
                )));
            }
            if let Some(limit) = resource.queue_size {
                QueueSize::try_from(limit)?;
            }
        }

        let mut prefixes = HashSet::new();
        for generator in &self.generators {
            let owner = format!("generator '{}'", generator.name_prefix);
            if generator.name_prefix.is_empty() {
                return Err(invalid("generator name prefix must not be empty".to_string()));
            }
            if !prefixes.insert(generator.name_prefix.as_str()) {
                return Err(SimulationError::DuplicateGenerator(
                    generator.name_prefix.clone(),
                ));
            }
            generator.distribution.validate(&owner)?;
            validate_trajectory(&owner, &generator.trajectory, &capacities, false)?;
        }

        Ok(())
    }
}

/// A validated scenario, ready to be built into simulators
#[derive(Debug, Clone)]
pub struct Scenario {
    config: ScenarioConfig,
}

impl Scenario {
    /// Validate `config` and wrap it
    pub fn new(config: ScenarioConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Parse and validate a JSON scenario
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        Self::new(ScenarioConfig::from_json(json)?)
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn horizon(&self) -> SimTime {
        self.config.horizon
    }

    /// Register everything on a new simulator
    ///
    /// Random streams are handed out in declaration order (each generator's
    /// inter-arrival distribution, then its timeouts), so building the same
    /// scenario twice yields simulators that produce identical runs.
    pub fn build(&self) -> Result<Simulator, SimulationError> {
        let config = &self.config;
        let mut sim = Simulator::new(config.name.clone(), config.verbose);

        for resource in &config.resources {
            let queue_size = match resource.queue_size {
                Some(limit) => QueueSize::try_from(limit)?,
                None => QueueSize::Unbounded,
            };
            sim.add_resource(&resource.name, resource.capacity, queue_size, resource.monitor)?;
        }

        let mut streams = 0u64;
        for generator in &config.generators {
            let distribution = generator.distribution.build(config.seed, &mut streams);
            let chain: Rc<dyn NextStep> =
                build_trajectory(&generator.trajectory, config.seed, &mut streams).build()?;
            sim.add_generator(&generator.name_prefix, chain, distribution, generator.monitor)?;
        }

        Ok(sim)
    }
}
