//! Statistics collection
//!
//! Append-only storage for what the engine observes during a run:
//! - **Arrival records**: one per arrival that finished or left the system
//! - **Resource observations**: one per state-changing seize/release
//!
//! Nothing is mutated once appended. A run reset clears everything.
//!
//! # Example
//!
//! ```rust
//! use queue_simulator_core_rs::stats::{ResourceObservation, StatisticsCollector};
//!
//! let mut stats = StatisticsCollector::new();
//! stats.observe("server", ResourceObservation { time: 0.0, server: 1, queue: 0 });
//! stats.observe("server", ResourceObservation { time: 2.0, server: 0, queue: 0 });
//!
//! assert_eq!(stats.resource("server").len(), 2);
//! assert!(stats.resource("unknown").is_empty());
//! ```

use crate::core::SimTime;
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Outcome of one arrival
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalRecord {
    pub name: String,
    pub start_time: SimTime,

    /// `None` when the run horizon cut the arrival short
    pub end_time: Option<SimTime>,

    /// Time spent in completed timeouts (queue waiting excluded)
    pub activity_time: SimTime,

    /// True only when the activity chain ran to its end
    pub finished: bool,
}

/// Resource occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceObservation {
    pub time: SimTime,

    /// Units in service
    pub server: u32,

    /// Waiting requests
    pub queue: usize,
}

/// Append-only record store for one simulator
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    arrivals: Vec<ArrivalRecord>,
    resources: BTreeMap<String, Vec<ResourceObservation>>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed (or departed) arrival
    pub fn record_arrival(&mut self, record: ArrivalRecord) {
        self.arrivals.push(record);
    }

    /// Append an observation for `resource`
    pub fn observe(&mut self, resource: &str, observation: ResourceObservation) {
        self.resources
            .entry(resource.to_string())
            .or_default()
            .push(observation);
    }

    /// Records of arrivals that are no longer in the system
    pub fn arrivals(&self) -> &[ArrivalRecord] {
        &self.arrivals
    }

    /// Observation log for `resource` (empty if never observed)
    pub fn resource(&self, resource: &str) -> &[ResourceObservation] {
        self.resources
            .get(resource)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All observation logs keyed by resource name
    pub fn resources(&self) -> &BTreeMap<String, Vec<ResourceObservation>> {
        &self.resources
    }

    pub fn clear(&mut self) {
        self.arrivals.clear();
        self.resources.clear();
    }
}

#[derive(Serialize)]
struct DigestInput<'a> {
    arrivals: &'a [ArrivalRecord],
    resources: &'a BTreeMap<String, Vec<ResourceObservation>>,
}

/// Hex SHA-256 over the canonical JSON of a run's statistics
///
/// Two runs fed identical distribution and activity sequences produce the
/// same digest. Resource logs are keyed in name order.
pub fn digest(
    arrivals: &[ArrivalRecord],
    resources: &BTreeMap<String, Vec<ResourceObservation>>,
) -> Result<String, SimulationError> {
    let json = serde_json::to_string(&DigestInput {
        arrivals,
        resources,
    })
    .map_err(|e| SimulationError::Serialization(format!("statistics digest failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record(name: &str, end_time: Option<SimTime>) -> ArrivalRecord {
        ArrivalRecord {
            name: name.to_string(),
            start_time: 0.0,
            end_time,
            activity_time: 1.0,
            finished: end_time.is_some(),
        }
    }

    #[test]
    fn test_records_keep_append_order() {
        let mut stats = StatisticsCollector::new();
        stats.record_arrival(create_test_record("b0", Some(3.0)));
        stats.record_arrival(create_test_record("a0", Some(1.0)));

        let names: Vec<&str> = stats.arrivals().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b0", "a0"]);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut stats = StatisticsCollector::new();
        stats.record_arrival(create_test_record("a0", Some(1.0)));
        stats.observe("r", ResourceObservation { time: 0.0, server: 1, queue: 0 });

        stats.clear();
        assert!(stats.arrivals().is_empty());
        assert!(stats.resource("r").is_empty());
        assert!(stats.resources().is_empty());
    }

    #[test]
    fn test_digest_is_stable_and_sensitive() {
        let mut resources = BTreeMap::new();
        resources.insert(
            "r".to_string(),
            vec![ResourceObservation { time: 0.0, server: 1, queue: 0 }],
        );
        let records = vec![create_test_record("a0", Some(2.0))];

        let first = digest(&records, &resources).unwrap();
        let second = digest(&records, &resources).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        let changed = vec![create_test_record("a0", Some(2.5))];
        assert_ne!(first, digest(&changed, &resources).unwrap());
    }
}
