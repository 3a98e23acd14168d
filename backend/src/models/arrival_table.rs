//! Arrival Table - generation-checked handle arena
//!
//! Live arrivals are stored in slots and referred to by `ArrivalHandle`.
//! A handle is only valid while its slot still holds the same generation
//! and belongs to the same simulator instance:
//!
//! - removing an arrival bumps the slot generation, so old handles go stale
//! - `clear()` (run reset) bumps every occupied slot
//! - handles minted by another simulator carry a different owner id
//!
//! Stale or foreign handles resolve to `None`; the simulator turns that into
//! a lookup error instead of touching the wrong arrival.

use crate::models::arrival::Arrival;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference to a live arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrivalHandle {
    owner: Uuid,
    index: u32,
    generation: u32,
}

impl ArrivalHandle {
    /// Simulator instance that issued this handle
    pub fn owner(&self) -> Uuid {
        self.owner
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    arrival: Option<Arrival>,
}

/// Arena of live arrivals owned by one simulator
#[derive(Debug, Clone)]
pub struct ArrivalTable {
    owner: Uuid,
    slots: Vec<Slot>,

    /// Vacant slot indices, reused LIFO
    free: Vec<u32>,

    len: usize,
}

impl ArrivalTable {
    /// Create an empty table for simulator `owner`
    pub fn new(owner: Uuid) -> Self {
        Self {
            owner,
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store an arrival and hand out its handle
    ///
    /// # Example
    /// ```
    /// use queue_simulator_core_rs::{Arrival, Trajectory};
    /// use queue_simulator_core_rs::models::ArrivalTable;
    /// use uuid::Uuid;
    ///
    /// let mut table = ArrivalTable::new(Uuid::new_v4());
    /// let chain = Trajectory::new().timeout_fixed(1.0).build().unwrap();
    /// let handle = table.insert(Arrival::new("a0".to_string(), 0, 0.0, chain, true));
    ///
    /// assert_eq!(table.get(handle).unwrap().name(), "a0");
    /// table.remove(handle);
    /// assert!(table.get(handle).is_none());
    /// ```
    pub fn insert(&mut self, arrival: Arrival) -> ArrivalHandle {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.arrival = Some(arrival);
            return ArrivalHandle {
                owner: self.owner,
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            arrival: Some(arrival),
        });
        ArrivalHandle {
            owner: self.owner,
            index,
            generation: 0,
        }
    }

    fn slot(&self, handle: ArrivalHandle) -> Option<&Slot> {
        if handle.owner != self.owner {
            return None;
        }
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
    }

    pub fn get(&self, handle: ArrivalHandle) -> Option<&Arrival> {
        self.slot(handle).and_then(|slot| slot.arrival.as_ref())
    }

    pub fn get_mut(&mut self, handle: ArrivalHandle) -> Option<&mut Arrival> {
        if handle.owner != self.owner {
            return None;
        }
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.arrival.as_mut())
    }

    pub fn contains(&self, handle: ArrivalHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Take an arrival out, invalidating its handle
    pub fn remove(&mut self, handle: ArrivalHandle) -> Option<Arrival> {
        if !self.contains(handle) {
            return None;
        }

        let slot = &mut self.slots[handle.index as usize];
        let arrival = slot.arrival.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        arrival
    }

    /// Drop every arrival; all outstanding handles go stale
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.arrival.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live arrivals with their handles, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ArrivalHandle, &Arrival)> + '_ {
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.arrival.as_ref().map(|arrival| {
                (
                    ArrivalHandle {
                        owner: self.owner,
                        index: index as u32,
                        generation: slot.generation,
                    },
                    arrival,
                )
            })
        })
    }
}
