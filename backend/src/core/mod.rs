//! Core engine primitives

pub mod clock;

pub use clock::{SimClock, SimTime};
