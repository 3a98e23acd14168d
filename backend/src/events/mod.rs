//! Event scheduling
//!
//! The event queue is the only thing that can move simulated time forward.
//!
//! # Design Principles
//!
//! 1. **Time order**: the earliest event is always dispatched first
//! 2. **FIFO ties**: events at the same time run in insertion order
//! 3. **Determinism**: identical inputs give an identical dispatch sequence

pub mod scheduler;

pub use scheduler::{EventScheduler, EventTarget, ScheduledEvent};
