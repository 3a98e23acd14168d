//! Deterministic random number generation
//!
//! Built-in distributions draw from xorshift64* streams. The engine itself
//! never draws random numbers; only capability implementations do.

mod xorshift;

pub use xorshift::RngManager;
