//! Domain model for the bubbles screen toy.
//!
//! A bubble is a timestamped, positioned circle whose radius is a pure
//! function of its age. Nothing in here talks to the store or the audio
//! layer; growth math is deterministic so every device computes the same
//! radius for the same record.

mod bubble;

pub use bubble::{Bubble, Growth};
