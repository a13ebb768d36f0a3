//! Bubble lifecycle and playback coordinator.
//!
//! [`BubbleField`] is the piece the host shell talks to: it spawns bubble
//! records into the shared store, mirrors the store's notifications into a
//! local replica, ages bubbles on every `tick`, pipes expiries back through
//! the store as delete requests, and plays a pooled pop cue when something
//! bursts. All state the store's notification thread touches is either an
//! atomic scalar or a concurrent map, so ticks and notifications never need
//! a shared lock.

/// Skew-corrected time: time sources and the injectable offset cell.
pub mod clock;
/// The coordinator.
pub mod field;
/// Tuning knobs loaded from TOML.
pub mod settings;

mod replica;

pub use clock::{ManualClock, SkewClock, SystemClock, TimeSource};
pub use field::BubbleField;
pub use settings::{FieldSettings, SettingsError};
