//! Playback handles for the pop sound cue.
//!
//! The host platform owns the actual audio device; this crate defines the
//! seam the engine talks through: a backend that allocates short-clip
//! playback handles, and a bounded pool that cycles handles between
//! "available" and "in use". The [`mock`] backend is always compiled and
//! drives deterministic tests; the `rodio` cargo feature adds a real
//! output-device backend.

/// Deterministic backend for tests and headless runs.
pub mod mock;
/// Bounded pool of reusable playback handles.
pub mod pool;
/// Output-device backend built on rodio.
#[cfg(feature = "rodio")]
pub mod sink;

pub use pool::PlayerPool;
#[cfg(feature = "rodio")]
pub use sink::{RodioBackend, RodioHandle};

/// Failure to obtain a playback handle.
///
/// Allocation failures are recoverable by design: the caller omits the
/// handle and plays fewer sounds. Nothing here aborts.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    #[error("failed to create playback handle: {0}")]
    CreateFailed(String),
}

/// A short, non-looping sound clip loaded and ready to play.
///
/// Handles are created configured (volume set, looping off) and are
/// released by dropping them.
pub trait PlaybackHandle: Send {
    /// Starts (or restarts) playback from the current position.
    fn start(&mut self);

    /// Seeks back to the beginning so the next [`start`](Self::start)
    /// plays the full clip.
    fn rewind(&mut self);

    /// Whether the last started playback has run to completion. Handles
    /// that were never started count as finished.
    fn is_finished(&self) -> bool;
}

/// Allocates playback handles for one fixed clip.
pub trait AudioBackend: Send + Sync {
    type Handle: PlaybackHandle;

    /// Creates one configured handle at the given volume.
    fn create_player(&self, volume: f32) -> Result<Self::Handle, AudioError>;
}
