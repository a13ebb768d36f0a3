//! Scriptable in-memory audio backend.
//!
//! Public (not test-gated) so engine integration tests and headless demo
//! runs can observe playback behavior without an audio device, the same way
//! an in-memory store stands in for the hosted backend.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{AudioBackend, AudioError, PlaybackHandle};

#[derive(Default)]
struct MockState {
    create_calls: AtomicUsize,
    starts: AtomicUsize,
    rewinds: AtomicUsize,
    fail_slots: Mutex<HashSet<usize>>,
    live: Mutex<Vec<Arc<AtomicBool>>>,
}

/// Backend whose handles play silently and finish on command.
///
/// Clones share one state, so a test can keep a probe clone while the
/// engine owns the backend.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `slot`-th `create_player` call (0-based, counted across
    /// the backend's lifetime) fail.
    pub fn fail_on(&self, slot: usize) {
        if let Ok(mut slots) = self.state.fail_slots.lock() {
            slots.insert(slot);
        }
    }

    /// Number of handles ever created.
    pub fn created(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `start` calls across all handles.
    pub fn starts(&self) -> usize {
        self.state.starts.load(Ordering::SeqCst)
    }

    /// Number of `rewind` calls across all handles.
    pub fn rewinds(&self) -> usize {
        self.state.rewinds.load(Ordering::SeqCst)
    }

    /// Marks every handle created so far as finished playing.
    pub fn finish_all(&self) {
        if let Ok(live) = self.state.live.lock() {
            for finished in live.iter() {
                finished.store(true, Ordering::SeqCst);
            }
        }
    }
}

impl AudioBackend for MockBackend {
    type Handle = MockHandle;

    fn create_player(&self, _volume: f32) -> Result<MockHandle, AudioError> {
        let slot = self.state.create_calls.fetch_add(1, Ordering::SeqCst);
        let should_fail = self
            .state
            .fail_slots
            .lock()
            .map(|slots| slots.contains(&slot))
            .unwrap_or(false);
        if should_fail {
            return Err(AudioError::CreateFailed(format!(
                "scripted failure for slot {slot}"
            )));
        }

        let finished = Arc::new(AtomicBool::new(true));
        if let Ok(mut live) = self.state.live.lock() {
            live.push(Arc::clone(&finished));
        }
        Ok(MockHandle {
            state: Arc::clone(&self.state),
            finished,
        })
    }
}

pub struct MockHandle {
    state: Arc<MockState>,
    finished: Arc<AtomicBool>,
}

impl PlaybackHandle for MockHandle {
    fn start(&mut self) {
        self.state.starts.fetch_add(1, Ordering::SeqCst);
        self.finished.store(false, Ordering::SeqCst);
    }

    fn rewind(&mut self) {
        self.state.rewinds.fetch_add(1, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}
