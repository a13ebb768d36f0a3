use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::{DashMap, DashSet};
use tracing::{debug, warn};

use audio::{AudioBackend, PlaybackHandle, PlayerPool};
use bubbles::Bubble;
use store::{RealtimeStore, SubscriptionId};

use crate::clock::{SkewClock, SystemClock, TimeSource};
use crate::replica::{FieldShared, ReplicaListener, SkewListener};
use crate::settings::FieldSettings;

/// The bubble lifecycle and playback coordinator.
///
/// One instance per device. Construction subscribes to the store's child
/// collection and server-time-offset feed; dropping the field detaches
/// both. The host shell calls [`activate`](Self::activate) /
/// [`deactivate`](Self::deactivate) around visibility changes,
/// [`spawn`](Self::spawn) on taps, and [`tick`](Self::tick) once per
/// update cycle.
///
/// Every method takes `&self`: store notifications land on a foreign
/// thread and may freely race ticks.
pub struct BubbleField<B: AudioBackend> {
    shared: Arc<FieldShared>,
    store: Arc<dyn RealtimeStore>,
    backend: B,
    pool: PlayerPool<B::Handle>,
    /// Players currently sounding a pop; reclaimed once finished.
    in_flight: Mutex<Vec<B::Handle>>,
    running: AtomicBool,
    /// Local timestamp of the previous tick, `-1` until the warm-up tick
    /// has run.
    last_tick_local_ms: AtomicI64,
    settings: FieldSettings,
    child_sub: SubscriptionId,
    offset_sub: SubscriptionId,
}

impl<B: AudioBackend> BubbleField<B> {
    /// Builds a coordinator on the process clock.
    pub fn new(store: Arc<dyn RealtimeStore>, backend: B, settings: FieldSettings) -> Self {
        Self::with_time_source(store, backend, settings, Arc::new(SystemClock))
    }

    /// Builds a coordinator on an injected time source.
    pub fn with_time_source(
        store: Arc<dyn RealtimeStore>,
        backend: B,
        settings: FieldSettings,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let shared = Arc::new(FieldShared {
            replica: DashMap::new(),
            pending_pop: DashSet::new(),
            clock: SkewClock::new(time),
        });

        let child_sub = store.subscribe_children(Arc::new(ReplicaListener(Arc::clone(&shared))));
        let offset_sub = store.subscribe_clock_offset(Arc::new(SkewListener(Arc::clone(&shared))));

        Self {
            shared,
            store,
            backend,
            pool: PlayerPool::new(),
            in_flight: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            last_tick_local_ms: AtomicI64::new(-1),
            settings,
            child_sub,
            offset_sub,
        }
    }

    /// Writes a new bubble into the shared store.
    ///
    /// No local state changes here: the replica picks the bubble up when
    /// the store echoes the add back, the same path every other device
    /// takes. Coordinates are accepted as given.
    pub fn spawn(&self, x: f32, y: f32) {
        let key = self.store.push_key();
        let bubble = Bubble::new(x, y, self.shared.clock.synced_now_ms());
        match serde_json::to_value(bubble) {
            Ok(value) => {
                debug!(key = %key, x, y, "spawning bubble");
                self.store.write(&key, value);
            }
            Err(err) => warn!(error = %err, "failed to encode bubble record"),
        }
    }

    /// Ages the field by one frame.
    ///
    /// The first call only records a timestamp: elapsed-time deltas are
    /// undefined before a first reading exists. Afterwards each call
    /// reclaims finished players, requests deletion of every bubble that
    /// outgrew the threshold (once per bubble; the request is remembered
    /// until the removal echo clears it), and starts at most one pooled
    /// player if anything popped.
    pub fn tick(&self) {
        let local_now = self.shared.clock.local_now_ms();
        if self.last_tick_local_ms.swap(local_now, Ordering::AcqRel) < 0 {
            return;
        }

        self.reclaim_finished();

        let now = self.shared.clock.synced_now_ms();
        let growth = &self.settings.growth;
        let mut newly_popped = 0usize;
        for entry in self.shared.replica.iter() {
            if entry.value().is_popped(now, growth)
                && self.shared.pending_pop.insert(entry.key().clone())
            {
                debug!(
                    key = %entry.key(),
                    radius = entry.value().radius_at(now, growth),
                    "bubble outgrew the field; requesting delete"
                );
                // Pipe the removal through the store; the replica shrinks
                // when the echo arrives.
                self.store.delete(entry.key());
                newly_popped += 1;
            }
        }

        if newly_popped > 0 {
            // One cue per tick no matter how many bubbles went together.
            if let Some(mut player) = self.pool.take() {
                player.start();
                match self.in_flight.lock() {
                    Ok(mut in_flight) => in_flight.push(player),
                    Err(_) => warn!("in-flight mutex poisoned; dropping player"),
                }
            }
        }
    }

    /// Hands a finished player back to the coordinator.
    ///
    /// Active: the player is rewound and re-pooled. Inactive: it is
    /// dropped, and the pool stays smaller until the next activation.
    pub fn playback_complete(&self, mut player: B::Handle) {
        if self.running.load(Ordering::Acquire) {
            player.rewind();
            self.pool.give(player);
        }
    }

    /// Allocates the playback pool and marks the coordinator active.
    ///
    /// A handle that fails to allocate is skipped (the pool just ends up
    /// smaller) and activation itself never fails.
    pub fn activate(&self) {
        for slot in 0..self.settings.pool_size {
            match self.backend.create_player(self.settings.volume) {
                Ok(player) => self.pool.give(player),
                Err(err) => warn!(slot, error = %err, "skipping playback handle"),
            }
        }
        self.running.store(true, Ordering::Release);
    }

    /// Marks the coordinator inactive and releases every playback handle.
    ///
    /// Always safe to call; clearing an already-empty pool is a no-op.
    pub fn deactivate(&self) {
        self.running.store(false, Ordering::Release);
        self.pool.clear();
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Snapshot copy of the current bubbles, for rendering.
    pub fn bubbles(&self) -> Vec<Bubble> {
        self.shared.replica.iter().map(|entry| *entry.value()).collect()
    }

    pub fn len(&self) -> usize {
        self.shared.replica.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.replica.is_empty()
    }

    /// Currently pooled (idle) players.
    pub fn pooled_players(&self) -> usize {
        self.pool.len()
    }

    /// Latest server-clock skew estimate, in milliseconds.
    pub fn skew_ms(&self) -> i64 {
        self.shared.clock.skew_ms()
    }

    /// Moves finished in-flight players through the completion path.
    fn reclaim_finished(&self) {
        let finished = {
            let Ok(mut in_flight) = self.in_flight.lock() else {
                return;
            };
            let mut finished = Vec::new();
            let mut idx = 0;
            while idx < in_flight.len() {
                if in_flight[idx].is_finished() {
                    finished.push(in_flight.swap_remove(idx));
                } else {
                    idx += 1;
                }
            }
            finished
        };
        for player in finished {
            self.playback_complete(player);
        }
    }
}

impl<B: AudioBackend> Drop for BubbleField<B> {
    fn drop(&mut self) {
        self.store.unsubscribe(self.child_sub);
        self.store.unsubscribe(self.offset_sub);
    }
}
