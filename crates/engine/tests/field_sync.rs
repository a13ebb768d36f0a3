//! Integration tests for the coordinator against the in-memory store.
//!
//! Everything runs on a manual clock and the mock audio backend, so radius
//! math, delete intent, and pool behavior are exact.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use audio::mock::MockBackend;
use audio::AudioBackend;
use engine::{BubbleField, FieldSettings, ManualClock};
use store::{ChildListener, MemoryStore, OffsetListener, PushKey, RealtimeStore, SubscriptionId};

const T0: i64 = 1_000_000;

fn field_on(
    store: Arc<dyn RealtimeStore>,
    clock: Arc<ManualClock>,
    backend: MockBackend,
) -> BubbleField<MockBackend> {
    BubbleField::with_time_source(store, backend, FieldSettings::default(), clock)
}

/// Write a child the way a remote device would, bypassing any coordinator.
fn write_raw_bubble(store: &MemoryStore, key: &str, born: i64) -> PushKey {
    let key = PushKey::from_raw(key);
    store.write(&key, json!({"x": 0.0, "y": 0.0, "born": born}));
    key
}

#[test]
fn spawn_replicates_via_the_store_echo() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let device_a = field_on(Arc::new(store.clone()), clock.clone(), MockBackend::new());
    let device_b = field_on(Arc::new(store.clone()), clock.clone(), MockBackend::new());

    device_a.spawn(10.5, 20.25);
    store.flush();

    for device in [&device_a, &device_b] {
        let bubbles = device.bubbles();
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].x, 10.5);
        assert_eq!(bubbles[0].y, 20.25);
        assert_eq!(bubbles[0].born, T0);
    }
}

#[test]
fn born_is_stamped_on_the_server_clock() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let device = field_on(Arc::new(store.clone()), clock, MockBackend::new());

    store.set_server_clock_offset(5_000);
    store.flush();
    assert_eq!(device.skew_ms(), 5_000);

    device.spawn(1.0, 1.0);
    store.flush();

    assert_eq!(device.bubbles()[0].born, T0 + 5_000);
}

#[test]
fn first_tick_is_a_warm_up_frame() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let backend = MockBackend::new();
    let device = field_on(Arc::new(store.clone()), clock, backend.clone());
    device.activate();

    // A bubble that expired ages ago must survive the warm-up tick.
    write_raw_bubble(&store, "ancient", T0 - 1_000_000);
    store.flush();

    device.tick();
    store.flush();
    assert_eq!(store.len(), 1);
    assert_eq!(backend.starts(), 0);

    device.tick();
    store.flush();
    assert!(store.is_empty());
    assert_eq!(backend.starts(), 1);
}

#[test]
fn expired_bubble_is_deleted_exactly_once() {
    let store = MemoryStore::new();
    let spy = Arc::new(SpyStore::new(store.clone()));
    let clock = Arc::new(ManualClock::new(T0));
    let device = field_on(spy.clone(), clock.clone(), MockBackend::new());

    write_raw_bubble(&store, "doomed", T0 - 1_000_000);
    store.flush();

    device.tick();
    clock.advance(16);
    device.tick();
    assert_eq!(spy.delete_count(), 1);

    // The removal echo is withheld, so the bubble is still replicated; the
    // pending marker must suppress further delete requests.
    for _ in 0..3 {
        clock.advance(16);
        device.tick();
    }
    assert_eq!(spy.delete_count(), 1);
    assert_eq!(device.len(), 1);

    spy.release_deletes();
    store.flush();
    assert!(device.is_empty());
    assert!(store.is_empty());
}

#[test]
fn threshold_is_strictly_greater_than_max_radius() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let device = field_on(Arc::new(store.clone()), clock.clone(), MockBackend::new());

    write_raw_bubble(&store, "edge", T0);
    store.flush();

    device.tick();

    // Radius is exactly 100.0 at +8000 ms: still alive.
    clock.set(T0 + 8_000);
    device.tick();
    store.flush();
    assert_eq!(store.len(), 1);

    clock.set(T0 + 8_001);
    device.tick();
    store.flush();
    assert!(store.is_empty());
    assert!(device.is_empty());
}

#[test]
fn simultaneous_pops_coalesce_into_one_cue() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let backend = MockBackend::new();
    let device = field_on(Arc::new(store.clone()), clock.clone(), backend.clone());
    device.activate();
    assert_eq!(device.pooled_players(), 4);

    for key in ["a", "b", "c"] {
        write_raw_bubble(&store, key, T0 - 1_000_000);
    }
    store.flush();

    device.tick();
    clock.advance(16);
    device.tick();

    assert_eq!(backend.starts(), 1);
    assert_eq!(device.pooled_players(), 3);
}

#[test]
fn no_cue_when_the_pool_is_empty() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let backend = MockBackend::new();
    let device = field_on(Arc::new(store.clone()), clock.clone(), backend.clone());
    // Never activated: the pool is empty but expiry must still work.

    write_raw_bubble(&store, "quiet", T0 - 1_000_000);
    store.flush();

    device.tick();
    clock.advance(16);
    device.tick();
    store.flush();

    assert_eq!(backend.starts(), 0);
    assert!(store.is_empty());
}

#[test]
fn finished_players_are_rewound_and_repooled_while_active() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let backend = MockBackend::new();
    let device = field_on(Arc::new(store.clone()), clock.clone(), backend.clone());
    device.activate();

    write_raw_bubble(&store, "pop", T0 - 1_000_000);
    store.flush();
    device.tick();
    clock.advance(16);
    device.tick();
    assert_eq!(device.pooled_players(), 3);

    backend.finish_all();
    clock.advance(16);
    device.tick();

    assert_eq!(device.pooled_players(), 4);
    assert_eq!(backend.rewinds(), 1);
}

#[test]
fn deactivation_empties_the_pool_and_drops_completions() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let backend = MockBackend::new();
    let device = field_on(Arc::new(store.clone()), clock, backend.clone());

    device.activate();
    assert!(device.is_active());
    assert_eq!(device.pooled_players(), 4);

    device.deactivate();
    assert!(!device.is_active());
    assert_eq!(device.pooled_players(), 0);
    // Safe to repeat.
    device.deactivate();

    // A completion arriving after deactivation drops the player for good.
    let stray = backend.create_player(1.0).unwrap();
    device.playback_complete(stray);
    assert_eq!(device.pooled_players(), 0);
    assert_eq!(backend.rewinds(), 0);
}

#[test]
fn allocation_failures_shrink_the_pool_without_aborting() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let backend = MockBackend::new();
    backend.fail_on(0);
    backend.fail_on(2);
    let device = field_on(Arc::new(store.clone()), clock, backend.clone());

    device.activate();

    assert!(device.is_active());
    assert_eq!(backend.created(), 4);
    assert_eq!(device.pooled_players(), 2);
}

#[test]
fn late_joining_device_sees_existing_bubbles() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let device_a = field_on(Arc::new(store.clone()), clock.clone(), MockBackend::new());

    device_a.spawn(3.0, 4.0);
    store.flush();

    let device_b = field_on(Arc::new(store.clone()), clock, MockBackend::new());
    store.flush();
    assert_eq!(device_b.len(), 1);
}

#[test]
fn malformed_children_are_ignored() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let device = field_on(Arc::new(store.clone()), clock, MockBackend::new());

    store.write(&PushKey::from_raw("junk"), json!(42));
    store.flush();
    assert!(device.is_empty());

    device.spawn(1.0, 2.0);
    store.flush();
    assert_eq!(device.len(), 1);
}

#[test]
fn store_errors_degrade_to_a_stale_view_only() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(T0));
    let device = field_on(Arc::new(store.clone()), clock.clone(), MockBackend::new());

    store.inject_error(store::StoreError::ConnectionLost("simulated".into()));
    store.flush();

    // Still fully operational afterwards.
    device.spawn(7.0, 8.0);
    store.flush();
    assert_eq!(device.len(), 1);
    device.tick();
    clock.advance(16);
    device.tick();
}

/// Store wrapper that records delete requests and withholds them until the
/// test releases them, simulating in-flight deletes whose removal echo has
/// not come back yet.
struct SpyStore {
    inner: MemoryStore,
    withheld: Mutex<Vec<PushKey>>,
    deletes: AtomicUsize,
}

impl SpyStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            withheld: Mutex::new(Vec::new()),
            deletes: AtomicUsize::new(0),
        }
    }

    fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Forwards every withheld delete to the real store.
    fn release_deletes(&self) {
        let withheld: Vec<PushKey> = std::mem::take(&mut *self.withheld.lock().unwrap());
        for key in withheld {
            self.inner.delete(&key);
        }
    }
}

impl RealtimeStore for SpyStore {
    fn push_key(&self) -> PushKey {
        self.inner.push_key()
    }

    fn write(&self, key: &PushKey, value: Value) {
        self.inner.write(key, value);
    }

    fn delete(&self, key: &PushKey) {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.withheld.lock().unwrap().push(key.clone());
    }

    fn subscribe_children(&self, listener: Arc<dyn ChildListener>) -> SubscriptionId {
        self.inner.subscribe_children(listener)
    }

    fn subscribe_clock_offset(&self, listener: Arc<dyn OffsetListener>) -> SubscriptionId {
        self.inner.subscribe_clock_offset(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.unsubscribe(id)
    }
}
