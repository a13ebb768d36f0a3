use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of local wall-clock time, in epoch milliseconds.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// The process clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Settable time source for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// A time source corrected by the store's server-time offset.
///
/// The skew cell is owned by whoever builds it and injected into the
/// coordinator, never process-global, so independent coordinators (and
/// tests) cannot interfere with each other. Updates are last-write-wins
/// with no ordering guarantee; eventual visibility is all the toy needs.
pub struct SkewClock {
    time: Arc<dyn TimeSource>,
    skew_ms: AtomicI64,
}

impl SkewClock {
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            time,
            skew_ms: AtomicI64::new(0),
        }
    }

    /// Uncorrected local time.
    pub fn local_now_ms(&self) -> i64 {
        self.time.now_ms()
    }

    /// Local time shifted onto the server's clock.
    pub fn synced_now_ms(&self) -> i64 {
        self.time.now_ms() + self.skew_ms.load(Ordering::Relaxed)
    }

    pub fn set_skew_ms(&self, skew_ms: i64) {
        self.skew_ms.store(skew_ms, Ordering::Relaxed);
    }

    pub fn skew_ms(&self) -> i64 {
        self.skew_ms.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for SkewClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkewClock")
            .field("skew_ms", &self.skew_ms())
            .finish()
    }
}
