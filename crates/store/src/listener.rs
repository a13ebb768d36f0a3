use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::key::PushKey;

/// Failures the store reports asynchronously on its subscription channels.
///
/// There is no recovery action to take: callers log these and keep serving
/// their possibly-stale local view until the connection heals on its own.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("subscription cancelled by the store ({code}): {message}")]
    Cancelled { code: String, message: String },

    #[error("store connection lost: {0}")]
    ConnectionLost(String),
}

/// Handle for detaching a listener registered with a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Typed hooks for mutations of the keyed child collection.
///
/// Hooks run on the store's notification thread, not on the thread that
/// issued any write, so implementations must be internally synchronized.
pub trait ChildListener: Send + Sync {
    fn child_added(&self, key: &PushKey, value: &Value);
    fn child_changed(&self, key: &PushKey, value: &Value);
    fn child_removed(&self, key: &PushKey);

    /// Reorder notification. Most consumers do not care.
    fn child_moved(&self, _key: &PushKey) {}

    /// The subscription failed; no further notifications will arrive on it.
    fn cancelled(&self, error: StoreError);
}

/// Hooks for the store's server-time-offset feed.
pub trait OffsetListener: Send + Sync {
    /// A fresh estimate of `server_clock - local_clock` in milliseconds.
    fn offset_changed(&self, offset_ms: i64);

    fn cancelled(&self, error: StoreError);
}

/// The hosted realtime store, as seen by one device.
///
/// Object-safe so coordinators can hold `Arc<dyn RealtimeStore>` and tests
/// can substitute an in-process implementation. Write operations never
/// block and never fail synchronously; connectivity trouble surfaces on the
/// listener hooks instead.
pub trait RealtimeStore: Send + Sync {
    /// Mints a fresh globally-unique key for a child about to be written.
    fn push_key(&self) -> PushKey;

    /// Creates or overwrites the child at `key`. Fire-and-forget.
    fn write(&self, key: &PushKey, value: Value);

    /// Deletes the child at `key` if present. Fire-and-forget.
    fn delete(&self, key: &PushKey);

    /// Registers a child listener.
    ///
    /// The listener first receives one `child_added` per already-existing
    /// child (in key order), then live notifications.
    fn subscribe_children(&self, listener: Arc<dyn ChildListener>) -> SubscriptionId;

    /// Registers an offset listener.
    ///
    /// The listener immediately receives the current offset, then every
    /// subsequent change.
    fn subscribe_clock_offset(&self, listener: Arc<dyn OffsetListener>) -> SubscriptionId;

    /// Detaches a listener. Idempotent; unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}
