//! Client abstraction for a hosted realtime data store.
//!
//! The toy's shared state lives in a cloud-hosted keyed collection that
//! pushes add/change/remove notifications to every connected device. This
//! crate owns the seam against that service: opaque child keys, typed
//! listener hooks, and the object-safe [`RealtimeStore`] trait the engine
//! is written against. [`MemoryStore`] is an in-process implementation of
//! the same observable semantics, used by tests and local runs the way a
//! loopback transport stands in for a network stack.
//!
//! Writes are fire-and-forget: nothing here blocks on I/O, and failures are
//! reported asynchronously through the listeners' `cancelled` hooks rather
//! than as return values.

/// Opaque backend-assigned child keys.
pub mod key;
/// Typed listener hooks, subscription handles, and store errors.
pub mod listener;
/// In-process store emulation with a dispatcher-thread notification feed.
pub mod memory;

pub use key::PushKey;
pub use listener::{
    ChildListener, OffsetListener, RealtimeStore, StoreError, SubscriptionId,
};
pub use memory::MemoryStore;
