//! Store-notification handlers.
//!
//! The local bubble collection is mutated only from here, in response to
//! the store's add/change/remove pushes; the coordinator itself never
//! inserts locally (its writes come back as echoes). Subscription errors
//! are logged and swallowed: the replica simply goes stale until the store
//! recovers on its own.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use serde_json::Value;
use tracing::{debug, warn};

use bubbles::Bubble;
use store::{ChildListener, OffsetListener, PushKey, StoreError};

use crate::clock::SkewClock;

/// State shared between the coordinator and its store listeners.
pub(crate) struct FieldShared {
    /// Mirror of the store's child collection.
    pub(crate) replica: DashMap<PushKey, Bubble>,
    /// Keys we already issued a delete request for and whose removal echo
    /// has not arrived yet.
    pub(crate) pending_pop: DashSet<PushKey>,
    pub(crate) clock: SkewClock,
}

pub(crate) struct ReplicaListener(pub(crate) Arc<FieldShared>);

impl ReplicaListener {
    fn apply(&self, key: &PushKey, value: &Value) {
        match serde_json::from_value::<Bubble>(value.clone()) {
            Ok(bubble) => {
                self.0.replica.insert(key.clone(), bubble);
            }
            Err(err) => {
                warn!(key = %key, error = %err, "ignoring malformed bubble record");
            }
        }
    }
}

impl ChildListener for ReplicaListener {
    fn child_added(&self, key: &PushKey, value: &Value) {
        self.apply(key, value);
    }

    fn child_changed(&self, key: &PushKey, value: &Value) {
        self.apply(key, value);
    }

    fn child_removed(&self, key: &PushKey) {
        self.0.replica.remove(key);
        self.0.pending_pop.remove(key);
    }

    fn cancelled(&self, error: StoreError) {
        warn!(error = %error, "bubble subscription cancelled; local view may be stale");
    }
}

pub(crate) struct SkewListener(pub(crate) Arc<FieldShared>);

impl OffsetListener for SkewListener {
    fn offset_changed(&self, offset_ms: i64) {
        debug!(offset_ms, "server clock offset updated");
        self.0.clock.set_skew_ms(offset_ms);
    }

    fn cancelled(&self, error: StoreError) {
        warn!(error = %error, "clock offset subscription cancelled");
    }
}
