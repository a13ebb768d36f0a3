//! In-process emulation of the hosted realtime store.
//!
//! Every [`MemoryStore`] clone behaves like one device's connection to the
//! same cloud collection: writes from any handle echo back to every
//! subscribed listener (the writer included), and all notifications are
//! delivered by a single dispatcher thread, so listener code runs off the
//! caller's thread exactly as it would under the real SDK. This is the
//! store-shaped sibling of an in-memory loopback transport: the semantics
//! of the hosted service without ever touching a network stack.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::key::PushKey;
use crate::listener::{
    ChildListener, OffsetListener, RealtimeStore, StoreError, SubscriptionId,
};

enum Command {
    Write {
        key: PushKey,
        value: Value,
    },
    Delete {
        key: PushKey,
    },
    SubscribeChildren {
        id: SubscriptionId,
        listener: Arc<dyn ChildListener>,
    },
    SubscribeOffset {
        id: SubscriptionId,
        listener: Arc<dyn OffsetListener>,
    },
    Unsubscribe {
        id: SubscriptionId,
    },
    SetOffset {
        offset_ms: i64,
    },
    InjectError {
        error: StoreError,
    },
    Flush {
        done: Sender<()>,
    },
}

/// Shared-state store emulation; cloning yields another device handle.
#[derive(Clone)]
pub struct MemoryStore {
    /// Canonical tree, written only by the dispatcher. Kept shared so tests
    /// can inspect the store's ground truth after a flush.
    tree: Arc<Mutex<BTreeMap<PushKey, Value>>>,
    tx: Sender<Command>,
}

impl MemoryStore {
    /// Creates the store and starts its dispatcher thread.
    ///
    /// The dispatcher drains outstanding commands and exits once the last
    /// handle is dropped; it is deliberately not joined.
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        let tree: Arc<Mutex<BTreeMap<PushKey, Value>>> = Arc::new(Mutex::new(BTreeMap::new()));

        let dispatcher_tree = Arc::clone(&tree);
        thread::Builder::new()
            .name("store-dispatch".into())
            .spawn(move || dispatch(rx, dispatcher_tree))
            .expect("failed to spawn store dispatcher thread");

        Self { tree, tx }
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            warn!("store dispatcher is gone; dropping command");
        }
    }

    /// Simulation hook: feeds a new server-time offset to every offset
    /// listener. Last write wins.
    pub fn set_server_clock_offset(&self, offset_ms: i64) {
        self.send(Command::SetOffset { offset_ms });
    }

    /// Simulation hook: reports `error` on every active subscription, the
    /// way a connectivity failure would.
    pub fn inject_error(&self, error: StoreError) {
        self.send(Command::InjectError { error });
    }

    /// Blocks until every command enqueued so far has been dispatched.
    ///
    /// Test and shutdown helper only; production callers rely on the push
    /// feed and never wait on the store.
    pub fn flush(&self) {
        let (done_tx, done_rx) = bounded(1);
        self.send(Command::Flush { done: done_tx });
        let _ = done_rx.recv();
    }

    /// Snapshot of the canonical tree, in key order.
    pub fn snapshot(&self) -> Vec<(PushKey, Value)> {
        match self.tree.lock() {
            Ok(tree) => tree.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of children currently in the canonical tree.
    pub fn len(&self) -> usize {
        self.tree.lock().map(|tree| tree.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeStore for MemoryStore {
    fn push_key(&self) -> PushKey {
        PushKey::from_raw(Uuid::new_v4().simple().to_string())
    }

    fn write(&self, key: &PushKey, value: Value) {
        self.send(Command::Write {
            key: key.clone(),
            value,
        });
    }

    fn delete(&self, key: &PushKey) {
        self.send(Command::Delete { key: key.clone() });
    }

    fn subscribe_children(&self, listener: Arc<dyn ChildListener>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.send(Command::SubscribeChildren { id, listener });
        id
    }

    fn subscribe_clock_offset(&self, listener: Arc<dyn OffsetListener>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.send(Command::SubscribeOffset { id, listener });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.send(Command::Unsubscribe { id });
    }
}

/// Dispatcher loop. Subscriber registries live here, on the one thread that
/// touches them, so command order fully determines notification order.
fn dispatch(rx: Receiver<Command>, tree: Arc<Mutex<BTreeMap<PushKey, Value>>>) {
    let mut child_subs: Vec<(SubscriptionId, Arc<dyn ChildListener>)> = Vec::new();
    let mut offset_subs: Vec<(SubscriptionId, Arc<dyn OffsetListener>)> = Vec::new();
    let mut offset_ms: i64 = 0;

    while let Ok(command) = rx.recv() {
        match command {
            Command::Write { key, value } => {
                let previous = match tree.lock() {
                    Ok(mut tree) => tree.insert(key.clone(), value.clone()),
                    Err(_) => continue,
                };
                for (_, listener) in &child_subs {
                    if previous.is_some() {
                        listener.child_changed(&key, &value);
                    } else {
                        listener.child_added(&key, &value);
                    }
                }
            }
            Command::Delete { key } => {
                let existed = match tree.lock() {
                    Ok(mut tree) => tree.remove(&key).is_some(),
                    Err(_) => continue,
                };
                // Deleting an absent child is a silent no-op.
                if existed {
                    for (_, listener) in &child_subs {
                        listener.child_removed(&key);
                    }
                }
            }
            Command::SubscribeChildren { id, listener } => {
                let replay: Vec<(PushKey, Value)> = match tree.lock() {
                    Ok(tree) => tree.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                    Err(_) => Vec::new(),
                };
                for (key, value) in &replay {
                    listener.child_added(key, value);
                }
                child_subs.push((id, listener));
            }
            Command::SubscribeOffset { id, listener } => {
                listener.offset_changed(offset_ms);
                offset_subs.push((id, listener));
            }
            Command::Unsubscribe { id } => {
                child_subs.retain(|(sub_id, _)| *sub_id != id);
                offset_subs.retain(|(sub_id, _)| *sub_id != id);
            }
            Command::SetOffset { offset_ms: next } => {
                offset_ms = next;
                for (_, listener) in &offset_subs {
                    listener.offset_changed(offset_ms);
                }
            }
            Command::InjectError { error } => {
                for (_, listener) in &child_subs {
                    listener.cancelled(error.clone());
                }
                for (_, listener) in &offset_subs {
                    listener.cancelled(error.clone());
                }
            }
            Command::Flush { done } => {
                let _ = done.send(());
            }
        }
    }
}
