use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::warn;

/// Bounded set of reusable playback handles.
///
/// Membership only ever transitions between "pooled" and "taken"; handles
/// are destroyed by dropping them outside the pool. Take and return are
/// individually atomic, so completion notifications may race pop decisions
/// without external locking.
#[derive(Debug, Default)]
pub struct PlayerPool<H> {
    players: Mutex<VecDeque<H>>,
}

impl<H> PlayerPool<H> {
    pub fn new() -> Self {
        Self {
            players: Mutex::new(VecDeque::new()),
        }
    }

    /// Takes the least-recently-returned handle, if any.
    pub fn take(&self) -> Option<H> {
        match self.players.lock() {
            Ok(mut players) => players.pop_front(),
            Err(_) => {
                warn!("player pool mutex poisoned; treating pool as empty");
                None
            }
        }
    }

    /// Returns a handle to the back of the pool.
    pub fn give(&self, player: H) {
        match self.players.lock() {
            Ok(mut players) => players.push_back(player),
            Err(_) => warn!("player pool mutex poisoned; dropping returned player"),
        }
    }

    /// Drops every pooled handle. A no-op on an already-empty pool.
    pub fn clear(&self) {
        if let Ok(mut players) = self.players.lock() {
            players.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.players.lock().map(|players| players.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
