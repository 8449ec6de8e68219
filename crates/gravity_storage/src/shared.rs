use std::collections::BTreeMap;
use std::sync::Arc;

use gravity_core::{BodyId, Tick, TickRecord};
use parking_lot::RwLock;

use crate::history::{HistoryStore, RecordStatus};

/// History store shared between the simulation (single writer) and any
/// number of readers. Every mutation happens under one write guard, so
/// readers never observe a half-written, half-invalidated or half-evicted store.
pub type SharedHistory = Arc<RwLock<HistoryStore>>;

/// Read-only handle on a shared history, for display layers and other consumers
#[derive(Debug, Clone)]
pub struct HistoryReader {
    inner: SharedHistory,
}

impl HistoryReader {
    pub fn new(inner: SharedHistory) -> Self {
        Self { inner }
    }

    pub fn max_tick(&self) -> Tick {
        self.inner.read().max_tick()
    }

    pub fn min_tick(&self) -> Tick {
        self.inner.read().min_tick()
    }

    pub fn bytes_used(&self) -> u64 {
        self.inner.read().bytes_used()
    }

    pub fn read(&self, tick: Tick) -> BTreeMap<BodyId, TickRecord> {
        self.inner.read().read(tick)
    }

    pub fn status(&self, id: BodyId, tick: Tick) -> RecordStatus {
        self.inner.read().status(id, tick)
    }

    /// Run several queries against one consistent view of the store
    pub fn with<R>(&self, f: impl FnOnce(&HistoryStore) -> R) -> R {
        f(&self.inner.read())
    }
}
