use crate::record::RecordStore;
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holder for the current table snapshot. Readers get an `Arc` to a
/// complete snapshot; a refresh swaps in a new one without touching the
/// snapshots readers already hold.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<RecordStore>>,
}

impl SnapshotStore {
    pub fn new(initial: RecordStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<RecordStore> {
        Arc::clone(&self.current.read())
    }

    /// Installs `next` and returns the snapshot it replaced.
    pub fn replace(&self, next: RecordStore) -> Arc<RecordStore> {
        info!(
            "Refreshing snapshot: {} tables, {} records",
            next.table_count(),
            next.record_count()
        );
        let next = Arc::new(next);
        std::mem::replace(&mut *self.current.write(), next)
    }
}
