mod schema;
mod snapshot;
mod types;

use std::future::Future;

pub use schema::{SelectionStore, DEFAULT_DATABASE_FILE, RECORD_KEY};
pub use types::{SelectedItem, SelectionSnapshot, StoreError, SNAPSHOT_VERSION};

/// Durable storage of exactly one selection snapshot.
///
/// Every operation initializes the store on first use, so callers never have
/// to sequence [`initialize`](SnapshotStore::initialize) themselves.
pub trait SnapshotStore: Clone + Send + Sync + 'static {
    /// Establish the storage handle. Idempotent and safe under concurrent callers.
    fn initialize(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace the stored snapshot.
    fn save(&self, snapshot: &SelectionSnapshot)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read the stored snapshot; an empty snapshot reads as `None`.
    fn load(&self) -> impl Future<Output = Result<Option<SelectionSnapshot>, StoreError>> + Send;

    /// Remove the stored snapshot. No-op before initialization.
    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl SnapshotStore for SelectionStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        SelectionStore::initialize(self).await.map(|_| ())
    }

    async fn save(&self, snapshot: &SelectionSnapshot) -> Result<(), StoreError> {
        SelectionStore::save(self, snapshot).await
    }

    async fn load(&self) -> Result<Option<SelectionSnapshot>, StoreError> {
        SelectionStore::load(self).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        SelectionStore::clear(self).await
    }
}
