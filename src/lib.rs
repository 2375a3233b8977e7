//! Hierarchical tri-state multi-select state with persisted selections.
//!
//! A [`Catalog`] of categories, each holding selectable items, is wrapped by a
//! [`SelectionStateManager`] that keeps the derived aggregates (category flags,
//! select-all, indeterminate, summary) consistent and writes the selected
//! subset to a [`SelectionStore`] after every change.
//!
//! ```no_run
//! use select_list::{Catalog, SelectionStateManager, SelectionStore};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let store = SelectionStore::new("/tmp/selection.db");
//! let mut manager = SelectionStateManager::initialize(Catalog::builtin(), store).await;
//!
//! manager.toggle_item("Staff", "HR")?;
//! manager.flush().await;
//! println!("{}", manager.selected_summary());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod selection;
pub mod storage;

pub use catalog::{Catalog, CatalogError, Category, Item};
pub use selection::{
    PersistenceHealth, RestoreReport, SelectionError, SelectionModel, SelectionStateManager,
    SelectionSummary, TriState,
};
pub use storage::{SelectedItem, SelectionSnapshot, SelectionStore, SnapshotStore, StoreError};
