//! Tri-state selection over a catalog.
//!
//! - [`SelectionModel`]: synchronous state, mutations and derived aggregates
//! - [`SelectionStateManager`]: the model plus load-on-start and write-behind persistence
//! - [`SelectionSummary`] / [`TriState`]: the derived counts and checkbox states

mod manager;
mod model;
mod summary;

pub use manager::{PersistenceHealth, SelectionStateManager};
pub use model::{RestoreReport, SelectionError, SelectionModel};
pub use summary::{SelectionSummary, TriState};
