use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Selection store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened, migrated, read or written
    #[error("Selection storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    /// The stored record does not match the snapshot schema
    #[error("Malformed selection snapshot: {0}")]
    MalformedSnapshot(String),

    /// The snapshot could not be serialized
    #[error("Failed to encode selection snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

// ============================================================================
// Snapshot Schema
// ============================================================================

/// Current version of the persisted record layout.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Identity of one selected item: the pair of category and item names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectedItem {
    pub category_name: String,
    pub item_name: String,
}

impl SelectedItem {
    pub fn new(category_name: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            category_name: category_name.into(),
            item_name: item_name.into(),
        }
    }
}

/// Sparse persisted form of a selection: every selected `(category, item)` pair.
///
/// Carries no structure, colors or expansion state. Order is not significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub selected_items: Vec<SelectedItem>,
}

impl SelectionSnapshot {
    pub fn new(selected_items: Vec<SelectedItem>) -> Self {
        Self { selected_items }
    }

    pub fn is_empty(&self) -> bool {
        self.selected_items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected_items.len()
    }

    /// Borrowed set view of the pairs, for membership checks and
    /// order-independent comparison.
    pub fn pairs(&self) -> HashSet<(&str, &str)> {
        self.selected_items
            .iter()
            .map(|s| (s.category_name.as_str(), s.item_name.as_str()))
            .collect()
    }

    /// Serialize to the versioned JSON record stored under the fixed key.
    pub(crate) fn encode(&self) -> Result<String, StoreError> {
        let record = SnapshotRecordRef {
            version: SNAPSHOT_VERSION,
            selected_items: &self.selected_items,
        };
        serde_json::to_string(&record).map_err(StoreError::Encode)
    }

    /// Parse and validate a stored record.
    ///
    /// A record without `version` is the unversioned legacy layout and reads as
    /// version 1. Newer versions and wrong shapes are rejected. Names are not
    /// checked here: a pair the catalog cannot contain is dropped on restore.
    pub(crate) fn decode(raw: &str) -> Result<Self, StoreError> {
        let record: SnapshotRecord = serde_json::from_str(raw)
            .map_err(|e| StoreError::MalformedSnapshot(e.to_string()))?;

        if record.version == 0 || record.version > SNAPSHOT_VERSION {
            return Err(StoreError::MalformedSnapshot(format!(
                "unsupported snapshot version {}",
                record.version
            )));
        }

        Ok(Self {
            selected_items: record.selected_items,
        })
    }
}

fn legacy_version() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    #[serde(default = "legacy_version")]
    version: u32,
    selected_items: Vec<SelectedItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecordRef<'a> {
    version: u32,
    selected_items: &'a [SelectedItem],
}
