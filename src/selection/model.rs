use std::collections::HashSet;

use thiserror::Error;

use super::summary::{SelectionSummary, TriState};
use crate::catalog::{Catalog, Category};
use crate::storage::{SelectedItem, SelectionSnapshot};

// ============================================================================
// Error Types
// ============================================================================

/// A mutation named something the catalog does not contain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("Unknown item '{item}' in category '{category}'")]
    UnknownItem { category: String, item: String },
}

/// Outcome of applying a stored snapshot to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Items selected from the snapshot.
    pub applied: usize,
    /// Snapshot pairs naming a category or item the catalog no longer has.
    pub ignored: Vec<SelectedItem>,
}

// ============================================================================
// SelectionModel
// ============================================================================

/// In-memory selection state over a [`Catalog`].
///
/// Item flags are authoritative. Category flags and the [`SelectionSummary`]
/// are re-derived at the end of every mutation, so they cannot drift.
/// Mutations that affect selection return whether any item flag changed.
#[derive(Debug, Clone)]
pub struct SelectionModel {
    catalog: Catalog,
    summary: SelectionSummary,
}

impl SelectionModel {
    pub fn new(catalog: Catalog) -> Self {
        let summary = SelectionSummary::compute(catalog.categories());
        Self { catalog, summary }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn categories(&self) -> &[Category] {
        self.catalog.categories()
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.catalog.category(name)
    }

    /// The expanded category, if any.
    pub fn expanded(&self) -> Option<&Category> {
        self.categories().iter().find(|c| c.is_expanded())
    }

    pub fn summary(&self) -> &SelectionSummary {
        &self.summary
    }

    /// State of the global "select all" control.
    pub fn state(&self) -> TriState {
        self.summary.state()
    }

    pub fn is_select_all(&self) -> bool {
        self.summary.is_select_all()
    }

    pub fn is_indeterminate(&self) -> bool {
        self.summary.is_indeterminate()
    }

    pub fn selected_summary(&self) -> String {
        self.summary.to_string()
    }

    pub fn is_any_selected(&self) -> bool {
        self.summary.items_selected > 0
    }

    pub fn is_none_selected(&self) -> bool {
        self.summary.items_selected == 0
    }

    /// Every selected `(category, item)` pair, in catalog order.
    pub fn snapshot(&self) -> SelectionSnapshot {
        let selected_items = self
            .categories()
            .iter()
            .flat_map(|c| {
                c.items()
                    .iter()
                    .filter(|i| i.is_selected())
                    .map(move |i| SelectedItem::new(c.name(), i.name()))
            })
            .collect();
        SelectionSnapshot::new(selected_items)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn select_all(&mut self) -> bool {
        self.set_select_all(true)
    }

    pub fn clear_all(&mut self) -> bool {
        self.set_select_all(false)
    }

    /// Drive every category and item from the aggregate control.
    pub fn set_select_all(&mut self, checked: bool) -> bool {
        let changed = self
            .categories()
            .iter()
            .any(|c| c.items().iter().any(|i| i.is_selected() != checked));

        for category in self.catalog.categories_mut() {
            category.set_all(checked);
        }
        self.refresh();
        changed
    }

    /// Flip the category checkbox and push the new value down to its items.
    ///
    /// A partially selected category is unchecked, so toggling it selects
    /// every item.
    pub fn toggle_category(&mut self, name: &str) -> Result<bool, SelectionError> {
        let checked = !self
            .category(name)
            .ok_or_else(|| SelectionError::UnknownCategory(name.to_string()))?
            .is_selected();
        self.set_category(name, checked)
    }

    /// Set the category checkbox to `checked` and push it down to its items.
    pub fn set_category(&mut self, name: &str, checked: bool) -> Result<bool, SelectionError> {
        let category = self
            .catalog
            .category_mut(name)
            .ok_or_else(|| SelectionError::UnknownCategory(name.to_string()))?;

        let changed = category.items().iter().any(|i| i.is_selected() != checked);
        category.set_all(checked);
        self.refresh();
        Ok(changed)
    }

    /// Flip one item; its category and the global aggregates follow.
    pub fn toggle_item(&mut self, category: &str, item: &str) -> Result<bool, SelectionError> {
        let owner = self
            .catalog
            .category_mut(category)
            .ok_or_else(|| SelectionError::UnknownCategory(category.to_string()))?;
        let target = owner
            .item_mut(item)
            .ok_or_else(|| SelectionError::UnknownItem {
                category: category.to_string(),
                item: item.to_string(),
            })?;

        let selected = !target.is_selected();
        target.set_selected(selected);
        owner.refresh_selected();
        self.summary = SelectionSummary::compute(self.catalog.categories());
        Ok(true)
    }

    /// Collapse `name` if it is expanded, otherwise expand it and collapse
    /// every other category. Selection is untouched.
    pub fn toggle_expansion(&mut self, name: &str) -> Result<(), SelectionError> {
        if self.category(name).is_none() {
            return Err(SelectionError::UnknownCategory(name.to_string()));
        }

        for category in self.catalog.categories_mut() {
            if category.name() == name {
                let expanded = !category.is_expanded();
                category.set_expanded(expanded);
            } else {
                category.set_expanded(false);
            }
        }
        Ok(())
    }

    /// Overwrite every item flag from a stored snapshot.
    ///
    /// An item ends up selected iff its pair is in the snapshot; defaults are
    /// not merged in. Pairs the catalog does not know are reported, not applied.
    pub fn restore(&mut self, snapshot: &SelectionSnapshot) -> RestoreReport {
        let pairs = snapshot.pairs();
        let mut report = RestoreReport::default();

        for category in self.catalog.categories_mut() {
            let category_name = category.name().to_string();
            for item in category.items_mut() {
                let selected = pairs.contains(&(category_name.as_str(), item.name()));
                item.set_selected(selected);
                report.applied += usize::from(selected);
            }
        }

        let mut seen = HashSet::new();
        for entry in &snapshot.selected_items {
            let known = self
                .category(&entry.category_name)
                .and_then(|c| c.item(&entry.item_name))
                .is_some();
            if !known && seen.insert(entry) {
                report.ignored.push(entry.clone());
            }
        }

        self.refresh();
        report
    }

    fn refresh(&mut self) {
        for category in self.catalog.categories_mut() {
            category.refresh_selected();
        }
        self.summary = SelectionSummary::compute(self.catalog.categories());
    }
}
