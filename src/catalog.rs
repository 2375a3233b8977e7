//! The fixed category/item structure a selection is made over.
//!
//! Structure is validated once, when the catalog is built. After that the only
//! things that change are the selection flags (through
//! [`SelectionModel`](crate::SelectionModel)) and the expansion flag.
use std::borrow::Cow;
use std::collections::HashSet;

use thiserror::Error;

use crate::config::CategoryConfig;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog must contain at least one category")]
    Empty,

    #[error("Category name cannot be empty or whitespace-only")]
    BlankCategoryName,

    #[error("Item name in category '{0}' cannot be empty or whitespace-only")]
    BlankItemName(String),

    #[error("Duplicate category '{0}'")]
    DuplicateCategory(String),

    #[error("Duplicate item '{item}' in category '{category}'")]
    DuplicateItem { category: String, item: String },

    #[error("Category '{0}' has no items")]
    EmptyCategory(String),
}

// ============================================================================
// Data Structures
// ============================================================================

/// A selectable leaf. `selected` is the authoritative selection flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    name: String,
    selected: bool,
    color: String,
}

impl Item {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selected: false,
            color: color.into(),
        }
    }

    /// Builder-style default selection flag.
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Opaque display attribute, passed through untouched.
    pub fn color(&self) -> &str {
        &self.color
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// A group of items. `selected` is derived: true iff every item is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    selected: bool,
    is_expanded: bool,
    items: Vec<Item>,
}

impl Category {
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Self {
        let mut category = Self {
            name: name.into(),
            selected: false,
            is_expanded: false,
            items,
        };
        category.refresh_selected();
        category
    }

    /// Builder-style initial expansion flag.
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.is_expanded = expanded;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|i| i.selected).count()
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub(crate) fn item_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.name == name)
    }

    /// Set this category and every item in it.
    pub(crate) fn set_all(&mut self, selected: bool) {
        for item in &mut self.items {
            item.selected = selected;
        }
        self.selected = selected;
    }

    /// Re-derive `selected` from the items.
    pub(crate) fn refresh_selected(&mut self) {
        self.selected = self.items.iter().all(|i| i.selected);
    }

    pub(crate) fn set_expanded(&mut self, expanded: bool) {
        self.is_expanded = expanded;
    }
}

/// Ordered, validated list of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    /// Validate and build a catalog.
    ///
    /// Names have control characters stripped and surrounding whitespace
    /// trimmed. If more than one category is flagged expanded, the first one
    /// keeps the flag.
    ///
    /// # Errors
    ///
    /// Rejects an empty catalog, blank names, duplicate names and categories
    /// without items.
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        if categories.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen_categories = HashSet::new();
        let mut expanded_seen = false;
        let mut cleaned = Vec::with_capacity(categories.len());

        for mut category in categories {
            category.name = clean_name(&category.name).ok_or(CatalogError::BlankCategoryName)?;
            if !seen_categories.insert(category.name.clone()) {
                return Err(CatalogError::DuplicateCategory(category.name));
            }
            if category.items.is_empty() {
                return Err(CatalogError::EmptyCategory(category.name));
            }

            let mut seen_items = HashSet::new();
            for item in &mut category.items {
                item.name = clean_name(&item.name)
                    .ok_or_else(|| CatalogError::BlankItemName(category.name.clone()))?;
                if !seen_items.insert(item.name.clone()) {
                    return Err(CatalogError::DuplicateItem {
                        category: category.name.clone(),
                        item: item.name.clone(),
                    });
                }
            }

            if category.is_expanded {
                if expanded_seen {
                    tracing::warn!(
                        category = %category.name,
                        "More than one category marked expanded, collapsing"
                    );
                    category.is_expanded = false;
                }
                expanded_seen = true;
            }

            category.refresh_selected();
            cleaned.push(category);
        }

        Ok(Self {
            categories: cleaned,
        })
    }

    /// The default pipeline catalog: "Sales" stages selected and expanded,
    /// everything else unselected.
    pub fn builtin() -> Self {
        let categories = vec![
            Category::new(
                "Sales",
                vec![
                    Item::new("Unsorted", "#99CCFD").selected(true),
                    Item::new("Negotiation", "#FFFF99").selected(true),
                    Item::new("Decision pending", "#FFCC66").selected(true),
                    Item::new("Won", "#CCFF66").selected(true),
                ],
            )
            .expanded(true),
            Category::new(
                "Staff",
                vec![Item::new("HR", "#CCFF66"), Item::new("Interview", "#FFFF99")],
            ),
            Category::new(
                "Partners",
                vec![Item::new("Names", "#CCFF66"), Item::new("Contacts", "#FFFF99")],
            ),
            Category::new(
                "Event",
                vec![Item::new("Names", "#FFFF99"), Item::new("Dates", "#CCFF66")],
            ),
            Category::new(
                "Inbound requests",
                vec![Item::new("Resolutions", "#CCFF66"), Item::new("Won", "#99CCFD")],
            ),
        ];

        Self { categories }
    }

    /// Build from the `[[categories]]` tables of the config file.
    pub fn from_config(categories: &[CategoryConfig]) -> Result<Self, CatalogError> {
        let categories = categories
            .iter()
            .map(|c| {
                let items = c
                    .items
                    .iter()
                    .map(|i| Item::new(&i.name, &i.color).selected(i.selected))
                    .collect();
                Category::new(&c.name, items).expanded(c.expanded)
            })
            .collect();
        Self::new(categories)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn total_items(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    pub(crate) fn categories_mut(&mut self) -> &mut [Category] {
        &mut self.categories
    }

    pub(crate) fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }
}

/// Strip control characters (terminal escape injection) and trim; `None` if
/// nothing is left.
fn clean_name(name: &str) -> Option<String> {
    let stripped: Cow<'_, str> = if name.chars().any(char::is_control) {
        Cow::Owned(name.chars().filter(|c| !c.is_control()).collect())
    } else {
        Cow::Borrowed(name)
    };
    let trimmed = stripped.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryConfig, ItemConfig};

    fn two_items() -> Vec<Item> {
        vec![Item::new("a", "#fff"), Item::new("b", "#000")]
    }

    #[test]
    fn test_builtin_is_valid() {
        let builtin = Catalog::builtin();
        let validated = Catalog::new(builtin.categories().to_vec()).unwrap();
        assert_eq!(validated, builtin);
        assert_eq!(builtin.categories().len(), 5);
        assert_eq!(builtin.total_items(), 12);
    }

    #[test]
    fn test_builtin_defaults() {
        let catalog = Catalog::builtin();
        let sales = catalog.category("Sales").unwrap();
        assert!(sales.is_selected());
        assert!(sales.is_expanded());
        assert_eq!(sales.selected_count(), 4);

        let staff = catalog.category("Staff").unwrap();
        assert!(!staff.is_selected());
        assert!(!staff.is_expanded());
        assert_eq!(staff.item("HR").unwrap().color(), "#CCFF66");
    }

    #[test]
    fn test_category_selected_is_derived_from_items() {
        let partial = Category::new(
            "p",
            vec![Item::new("a", "").selected(true), Item::new("b", "")],
        );
        assert!(!partial.is_selected());

        let full = Category::new(
            "f",
            vec![Item::new("a", "").selected(true), Item::new("b", "").selected(true)],
        );
        assert!(full.is_selected());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert_eq!(Catalog::new(vec![]), Err(CatalogError::Empty));
    }

    #[test]
    fn test_empty_category_rejected() {
        let err = Catalog::new(vec![Category::new("Lonely", vec![])]).unwrap_err();
        assert_eq!(err, CatalogError::EmptyCategory("Lonely".to_string()));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let err = Catalog::new(vec![
            Category::new("Sales", two_items()),
            Category::new(" Sales ", two_items()),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateCategory("Sales".to_string()));
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let err = Catalog::new(vec![Category::new(
            "Sales",
            vec![Item::new("Won", ""), Item::new("Won", "")],
        )])
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateItem {
                category: "Sales".to_string(),
                item: "Won".to_string()
            }
        );
    }

    #[test]
    fn test_same_item_name_in_different_categories_allowed() {
        let catalog = Catalog::new(vec![
            Category::new("Partners", vec![Item::new("Names", "")]),
            Category::new("Event", vec![Item::new("Names", "")]),
        ]);
        assert!(catalog.is_ok());
    }

    #[test]
    fn test_names_sanitized() {
        let catalog = Catalog::new(vec![Category::new(
            "  Sa\x1bles\n ",
            vec![Item::new("\tWon\x07", "")],
        )])
        .unwrap();
        let category = &catalog.categories()[0];
        assert_eq!(category.name(), "Sales");
        assert_eq!(category.items()[0].name(), "Won");
    }

    #[test]
    fn test_blank_names_rejected() {
        assert_eq!(
            Catalog::new(vec![Category::new("  ", two_items())]),
            Err(CatalogError::BlankCategoryName)
        );
        assert_eq!(
            Catalog::new(vec![Category::new("Sales", vec![Item::new("\x1b", "")])]),
            Err(CatalogError::BlankItemName("Sales".to_string()))
        );
    }

    #[test]
    fn test_multiple_expanded_keeps_first() {
        let catalog = Catalog::new(vec![
            Category::new("A", two_items()).expanded(true),
            Category::new("B", two_items()).expanded(true),
            Category::new("C", two_items()),
        ])
        .unwrap();
        let expanded: Vec<_> = catalog
            .categories()
            .iter()
            .filter(|c| c.is_expanded())
            .map(Category::name)
            .collect();
        assert_eq!(expanded, vec!["A"]);
    }

    #[test]
    fn test_from_config() {
        let config = vec![CategoryConfig {
            name: "Support".to_string(),
            expanded: true,
            items: vec![
                ItemConfig {
                    name: "Open".to_string(),
                    color: "#FF0000".to_string(),
                    selected: true,
                },
                ItemConfig {
                    name: "Closed".to_string(),
                    color: String::new(),
                    selected: false,
                },
            ],
        }];

        let catalog = Catalog::from_config(&config).unwrap();
        let support = catalog.category("Support").unwrap();
        assert!(support.is_expanded());
        assert!(!support.is_selected());
        assert!(support.item("Open").unwrap().is_selected());
        assert_eq!(support.item("Open").unwrap().color(), "#FF0000");
    }
}
