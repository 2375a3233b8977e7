use std::fmt;

use crate::catalog::Category;

/// Display state of a checkbox that aggregates several leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    Unchecked,
    Indeterminate,
    Checked,
}

impl TriState {
    /// State of a control over `total` leaves of which `selected` are checked.
    ///
    /// Zero leaves reads as `Unchecked`: "all of nothing" is never shown as checked.
    pub fn from_counts(selected: usize, total: usize) -> Self {
        if selected == 0 || total == 0 {
            TriState::Unchecked
        } else if selected >= total {
            TriState::Checked
        } else {
            TriState::Indeterminate
        }
    }

    /// Checkbox marker used by text renderers.
    pub fn marker(self) -> &'static str {
        match self {
            TriState::Unchecked => "[ ]",
            TriState::Indeterminate => "[-]",
            TriState::Checked => "[x]",
        }
    }
}

/// Counts derived from the catalog after every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    /// Categories with at least one selected item.
    pub categories_selected: usize,
    /// Selected items across all categories.
    pub items_selected: usize,
    /// All items across all categories.
    pub total_items: usize,
}

impl SelectionSummary {
    pub fn compute(categories: &[Category]) -> Self {
        let mut summary = Self::default();
        for category in categories {
            let selected = category.selected_count();
            summary.total_items += category.items().len();
            if selected > 0 {
                summary.categories_selected += 1;
                summary.items_selected += selected;
            }
        }
        summary
    }

    pub fn state(&self) -> TriState {
        TriState::from_counts(self.items_selected, self.total_items)
    }

    pub fn is_select_all(&self) -> bool {
        self.state() == TriState::Checked
    }

    pub fn is_indeterminate(&self) -> bool {
        self.state() == TriState::Indeterminate
    }
}

impl fmt::Display for SelectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Selected: {} categories, {} items",
            self.categories_selected, self.items_selected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Item;
    use proptest::prelude::*;

    #[test]
    fn test_from_counts() {
        assert_eq!(TriState::from_counts(0, 5), TriState::Unchecked);
        assert_eq!(TriState::from_counts(3, 5), TriState::Indeterminate);
        assert_eq!(TriState::from_counts(5, 5), TriState::Checked);
        assert_eq!(TriState::from_counts(0, 0), TriState::Unchecked);
    }

    #[test]
    fn test_compute_counts_only_touched_categories() {
        let categories = vec![
            Category::new(
                "A",
                vec![Item::new("1", "").selected(true), Item::new("2", "")],
            ),
            Category::new("B", vec![Item::new("1", ""), Item::new("2", "")]),
            Category::new("C", vec![Item::new("1", "").selected(true)]),
        ];

        let summary = SelectionSummary::compute(&categories);
        assert_eq!(summary.categories_selected, 2);
        assert_eq!(summary.items_selected, 2);
        assert_eq!(summary.total_items, 5);
        assert!(summary.is_indeterminate());
        assert!(!summary.is_select_all());
    }

    #[test]
    fn test_display() {
        let summary = SelectionSummary {
            categories_selected: 1,
            items_selected: 3,
            total_items: 5,
        };
        assert_eq!(summary.to_string(), "Selected: 1 categories, 3 items");
    }

    proptest! {
        #[test]
        fn tri_state_is_exclusive_and_exhaustive(total in 1usize..50, pick in 0usize..50) {
            let selected = pick % (total + 1);
            let summary = SelectionSummary {
                categories_selected: 0,
                items_selected: selected,
                total_items: total,
            };

            let none = selected == 0;
            let all = summary.is_select_all();
            let partial = summary.is_indeterminate();

            prop_assert_eq!(all, selected == total);
            prop_assert_eq!(partial, 0 < selected && selected < total);
            prop_assert_eq!([none, partial, all].iter().filter(|b| **b).count(), 1);
        }
    }
}
