use std::{cmp::Ordering, fmt};

use crate::models::CollectionItem;

/// Ordering applied to the collection list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Order in which items were added.
    #[default]
    Insertion,
    /// Alphabetical by name.
    Name,
    /// Alphabetical by faction, then name.
    Faction,
    /// Most expensive first.
    Points,
}

impl SortKey {
    /// Next key in the cycle used by the list view.
    pub fn next(self) -> Self {
        match self {
            Self::Insertion => Self::Name,
            Self::Name => Self::Faction,
            Self::Faction => Self::Points,
            Self::Points => Self::Insertion,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Insertion => "added",
            Self::Name => "name",
            Self::Faction => "faction",
            Self::Points => "points",
        };
        f.write_str(label)
    }
}

/// Search, filter and sort settings for the collection list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    /// Case-insensitive substring matched against item names.
    pub search: String,
    /// Only keep items of this faction (case-insensitive).
    pub faction: Option<String>,
    /// Only keep painted items.
    pub painted_only: bool,
    /// Ordering of the result.
    pub sort: SortKey,
}

impl CollectionQuery {
    /// Whether `item` passes every active filter.
    pub fn matches(&self, item: &CollectionItem) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() && !item.name.to_lowercase().contains(&needle) {
            return false;
        }
        if let Some(faction) = self.faction.as_deref() {
            if !item.faction.eq_ignore_ascii_case(faction) {
                return false;
            }
        }
        !self.painted_only || item.painted
    }

    /// Filter and order `items`. Sorting is stable, so ties keep insertion
    /// order.
    pub fn apply<'a>(&self, items: &'a [CollectionItem]) -> Vec<&'a CollectionItem> {
        let mut selected: Vec<&CollectionItem> =
            items.iter().filter(|item| self.matches(item)).collect();
        match self.sort {
            SortKey::Insertion => {}
            SortKey::Name => selected.sort_by(|a, b| compare_text(&a.name, &b.name)),
            SortKey::Faction => selected.sort_by(|a, b| {
                compare_text(&a.faction, &b.faction).then_with(|| compare_text(&a.name, &b.name))
            }),
            SortKey::Points => selected.sort_by(|a, b| b.base_points.cmp(&a.base_points)),
        }
        selected
    }

    /// True when no filter narrows the list.
    pub fn is_unfiltered(&self) -> bool {
        self.search.trim().is_empty() && self.faction.is_none() && !self.painted_only
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
