use serde::{Deserialize, Serialize};

use crate::models::{CollectionItem, Enhancement};

fn default_model_count() -> u32 {
    1
}

/// A unit placed into the army list.
///
/// Entries are snapshots: the collection fields are copied when the unit is
/// added, so later edits to (or removal of) the collection item leave the
/// entry untouched. `id` is the source item's id and may repeat within a
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmyEntry {
    /// Id of the collection item this entry was copied from.
    pub id: u64,
    /// Unit name.
    pub name: String,
    /// Faction label.
    #[serde(default)]
    pub faction: String,
    /// Cost of a single model.
    pub base_points: u32,
    /// Painted flag at add time.
    #[serde(default)]
    pub painted: bool,
    /// Notes at add time.
    #[serde(default)]
    pub notes: String,
    /// Enhancements the unit offers.
    #[serde(default)]
    pub enhancements: Vec<Enhancement>,
    /// Number of models, at least one.
    #[serde(default = "default_model_count")]
    pub model_count: u32,
    /// Names of the selected enhancements, without duplicates.
    #[serde(default)]
    pub selected_enhancements: Vec<String>,
}

impl ArmyEntry {
    /// Snapshot `item` with one model and nothing selected.
    pub fn snapshot(item: &CollectionItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            faction: item.faction.clone(),
            base_points: item.base_points,
            painted: item.painted,
            notes: item.notes.clone(),
            enhancements: item.enhancements.clone(),
            model_count: 1,
            selected_enhancements: Vec::new(),
        }
    }

    /// Whether `name` is one of this entry's enhancements.
    pub fn offers(&self, name: &str) -> bool {
        self.enhancements.iter().any(|enhancement| enhancement.name == name)
    }

    /// Whether enhancement `name` is selected.
    pub fn is_selected(&self, name: &str) -> bool {
        self.selected_enhancements.iter().any(|selected| selected == name)
    }

    /// Enhancements currently selected, in the order the unit lists them.
    pub fn selected(&self) -> impl Iterator<Item = &Enhancement> + '_ {
        self.enhancements
            .iter()
            .filter(move |enhancement| self.is_selected(&enhancement.name))
    }

    /// Flip the selection of `name` and return whether it is now selected.
    /// The caller checks that the enhancement is offered.
    pub(crate) fn toggle(&mut self, name: &str) -> bool {
        if self.is_selected(name) {
            self.selected_enhancements.retain(|selected| selected != name);
            false
        } else {
            self.selected_enhancements.push(name.to_string());
            true
        }
    }

    /// Point cost of this entry. See [`compute_total`].
    pub fn total(&self) -> u64 {
        compute_total(self)
    }

    /// Clamp a zero model count to one and drop duplicate or unknown
    /// selections. Returns true when anything changed.
    pub(crate) fn normalize(&mut self) -> bool {
        let mut changed = false;
        if self.model_count == 0 {
            self.model_count = 1;
            changed = true;
        }
        let stored = std::mem::take(&mut self.selected_enhancements);
        for name in stored {
            if self.offers(&name) && !self.is_selected(&name) {
                self.selected_enhancements.push(name);
            } else {
                changed = true;
            }
        }
        changed
    }
}

/// `base_points * model_count` plus the points of each selected
/// enhancement, counted once regardless of model count.
pub fn compute_total(entry: &ArmyEntry) -> u64 {
    let models = u64::from(entry.base_points) * u64::from(entry.model_count);
    let enhancements: u64 = entry
        .selected()
        .map(|enhancement| u64::from(enhancement.points))
        .sum();
    models + enhancements
}

/// Sum of [`compute_total`] over `entries`.
pub fn compute_grand_total(entries: &[ArmyEntry]) -> u64 {
    entries.iter().map(compute_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn captain() -> CollectionItem {
        CollectionItem {
            id: 1,
            name: "Space Marine Captain".to_string(),
            faction: "Space Marines".to_string(),
            base_points: 100,
            painted: true,
            notes: "HQ".to_string(),
            enhancements: vec![
                Enhancement::new("Power Sword", 10),
                Enhancement::new("Storm Shield", 15),
            ],
        }
    }

    #[test]
    fn enhancement_points_are_not_multiplied() {
        let mut entry = ArmyEntry::snapshot(&captain());
        assert_eq!(entry.total(), 100);

        entry.model_count = 2;
        assert!(entry.toggle("Power Sword"));
        assert_eq!(compute_total(&entry), 210);

        assert!(entry.toggle("Storm Shield"));
        assert_eq!(compute_total(&entry), 225);
        assert!(!entry.toggle("Power Sword"));
        assert_eq!(compute_total(&entry), 215);
    }

    #[test]
    fn stored_entry_without_selections() {
        let entry: ArmyEntry = serde_json::from_value(json!({
            "id": 1,
            "name": "Test Unit",
            "faction": "Test Faction",
            "basePoints": 100,
            "painted": true,
            "notes": "Test",
            "enhancements": [],
            "modelCount": 3,
            "selectedEnhancements": []
        }))
        .unwrap();
        assert_eq!(compute_total(&entry), 300);
    }

    #[test]
    fn selections_without_a_matching_enhancement_cost_nothing() {
        let mut entry = ArmyEntry::snapshot(&captain());
        entry.selected_enhancements = vec!["Relic Blade".to_string()];
        assert_eq!(entry.total(), 100);
    }

    #[test]
    fn large_values_do_not_overflow() {
        let mut entry = ArmyEntry::snapshot(&captain());
        entry.base_points = u32::MAX;
        entry.model_count = u32::MAX;
        assert_eq!(entry.total(), u64::from(u32::MAX) * u64::from(u32::MAX));
    }

    #[test]
    fn normalize_repairs_stored_values() {
        let mut entry = ArmyEntry::snapshot(&captain());
        entry.model_count = 0;
        entry.selected_enhancements = vec![
            "Power Sword".to_string(),
            "Power Sword".to_string(),
            "Relic Blade".to_string(),
        ];
        assert!(entry.normalize());
        assert_eq!(entry.model_count, 1);
        assert_eq!(entry.selected_enhancements, vec!["Power Sword"]);
        assert_eq!(entry.total(), 110);
        assert!(!entry.normalize());
    }

    #[test]
    fn grand_total_sums_entries() {
        let mut first = ArmyEntry::snapshot(&captain());
        first.model_count = 2;
        first.toggle("Power Sword");
        let mut second = ArmyEntry::snapshot(&captain());
        second.base_points = 90;
        assert_eq!(compute_grand_total(&[first, second]), 300);
        assert_eq!(compute_grand_total(&[]), 0);
    }
}
