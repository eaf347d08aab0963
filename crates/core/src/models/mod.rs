//! Shared domain models.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Optional point-cost upgrade offered by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enhancement {
    /// Display name, also the selection key inside an army entry.
    pub name: String,
    /// Cost added once when selected.
    pub points: u32,
}

impl Enhancement {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, points: u32) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Label used by list views, e.g. `Power Sword (10 pts)`.
    pub fn label(&self) -> String {
        format!("{} ({} pts)", self.name, self.points)
    }
}

/// A unit owned by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    /// Identifier assigned by the collection store.
    pub id: u64,
    /// Unit name.
    pub name: String,
    /// Free-form faction label.
    #[serde(default)]
    pub faction: String,
    /// Cost of a single model before enhancements.
    pub base_points: u32,
    /// Whether the unit is painted.
    #[serde(default)]
    pub painted: bool,
    /// Free text notes.
    #[serde(default)]
    pub notes: String,
    /// Upgrades available to this unit.
    #[serde(default)]
    pub enhancements: Vec<Enhancement>,
}

impl CollectionItem {
    /// Build an item from a validated draft.
    pub fn from_draft(id: u64, draft: ItemDraft) -> Self {
        Self {
            id,
            name: draft.name,
            faction: draft.faction,
            base_points: draft.base_points,
            painted: draft.painted,
            notes: draft.notes,
            enhancements: draft.enhancements,
        }
    }

    /// Overwrite every mutable field with the draft's values.
    pub fn apply(&mut self, draft: ItemDraft) {
        self.name = draft.name;
        self.faction = draft.faction;
        self.base_points = draft.base_points;
        self.painted = draft.painted;
        self.notes = draft.notes;
        self.enhancements = draft.enhancements;
    }

    /// Draft pre-filled with this item's current values, for edit forms.
    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.name.clone(),
            faction: self.faction.clone(),
            base_points: self.base_points,
            painted: self.painted,
            notes: self.notes.clone(),
            enhancements: self.enhancements.clone(),
        }
    }

    /// Short painted-status badge.
    pub fn painted_label(&self) -> &'static str {
        if self.painted {
            "Painted"
        } else {
            "Unpainted"
        }
    }
}

/// Mutable fields of a [`CollectionItem`], as entered in the add/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    /// Unit name, required.
    pub name: String,
    /// Faction label.
    pub faction: String,
    /// Cost of a single model.
    pub base_points: u32,
    /// Painted flag.
    pub painted: bool,
    /// Free text notes.
    pub notes: String,
    /// Upgrades, with names unique within the unit.
    pub enhancements: Vec<Enhancement>,
}

impl ItemDraft {
    /// Draft with the given name and points and everything else empty.
    pub fn new(name: impl Into<String>, base_points: u32) -> Self {
        Self {
            name: name.into(),
            base_points,
            ..Self::default()
        }
    }

    /// Check the draft and return it with text fields trimmed. Enhancement
    /// names select enhancements inside army entries, so they must be unique.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        self.faction = self.faction.trim().to_string();
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let mut seen = HashSet::new();
        for enhancement in &mut self.enhancements {
            enhancement.name = enhancement.name.trim().to_string();
            if enhancement.name.is_empty() {
                return Err(ValidationError::EmptyEnhancementName);
            }
            if !seen.insert(enhancement.name.clone()) {
                return Err(ValidationError::DuplicateEnhancement(
                    enhancement.name.clone(),
                ));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_camel_case_with_missing_optionals() {
        let item: CollectionItem = serde_json::from_value(json!({
            "id": 7,
            "name": "Tactical Squad",
            "basePoints": 90
        }))
        .unwrap();
        assert_eq!(item.base_points, 90);
        assert!(item.faction.is_empty());
        assert!(!item.painted);
        assert!(item.enhancements.is_empty());

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["basePoints"], json!(90));
    }

    #[test]
    fn validate_trims_and_rejects_blank_names() {
        let draft = ItemDraft {
            name: "  Captain ".to_string(),
            faction: " Space Marines".to_string(),
            enhancements: vec![Enhancement::new(" Power Sword ", 10)],
            ..ItemDraft::default()
        };
        let draft = draft.validate().unwrap();
        assert_eq!(draft.name, "Captain");
        assert_eq!(draft.faction, "Space Marines");
        assert_eq!(draft.enhancements[0].name, "Power Sword");

        assert_eq!(
            ItemDraft::new("   ", 10).validate(),
            Err(ValidationError::EmptyName)
        );
        let blank_enhancement = ItemDraft {
            enhancements: vec![Enhancement::new("", 5)],
            ..ItemDraft::new("Captain", 100)
        };
        assert_eq!(
            blank_enhancement.validate(),
            Err(ValidationError::EmptyEnhancementName)
        );
    }

    #[test]
    fn validate_rejects_repeated_enhancement_names() {
        let draft = ItemDraft {
            enhancements: vec![Enhancement::new("Sword", 10), Enhancement::new(" Sword ", 15)],
            ..ItemDraft::new("Captain", 100)
        };
        assert_eq!(
            draft.validate(),
            Err(ValidationError::DuplicateEnhancement("Sword".to_string()))
        );

        let distinct = ItemDraft {
            enhancements: vec![Enhancement::new("Sword", 10), Enhancement::new("Shield", 15)],
            ..ItemDraft::new("Captain", 100)
        };
        assert!(distinct.validate().is_ok());
    }
}
