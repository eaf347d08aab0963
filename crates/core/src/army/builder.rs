use std::sync::Arc;

use tracing::{info, warn};

use super::entry::{compute_grand_total, compute_total, ArmyEntry};
use crate::{
    error::{Result, ValidationError},
    models::CollectionItem,
    storage::Storage,
};

/// Default storage key for the army list.
pub const DEFAULT_ARMY_KEY: &str = "wh40kArmyList";

/// Owns the army list and keeps it persisted.
///
/// Entries are addressed by their position in the list. Every successful
/// mutation rewrites the whole list under the army key; rejected or no-op
/// calls write nothing.
pub struct ArmyBuilder {
    storage: Arc<dyn Storage>,
    key: String,
    entries: Vec<ArmyEntry>,
}

impl ArmyBuilder {
    /// Load the army list stored under `key`. Absent or malformed data
    /// yields an empty list.
    pub fn load(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let entries = read_entries(storage.as_ref(), &key);
        info!(key = %key, total = entries.len(), "Army list loaded");
        Self {
            storage,
            key,
            entries,
        }
    }

    /// Storage key backing this list.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Entries in list order.
    pub fn entries(&self) -> &[ArmyEntry] {
        &self.entries
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&ArmyEntry> {
        self.entries.get(index)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Points for the whole list.
    pub fn grand_total(&self) -> u64 {
        compute_grand_total(&self.entries)
    }

    /// Append a snapshot of `item` and return its index. Adding the same
    /// item twice yields two independent entries.
    pub fn add_to_army(&mut self, item: &CollectionItem) -> Result<usize> {
        if item.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let mut next = self.entries.clone();
        next.push(ArmyEntry::snapshot(item));
        let index = next.len() - 1;
        self.commit(next)?;
        info!(index, id = item.id, name = %item.name, "Unit added to army");
        Ok(index)
    }

    /// Remove the entry at `index`. Out-of-range indices are ignored.
    pub fn remove_from_army(&mut self, index: usize) -> Result<Option<ArmyEntry>> {
        if index >= self.entries.len() {
            return Ok(None);
        }
        let mut next = self.entries.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!(index, name = %removed.name, "Unit removed from army");
        Ok(Some(removed))
    }

    /// Set the model count of the entry at `index` and return its new
    /// total. A zero count is rejected and the previous value kept.
    pub fn set_model_count(&mut self, index: usize, count: u32) -> Result<Option<u64>> {
        if count == 0 {
            return Err(ValidationError::InvalidModelCount(count.to_string()).into());
        }
        if index >= self.entries.len() {
            return Ok(None);
        }
        let mut next = self.entries.clone();
        next[index].model_count = count;
        let total = compute_total(&next[index]);
        self.commit(next)?;
        info!(index, count, total, "Model count updated");
        Ok(Some(total))
    }

    /// Flip enhancement `name` on the entry at `index` and return whether it
    /// is now selected. Names the entry does not offer are rejected.
    pub fn toggle_enhancement(&mut self, index: usize, name: &str) -> Result<Option<bool>> {
        let Some(entry) = self.entries.get(index) else {
            return Ok(None);
        };
        if !entry.offers(name) {
            return Err(ValidationError::UnknownEnhancement(name.to_string()).into());
        }
        let mut next = self.entries.clone();
        let selected = next[index].toggle(name);
        self.commit(next)?;
        info!(index, enhancement = name, selected, "Enhancement toggled");
        Ok(Some(selected))
    }

    /// Empty the list.
    pub fn clear(&mut self) -> Result<()> {
        self.commit(Vec::new())?;
        info!("Army list cleared");
        Ok(())
    }

    fn commit(&mut self, next: Vec<ArmyEntry>) -> Result<()> {
        let serialized = serde_json::to_string(&next)?;
        self.storage.set(&self.key, &serialized)?;
        self.entries = next;
        Ok(())
    }
}

fn read_entries(storage: &dyn Storage, key: &str) -> Vec<ArmyEntry> {
    let Some(raw) = storage.get(key) else {
        return Vec::new();
    };
    let mut entries: Vec<ArmyEntry> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(key, "Ignoring malformed army list: {err}");
            return Vec::new();
        }
    };
    for (index, entry) in entries.iter_mut().enumerate() {
        if entry.normalize() {
            warn!(key, index, name = %entry.name, "Repaired stored army entry");
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collection::{CollectionStore, DEFAULT_COLLECTION_KEY},
        error::Error,
        models::{Enhancement, ItemDraft},
        storage::{testing::FailingStorage, MemoryStorage},
    };

    fn captain_draft() -> ItemDraft {
        ItemDraft {
            faction: "Space Marines".to_string(),
            painted: true,
            notes: "HQ".to_string(),
            enhancements: vec![
                Enhancement::new("Power Sword", 10),
                Enhancement::new("Storm Shield", 15),
            ],
            ..ItemDraft::new("Space Marine Captain", 100)
        }
    }

    fn setup() -> (Arc<MemoryStorage>, CollectionStore, ArmyBuilder) {
        let storage = Arc::new(MemoryStorage::new());
        let collection = CollectionStore::load(storage.clone(), DEFAULT_COLLECTION_KEY);
        let army = ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY);
        (storage, collection, army)
    }

    #[test]
    fn captain_with_two_models_and_power_sword() -> Result<()> {
        let (_, mut collection, mut army) = setup();
        let captain = collection.add(captain_draft())?;

        let index = army.add_to_army(&captain)?;
        assert_eq!(army.set_model_count(index, 2)?, Some(200));
        assert_eq!(army.toggle_enhancement(index, "Power Sword")?, Some(true));
        assert_eq!(army.entries()[index].total(), 210);
        assert_eq!(army.grand_total(), 210);
        Ok(())
    }

    #[test]
    fn reload_returns_the_add_time_snapshot() -> Result<()> {
        let (storage, mut collection, mut army) = setup();
        let captain = collection.add(captain_draft())?;
        army.add_to_army(&captain)?;
        let snapshot = army.entries()[0].clone();

        collection.update(captain.id, ItemDraft::new("Renamed", 999))?;
        collection.remove(captain.id)?;

        let reloaded = ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY);
        assert_eq!(reloaded.entries(), &[snapshot]);
        assert_eq!(reloaded.entries()[0].name, "Space Marine Captain");
        assert_eq!(reloaded.entries()[0].model_count, 1);
        assert!(reloaded.entries()[0].selected_enhancements.is_empty());
        Ok(())
    }

    #[test]
    fn duplicate_adds_are_independent() -> Result<()> {
        let (_, mut collection, mut army) = setup();
        let captain = collection.add(captain_draft())?;
        let first = army.add_to_army(&captain)?;
        let second = army.add_to_army(&captain)?;
        assert_ne!(first, second);
        assert_eq!(army.entries()[first].id, army.entries()[second].id);

        army.toggle_enhancement(second, "Storm Shield")?;
        army.set_model_count(second, 3)?;
        assert_eq!(army.entries()[first].total(), 100);
        assert!(army.entries()[first].selected_enhancements.is_empty());
        assert_eq!(army.entries()[second].total(), 315);
        assert_eq!(army.grand_total(), 415);
        Ok(())
    }

    #[test]
    fn missing_entries_are_no_ops_without_writes() -> Result<()> {
        let (storage, mut collection, mut army) = setup();
        let captain = collection.add(captain_draft())?;
        army.add_to_army(&captain)?;
        let before = army.entries().to_vec();
        let writes = storage.writes();

        assert!(army.remove_from_army(5)?.is_none());
        assert!(army.set_model_count(5, 2)?.is_none());
        assert!(army.toggle_enhancement(5, "Power Sword")?.is_none());

        assert_eq!(army.entries(), before.as_slice());
        assert_eq!(storage.writes(), writes);
        Ok(())
    }

    #[test]
    fn invalid_changes_keep_prior_values() -> Result<()> {
        let (storage, mut collection, mut army) = setup();
        let captain = collection.add(captain_draft())?;
        let index = army.add_to_army(&captain)?;
        army.set_model_count(index, 4)?;
        let writes = storage.writes();

        let err = army.set_model_count(index, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidModelCount(_))
        ));
        let err = army.toggle_enhancement(index, "Relic Blade").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnknownEnhancement(_))
        ));

        assert_eq!(army.entries()[index].model_count, 4);
        assert_eq!(storage.writes(), writes);
        Ok(())
    }

    #[test]
    fn nameless_items_are_rejected() -> Result<()> {
        let (storage, _, mut army) = setup();
        let item = CollectionItem::from_draft(1, ItemDraft::new("", 10));
        assert!(army.add_to_army(&item).is_err());
        assert!(army.is_empty());
        assert_eq!(storage.writes(), 0);
        Ok(())
    }

    #[test]
    fn remove_and_clear_persist() -> Result<()> {
        let (storage, mut collection, mut army) = setup();
        let captain = collection.add(captain_draft())?;
        let squad = collection.add(ItemDraft::new("Tactical Squad", 90))?;
        army.add_to_army(&captain)?;
        army.add_to_army(&squad)?;

        let removed = army.remove_from_army(0)?.expect("entry exists");
        assert_eq!(removed.name, "Space Marine Captain");
        let reloaded = ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.entries()[0].name, "Tactical Squad");

        army.clear()?;
        assert!(army.is_empty());
        assert!(ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY).is_empty());
        Ok(())
    }

    #[test]
    fn list_round_trips_through_storage() -> Result<()> {
        let (storage, mut collection, mut army) = setup();
        let captain = collection.add(captain_draft())?;
        let squad = collection.add(ItemDraft::new("Tactical Squad", 90))?;
        army.add_to_army(&captain)?;
        army.add_to_army(&squad)?;
        army.add_to_army(&captain)?;
        army.set_model_count(0, 2)?;
        army.toggle_enhancement(0, "Storm Shield")?;
        army.toggle_enhancement(0, "Power Sword")?;
        army.toggle_enhancement(2, "Power Sword")?;

        let reloaded = ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY);
        assert_eq!(reloaded.entries(), army.entries());
        assert_eq!(reloaded.grand_total(), army.grand_total());
        Ok(())
    }

    #[test]
    fn malformed_data_loads_empty() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(DEFAULT_ARMY_KEY, "invalid json {[}")?;
        assert!(ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY).is_empty());
        Ok(())
    }

    #[test]
    fn army_survives_an_empty_collection() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(
            DEFAULT_ARMY_KEY,
            r#"[{"id":1,"name":"Test Unit","faction":"Test Faction","basePoints":100,
                "painted":true,"notes":"Test","enhancements":[],"modelCount":3,
                "selectedEnhancements":[]}]"#,
        )?;
        storage.set(DEFAULT_COLLECTION_KEY, "[]")?;

        let collection = CollectionStore::load(storage.clone(), DEFAULT_COLLECTION_KEY);
        let army = ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY);
        assert!(collection.is_empty());
        assert_eq!(army.len(), 1);
        assert_eq!(army.grand_total(), 300);
        Ok(())
    }

    #[test]
    fn stored_zero_model_count_is_repaired() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(
            DEFAULT_ARMY_KEY,
            r#"[{"id":1,"name":"Unit","basePoints":40,"modelCount":0}]"#,
        )?;
        let army = ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY);
        assert_eq!(army.entries()[0].model_count, 1);
        assert_eq!(army.grand_total(), 40);
        Ok(())
    }

    #[test]
    fn failed_writes_leave_entries_unchanged() -> Result<()> {
        let storage = Arc::new(FailingStorage::new());
        let mut collection = CollectionStore::load(storage.clone(), DEFAULT_COLLECTION_KEY);
        let mut army = ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY);
        let captain = collection.add(captain_draft())?;
        let index = army.add_to_army(&captain)?;
        army.set_model_count(index, 2)?;
        let before = army.entries().to_vec();
        storage.fail_writes(true);

        assert!(matches!(army.add_to_army(&captain), Err(Error::Storage(_))));
        assert!(matches!(army.set_model_count(index, 5), Err(Error::Storage(_))));
        assert!(matches!(
            army.toggle_enhancement(index, "Power Sword"),
            Err(Error::Storage(_))
        ));
        assert!(matches!(army.remove_from_army(index), Err(Error::Storage(_))));
        assert!(matches!(army.clear(), Err(Error::Storage(_))));
        assert_eq!(army.entries(), before.as_slice());
        assert_eq!(army.grand_total(), 200);

        storage.fail_writes(false);
        let reloaded = ArmyBuilder::load(storage.clone(), DEFAULT_ARMY_KEY);
        assert_eq!(reloaded.entries(), before.as_slice());
        Ok(())
    }
}
