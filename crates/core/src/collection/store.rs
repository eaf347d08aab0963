use std::{collections::BTreeSet, sync::Arc};

use tracing::{info, warn};

use crate::{
    error::Result,
    models::{CollectionItem, ItemDraft},
    storage::Storage,
};

/// Default storage key for the collection.
pub const DEFAULT_COLLECTION_KEY: &str = "wh40kCollection";

/// The user's owned units, persisted as one JSON array under a single key.
pub struct CollectionStore {
    storage: Arc<dyn Storage>,
    key: String,
    items: Vec<CollectionItem>,
}

impl CollectionStore {
    /// Load the collection stored under `key`. Absent or malformed data
    /// yields an empty collection.
    pub fn load(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let items = read_items(storage.as_ref(), &key);
        info!(key = %key, total = items.len(), "Collection loaded");
        Self {
            storage,
            key,
            items,
        }
    }

    /// Storage key backing this collection.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    /// Look an item up by id.
    pub fn get(&self, id: u64) -> Option<&CollectionItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct non-empty faction labels, sorted.
    pub fn factions(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| item.faction.clone())
            .filter(|faction| !faction.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Validate `draft`, assign it a fresh id and persist.
    pub fn add(&mut self, draft: ItemDraft) -> Result<CollectionItem> {
        let draft = draft.validate()?;
        let id = self.next_id();
        let item = CollectionItem::from_draft(id, draft);

        let mut next = self.items.clone();
        next.push(item.clone());
        self.commit(next)?;
        info!(id, name = %item.name, "Collection item added");
        Ok(item)
    }

    /// Replace the mutable fields of item `id`. Returns `None` when the id is
    /// unknown, in which case nothing is written.
    pub fn update(&mut self, id: u64, draft: ItemDraft) -> Result<Option<CollectionItem>> {
        let draft = draft.validate()?;
        let Some(position) = self.position(id) else {
            return Ok(None);
        };

        let mut next = self.items.clone();
        next[position].apply(draft);
        let updated = next[position].clone();
        self.commit(next)?;
        info!(id, name = %updated.name, "Collection item updated");
        Ok(Some(updated))
    }

    /// Remove item `id`. Unknown ids are ignored without writing.
    pub fn remove(&mut self, id: u64) -> Result<Option<CollectionItem>> {
        let Some(position) = self.position(id) else {
            return Ok(None);
        };

        let mut next = self.items.clone();
        let removed = next.remove(position);
        self.commit(next)?;
        info!(id, name = %removed.name, "Collection item removed");
        Ok(Some(removed))
    }

    /// One past the largest id in use. Once that would overflow, the
    /// smallest unused id is taken instead.
    fn next_id(&self) -> u64 {
        let max = self.items.iter().map(|item| item.id).max().unwrap_or(0);
        max.checked_add(1).unwrap_or_else(|| {
            let used: BTreeSet<u64> = self.items.iter().map(|item| item.id).collect();
            (1..=u64::MAX).find(|id| !used.contains(id)).unwrap_or(0)
        })
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn commit(&mut self, next: Vec<CollectionItem>) -> Result<()> {
        let serialized = serde_json::to_string(&next)?;
        self.storage.set(&self.key, &serialized)?;
        self.items = next;
        Ok(())
    }
}

fn read_items(storage: &dyn Storage, key: &str) -> Vec<CollectionItem> {
    let Some(raw) = storage.get(key) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(err) => {
            warn!(key, "Ignoring malformed collection data: {err}");
            Vec::new()
        }
    }
}
