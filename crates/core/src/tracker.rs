//! Collection and army list opened together over one storage.

use std::{path::Path, sync::Arc};

use tracing::info;

use crate::{
    army::{write_export, ArmyBuilder, DEFAULT_ARMY_KEY},
    collection::{CollectionStore, DEFAULT_COLLECTION_KEY},
    config::AppConfig,
    error::Result,
    storage::{FileStorage, MemoryStorage, Storage},
};

/// Both stores, sharing a single storage adapter.
pub struct Tracker {
    collection: CollectionStore,
    army: ArmyBuilder,
}

impl Tracker {
    /// Open the file-backed stores described by `config`.
    pub fn open(config: &AppConfig) -> Self {
        info!(data_dir = %config.data_dir.display(), "Opening tracker");
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.data_dir));
        Self::with_storage(storage, &config.collection_key, &config.army_key)
    }

    /// Stores backed by a fresh in-memory storage.
    pub fn in_memory() -> Self {
        Self::with_storage(
            Arc::new(MemoryStorage::new()),
            DEFAULT_COLLECTION_KEY,
            DEFAULT_ARMY_KEY,
        )
    }

    /// Load both stores from `storage` under the given keys.
    pub fn with_storage(storage: Arc<dyn Storage>, collection_key: &str, army_key: &str) -> Self {
        Self {
            collection: CollectionStore::load(storage.clone(), collection_key),
            army: ArmyBuilder::load(storage, army_key),
        }
    }

    /// The collection store.
    pub fn collection(&self) -> &CollectionStore {
        &self.collection
    }

    /// Mutable access to the collection store.
    pub fn collection_mut(&mut self) -> &mut CollectionStore {
        &mut self.collection
    }

    /// The army list.
    pub fn army(&self) -> &ArmyBuilder {
        &self.army
    }

    /// Mutable access to the army list.
    pub fn army_mut(&mut self) -> &mut ArmyBuilder {
        &mut self.army
    }

    /// Snapshot collection item `item_id` into the army list. Returns the
    /// new entry's index, or `None` when the item is not in the collection.
    pub fn add_to_army(&mut self, item_id: u64) -> Result<Option<usize>> {
        let Some(item) = self.collection.get(item_id) else {
            return Ok(None);
        };
        self.army.add_to_army(item).map(Some)
    }

    /// Write the current army list to `path`.
    pub fn export(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        write_export(path, self.army.entries())
    }
}
