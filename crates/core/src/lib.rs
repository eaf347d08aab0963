#![warn(clippy::all, missing_docs)]

//! Core domain logic for armybook.
//!
//! This crate hosts the collection and army list models, input
//! validation, the key-value storage adapters, configuration handling,
//! and the army list export used by the terminal UI and any future
//! frontends.

pub mod army;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tracker;
pub mod validation;

pub use army::{ArmyBuilder, ArmyEntry};
pub use collection::{CollectionQuery, CollectionStore, SortKey};
pub use config::AppConfig;
pub use error::{Error, Result, StorageError, ValidationError};
pub use models::{CollectionItem, Enhancement, ItemDraft};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use tracker::Tracker;
