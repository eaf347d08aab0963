//! The user's owned-unit inventory.

/// Search, filter and sort over collection items.
pub mod query;
mod store;

pub use query::{CollectionQuery, SortKey};
pub use store::{CollectionStore, DEFAULT_COLLECTION_KEY};
