//! Storage and index engine
//! Owns the record store, the inverted index, version history, tags, and analytics

pub mod engine;
pub mod index;
pub mod query;
pub mod stats;
pub mod version;

pub use engine::{DocumentStatus, DocumentStore, StoredDocument};
pub use query::{SearchQuery, SearchResults, SortBy, SortOrder};
pub use stats::StorageStats;
pub use version::{ChangeType, DocumentChange, DocumentPatch, DocumentVersion};
