//! Aggregate analytics over the store

use crate::storage::engine::StoredDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sizes, file types and tags cover active documents only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_documents: usize,
    pub total_size: u64,
    pub average_size: f64,
    pub file_types: BTreeMap<String, usize>,
    pub tag_usage: BTreeMap<String, usize>,
    /// Across all records, tombstoned ones included.
    pub total_versions: usize,
    pub deleted_documents: usize,
}

impl StorageStats {
    pub fn record(&mut self, stored: &StoredDocument) {
        self.total_versions += stored.versions.len();

        if !stored.is_active() {
            self.deleted_documents += 1;
            return;
        }

        self.total_documents += 1;
        self.total_size += stored.document.metadata.size;
        *self
            .file_types
            .entry(stored.document.metadata.file_type.clone())
            .or_insert(0) += 1;
        for tag in &stored.tags {
            *self.tag_usage.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    pub fn finalize(mut self) -> Self {
        self.average_size = if self.total_documents > 0 {
            self.total_size as f64 / self.total_documents as f64
        } else {
            0.0
        };
        self
    }
}
