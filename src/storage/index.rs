//! Inverted index from token to the ids of active documents containing it

use crate::processing::document::DocumentId;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, HashSet<DocumentId>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I>(&mut self, id: DocumentId, tokens: I)
    where
        I: IntoIterator<Item = String>,
    {
        for token in tokens {
            self.postings.entry(token).or_default().insert(id);
        }
    }

    /// Remove `id` from every posting set, dropping sets that become empty.
    /// Returns how many tokens referenced the document.
    pub fn purge(&mut self, id: DocumentId) -> usize {
        let mut removed = 0;
        self.postings.retain(|_, ids| {
            if ids.remove(&id) {
                removed += 1;
            }
            !ids.is_empty()
        });
        removed
    }

    pub fn lookup(&self, token: &str) -> Option<&HashSet<DocumentId>> {
        self.postings.get(token)
    }

    pub fn contains(&self, token: &str, id: DocumentId) -> bool {
        self.postings
            .get(token)
            .map_or(false, |ids| ids.contains(&id))
    }

    /// Whether any token still references `id`.
    pub fn references(&self, id: DocumentId) -> bool {
        self.postings.values().any(|ids| ids.contains(&id))
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }
}
