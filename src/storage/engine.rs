//! In-memory document store with an inverted index and version history
//!
//! Records live in a `DashMap`, so every mutation of a given id runs under that
//! id's shard write lock and readers never see a half-applied update. The index
//! sits behind its own lock, always taken after the record lock. Search checks a
//! record's index entries while holding that record's lock, in the same order.

use crate::error::{Result, ResumeIndexerError};
use crate::processing::document::{DocumentId, ProcessedDocument};
use crate::processing::text_processor::TextProcessor;
use crate::storage::index::InvertedIndex;
use crate::storage::query::{SearchQuery, SearchResults};
use crate::storage::stats::StorageStats;
use crate::storage::version::{DocumentPatch, DocumentVersion};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DocumentStatus {
    Active,
    /// Tombstone; the record and its versions stay for audit.
    Deleted { deleted_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub document: ProcessedDocument,
    pub versions: Vec<DocumentVersion>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub status: DocumentStatus,
}

impl StoredDocument {
    pub fn id(&self) -> DocumentId {
        self.document.id
    }

    pub fn is_active(&self) -> bool {
        self.status == DocumentStatus::Active
    }

    pub fn current_version(&self) -> u32 {
        self.versions.len() as u32
    }
}

pub struct DocumentStore {
    documents: DashMap<DocumentId, StoredDocument>,
    index: RwLock<InvertedIndex>,
    processor: TextProcessor,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            index: RwLock::new(InvertedIndex::new()),
            processor: TextProcessor::new(),
        }
    }

    /// Store a freshly processed document. Ids are never reused, so a second
    /// store of the same id is a conflict even after deletion.
    pub fn store<I, S>(&self, document: ProcessedDocument, tags: I) -> Result<DocumentId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = document.id;
        match self.documents.entry(id) {
            Entry::Occupied(_) => Err(ResumeIndexerError::Conflict(id)),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let tokens = self.index_tokens(&document);
                let stored = StoredDocument {
                    document,
                    versions: Vec::new(),
                    tags: normalize_tags(tags).collect(),
                    created_at: now,
                    last_modified: now,
                    status: DocumentStatus::Active,
                };

                debug!("Storing {} ({}) with {} tokens", id, stored.document.filename, tokens.len());
                self.index.write().insert(id, tokens);
                slot.insert(stored);
                Ok(id)
            }
        }
    }

    /// Snapshot the current metadata as a new version, merge the patch, and
    /// re-index the document from scratch.
    pub fn update(&self, id: DocumentId, patch: DocumentPatch) -> Result<StoredDocument> {
        let mut entry = self
            .documents
            .get_mut(&id)
            .ok_or(ResumeIndexerError::NotFound(id))?;
        if !entry.is_active() {
            return Err(ResumeIndexerError::NotFound(id));
        }

        let now = Utc::now();
        let mut next = entry.value().clone();
        let changes = patch.describe_changes(&next.document);
        next.versions.push(DocumentVersion {
            version: next.current_version() + 1,
            timestamp: now,
            changes,
            metadata: next.document.metadata.clone(),
        });
        patch.apply(&mut next.document);
        next.last_modified = now;

        let tokens = self.index_tokens(&next.document);
        {
            let mut index = self.index.write();
            index.purge(id);
            index.insert(id, tokens);
        }
        *entry = next;

        debug!("Updated {} to version {}", id, entry.current_version());
        Ok(entry.value().clone())
    }

    pub fn soft_delete(&self, id: DocumentId) -> Result<()> {
        let mut entry = self
            .documents
            .get_mut(&id)
            .ok_or(ResumeIndexerError::NotFound(id))?;
        if !entry.is_active() {
            return Err(ResumeIndexerError::NotFound(id));
        }

        let now = Utc::now();
        let purged = self.index.write().purge(id);
        entry.status = DocumentStatus::Deleted { deleted_at: now };
        entry.last_modified = now;

        debug!("Soft-deleted {}, removed from {} index entries", id, purged);
        Ok(())
    }

    /// Set union. Returns whether anything changed; `last_modified` only moves if so.
    pub fn add_tags<I, S>(&self, id: DocumentId, tags: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mutate_tags(id, |current| {
            let mut changed = false;
            for tag in normalize_tags(tags) {
                changed |= current.insert(tag);
            }
            changed
        })
    }

    /// Set difference. Removing an absent tag is a no-op.
    pub fn remove_tags<I, S>(&self, id: DocumentId, tags: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mutate_tags(id, |current| {
            let mut changed = false;
            for tag in normalize_tags(tags) {
                changed |= current.remove(&tag);
            }
            changed
        })
    }

    fn mutate_tags<F>(&self, id: DocumentId, apply: F) -> Result<bool>
    where
        F: FnOnce(&mut BTreeSet<String>) -> bool,
    {
        let mut entry = self
            .documents
            .get_mut(&id)
            .ok_or(ResumeIndexerError::NotFound(id))?;
        if !entry.is_active() {
            return Err(ResumeIndexerError::NotFound(id));
        }

        let changed = apply(&mut entry.tags);
        if changed {
            entry.last_modified = Utc::now();
            debug!("Tags of {} now {:?}", id, entry.tags);
        }
        Ok(changed)
    }

    /// Active or tombstoned record.
    pub fn get(&self, id: DocumentId) -> Option<StoredDocument> {
        self.documents.get(&id).map(|entry| entry.value().clone())
    }

    /// Version history, still readable after deletion.
    pub fn versions(&self, id: DocumentId) -> Result<Vec<DocumentVersion>> {
        self.documents
            .get(&id)
            .map(|entry| entry.versions.clone())
            .ok_or(ResumeIndexerError::NotFound(id))
    }

    pub fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let started = Instant::now();
        let compiled = query.compile()?;
        let tokens = self.query_tokens(&query.terms)?;

        // The shard read lock pins the record, so its index entries can't move
        // underneath the membership check.
        let mut documents: Vec<StoredDocument> = self
            .documents
            .iter()
            .filter(|entry| entry.is_active())
            .filter(|entry| tokens.is_empty() || self.index_has_all(*entry.key(), &tokens))
            .filter(|entry| compiled.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        compiled.sort(&mut documents);
        let total = documents.len();
        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }

        let query_time = started.elapsed();
        debug!("Search matched {} documents in {:?}", total, query_time);
        Ok(SearchResults {
            documents,
            total,
            query_time,
        })
    }

    fn query_tokens(&self, terms: &[String]) -> Result<Vec<String>> {
        let mut tokens = Vec::with_capacity(terms.len());
        for term in terms {
            let normalized = self.processor.tokenize(term);
            if normalized.is_empty() {
                return Err(ResumeIndexerError::InvalidQuery(format!(
                    "term '{}' is not indexable (stop word or too short)",
                    term
                )));
            }
            tokens.extend(normalized);
        }
        Ok(tokens)
    }

    fn index_has_all(&self, id: DocumentId, tokens: &[String]) -> bool {
        let index = self.index.read();
        tokens.iter().all(|token| index.contains(token, id))
    }

    pub fn stats(&self) -> StorageStats {
        let mut stats = StorageStats::default();
        for entry in self.documents.iter() {
            stats.record(entry.value());
        }
        stats.finalize()
    }

    /// Active documents indexed under `token`.
    pub fn documents_for_token(&self, token: &str) -> Vec<DocumentId> {
        let index = self.index.read();
        let mut ids: Vec<DocumentId> = index
            .lookup(&token.to_lowercase())
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Whether any index token references `id`.
    pub fn is_indexed(&self, id: DocumentId) -> bool {
        self.index.read().references(id)
    }

    pub fn indexed_token_count(&self) -> usize {
        self.index.read().token_count()
    }

    /// All records, tombstones included.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.documents.iter().filter(|entry| entry.is_active()).count()
    }

    fn index_tokens(&self, document: &ProcessedDocument) -> HashSet<String> {
        let mut tokens = self.processor.unique_tokens(&document.extracted_text);
        tokens.extend(self.processor.tokenize(&document.filename));
        tokens
    }
}

/// Trimmed, blank tags dropped.
pub(crate) fn normalize_tags<I, S>(tags: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::document::{DocumentMetadata, DocumentStructure};
    use crate::storage::query::{SortBy, SortOrder};
    use std::sync::Arc;

    fn document(filename: &str, file_type: &str, size: u64, text: &str) -> ProcessedDocument {
        ProcessedDocument {
            id: DocumentId::new(),
            filename: filename.to_string(),
            extracted_text: text.to_string(),
            pages: Vec::new(),
            metadata: DocumentMetadata {
                filename: filename.to_string(),
                size,
                file_type: file_type.to_string(),
                last_modified: Utc::now(),
                processed_at: Utc::now(),
                page_count: 1,
                word_count: text.split_whitespace().count(),
                character_count: text.chars().count(),
            },
            structure: DocumentStructure::default(),
        }
    }

    fn text_doc(filename: &str, text: &str) -> ProcessedDocument {
        document(filename, "text/plain", text.len() as u64, text)
    }

    const NO_TAGS: [&str; 0] = [];

    #[test]
    fn test_search_without_filters_returns_active_set() {
        let store = DocumentStore::new();
        let a = store.store(text_doc("a.txt", "alpha"), NO_TAGS).unwrap();
        let b = store.store(text_doc("b.txt", "beta"), NO_TAGS).unwrap();
        let c = store.store(text_doc("c.txt", "gamma"), NO_TAGS).unwrap();
        store.soft_delete(b).unwrap();

        let results = store.search(&SearchQuery::new()).unwrap();
        let ids: HashSet<DocumentId> = results.documents.iter().map(|d| d.id()).collect();

        assert_eq!(results.total, 2);
        assert_eq!(ids, HashSet::from([a, c]));
        assert_eq!(store.active_count(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_soft_delete_prunes_index_but_keeps_history() {
        let store = DocumentStore::new();
        let id = store.store(text_doc("cv.txt", "Rust engineer"), NO_TAGS).unwrap();
        store
            .update(id, DocumentPatch::new().extracted_text("Senior Rust engineer"))
            .unwrap();

        assert!(store.is_indexed(id));
        store.soft_delete(id).unwrap();

        assert!(!store.is_indexed(id));
        assert!(store.documents_for_token("rust").is_empty());
        assert!(store.search(&SearchQuery::new().content("rust")).unwrap().documents.is_empty());
        assert_eq!(store.versions(id).unwrap().len(), 1);
        assert!(!store.get(id).unwrap().is_active());
    }

    #[test]
    fn test_mutations_on_tombstone_are_not_found() {
        let store = DocumentStore::new();
        let id = store.store(text_doc("cv.txt", "text"), NO_TAGS).unwrap();
        store.soft_delete(id).unwrap();

        assert!(matches!(store.soft_delete(id), Err(ResumeIndexerError::NotFound(_))));
        assert!(matches!(
            store.update(id, DocumentPatch::new().filename("x.txt")),
            Err(ResumeIndexerError::NotFound(_))
        ));
        assert!(matches!(store.add_tags(id, ["x"]), Err(ResumeIndexerError::NotFound(_))));
        assert!(matches!(
            store.update(DocumentId::new(), DocumentPatch::new()),
            Err(ResumeIndexerError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_tags_is_idempotent() {
        let store = DocumentStore::new();
        let id = store.store(text_doc("cv.txt", "text"), NO_TAGS).unwrap();

        assert!(store.add_tags(id, ["x"]).unwrap());
        let after_first = store.get(id).unwrap();

        assert!(!store.add_tags(id, ["x"]).unwrap());
        let after_second = store.get(id).unwrap();

        assert_eq!(after_second.tags.iter().filter(|t| *t == "x").count(), 1);
        assert_eq!(after_first.last_modified, after_second.last_modified);
    }

    #[test]
    fn test_remove_absent_tag_is_noop() {
        let store = DocumentStore::new();
        let id = store.store(text_doc("cv.txt", "text"), ["resume"]).unwrap();
        let before = store.get(id).unwrap();

        assert!(!store.remove_tags(id, ["cv"]).unwrap());
        assert_eq!(store.get(id).unwrap(), before);

        assert!(store.remove_tags(id, ["resume"]).unwrap());
        assert!(store.get(id).unwrap().tags.is_empty());
    }

    #[test]
    fn test_content_token_retrieves_document() {
        let store = DocumentStore::new();
        let text = "Kubernetes operator written in Rust, deployed across clusters";
        let id = store.store(text_doc("cv.txt", text), NO_TAGS).unwrap();

        for token in TextProcessor::new().tokenize(text) {
            let results = store.search(&SearchQuery::new().content(token.clone())).unwrap();
            assert_eq!(results.documents.len(), 1, "token {}", token);
            assert_eq!(results.documents[0].id(), id);

            let indexed = store.search(&SearchQuery::new().terms([token])).unwrap();
            assert_eq!(indexed.documents.len(), 1);
        }
    }

    #[test]
    fn test_content_search_requires_every_term() {
        let store = DocumentStore::new();
        store.store(text_doc("a.txt", "Rust and Go"), NO_TAGS).unwrap();
        store.store(text_doc("b.txt", "Rust only"), NO_TAGS).unwrap();

        let results = store.search(&SearchQuery::new().content("RUST go")).unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.documents[0].document.filename, "a.txt");
    }

    #[test]
    fn test_update_versions_increase_by_one() {
        let store = DocumentStore::new();
        let id = store.store(text_doc("cv.txt", "first draft"), NO_TAGS).unwrap();

        for n in 1..=3u32 {
            let updated = store
                .update(id, DocumentPatch::new().extracted_text(format!("draft number {}", n)))
                .unwrap();
            assert_eq!(updated.versions.len(), n as usize);
        }

        let numbers: Vec<u32> = store.versions(id).unwrap().iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_update_reindexes_and_prunes_stale_tokens() {
        let store = DocumentStore::new();
        let id = store.store(text_doc("cv.txt", "python developer"), NO_TAGS).unwrap();

        store
            .update(id, DocumentPatch::new().extracted_text("haskell developer"))
            .unwrap();

        assert!(store.documents_for_token("python").is_empty());
        assert_eq!(store.documents_for_token("haskell"), vec![id]);
        assert_eq!(store.documents_for_token("developer"), vec![id]);
        // filename tokens are indexed too
        assert_eq!(store.documents_for_token("txt"), vec![id]);
    }

    #[test]
    fn test_version_snapshot_holds_previous_metadata() {
        let store = DocumentStore::new();
        let doc = text_doc("cv.txt", "one");
        let original_metadata = doc.metadata.clone();
        let id = store.store(doc, NO_TAGS).unwrap();

        let mut new_metadata = original_metadata.clone();
        new_metadata.size = 999;
        store.update(id, DocumentPatch::new().metadata(new_metadata)).unwrap();

        let versions = store.versions(id).unwrap();
        assert_eq!(versions[0].metadata, original_metadata);
        assert_eq!(store.get(id).unwrap().document.metadata.size, 999);
    }

    #[test]
    fn test_store_same_id_twice_conflicts() {
        let store = DocumentStore::new();
        let doc = text_doc("cv.txt", "text");
        let copy = doc.clone();
        store.store(doc, NO_TAGS).unwrap();

        assert!(matches!(store.store(copy, NO_TAGS), Err(ResumeIndexerError::Conflict(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stats_single_pdf() {
        let store = DocumentStore::new();
        store
            .store(document("report.pdf", "application/pdf", 1024, "quarterly"), NO_TAGS)
            .unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.total_size, 1024);
        assert_eq!(stats.average_size, 1024.0);
        assert_eq!(stats.file_types.len(), 1);
        assert_eq!(stats.file_types.get("application/pdf"), Some(&1));
    }

    #[test]
    fn test_stats_ignore_deleted_documents() {
        let store = DocumentStore::new();
        let a = store.store(document("a.pdf", "application/pdf", 100, "a"), ["resume"]).unwrap();
        store.store(document("b.txt", "text/plain", 300, "b"), ["resume", "cv"]).unwrap();
        store.soft_delete(a).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.total_size, 300);
        assert_eq!(stats.average_size, 300.0);
        assert_eq!(stats.deleted_documents, 1);
        assert!(stats.file_types.get("application/pdf").is_none());
        assert_eq!(stats.tag_usage.get("resume"), Some(&1));
        assert_eq!(stats.tag_usage.get("cv"), Some(&1));
    }

    #[test]
    fn test_empty_store_stats() {
        let stats = DocumentStore::new().stats();
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.average_size, 0.0);
    }

    #[test]
    fn test_tag_filter_uses_any_semantics() {
        let store = DocumentStore::new();
        store.store(text_doc("a.txt", "a"), ["cv"]).unwrap();
        let b = store.store(text_doc("b.txt", "b"), ["resume", "2024"]).unwrap();

        let results = store.search(&SearchQuery::new().tags(["resume"])).unwrap();
        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.documents[0].id(), b);

        let either = store.search(&SearchQuery::new().tags(["resume", "cv"])).unwrap();
        assert_eq!(either.total, 2);
    }

    #[test]
    fn test_tag_filter_trims_like_store() {
        let store = DocumentStore::new();
        let id = store.store(text_doc("a.txt", "a"), [" resume "]).unwrap();
        store.store(text_doc("b.txt", "b"), ["cv"]).unwrap();

        let padded = store.search(&SearchQuery::new().tags([" resume", "  "])).unwrap();
        assert_eq!(padded.total, 1);
        assert_eq!(padded.documents[0].id(), id);

        let blank_only = store.search(&SearchQuery::new().tags(["   "])).unwrap();
        assert_eq!(blank_only.total, 2);
    }

    #[test]
    fn test_sort_by_name_ascending() {
        let store = DocumentStore::new();
        for name in ["b.txt", "a.txt", "c.txt"] {
            store.store(text_doc(name, "content"), NO_TAGS).unwrap();
        }

        let results = store
            .search(&SearchQuery::new().sort(SortBy::Name, SortOrder::Asc))
            .unwrap();
        let names: Vec<&str> = results
            .documents
            .iter()
            .map(|d| d.document.filename.as_str())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_sort_by_size_descending_with_limit() {
        let store = DocumentStore::new();
        store.store(document("s.txt", "text/plain", 10, "x"), NO_TAGS).unwrap();
        store.store(document("l.txt", "text/plain", 1000, "x"), NO_TAGS).unwrap();
        store.store(document("m.txt", "text/plain", 100, "x"), NO_TAGS).unwrap();

        let results = store
            .search(&SearchQuery::new().sort(SortBy::Size, SortOrder::Desc).limit(2))
            .unwrap();
        let sizes: Vec<u64> = results.documents.iter().map(|d| d.document.metadata.size).collect();
        assert_eq!(sizes, vec![1000, 100]);
        assert_eq!(results.total, 3);
    }

    #[test]
    fn test_filename_and_type_filters() {
        let store = DocumentStore::new();
        store.store(document("Jane_Resume.pdf", "application/pdf", 1, "x"), NO_TAGS).unwrap();
        store.store(document("jane_resume.txt", "text/plain", 1, "x"), NO_TAGS).unwrap();
        store.store(document("notes.txt", "text/plain", 1, "x"), NO_TAGS).unwrap();

        let by_name = store.search(&SearchQuery::new().filename("RESUME")).unwrap();
        assert_eq!(by_name.total, 2);

        let combined = store
            .search(&SearchQuery::new().filename("resume").file_type("text/plain"))
            .unwrap();
        assert_eq!(combined.total, 1);
        assert_eq!(combined.documents[0].document.filename, "jane_resume.txt");
    }

    #[test]
    fn test_created_range_is_inclusive() {
        let store = DocumentStore::new();
        let id = store.store(text_doc("a.txt", "x"), NO_TAGS).unwrap();
        let created = store.get(id).unwrap().created_at;

        let exact = SearchQuery::new().created_between(Some(created), Some(created));
        assert_eq!(store.search(&exact).unwrap().total, 1);

        let later = SearchQuery::new().created_between(Some(created + chrono::Duration::seconds(1)), None);
        assert_eq!(store.search(&later).unwrap().total, 0);
    }

    #[test]
    fn test_invalid_queries_fail_fast() {
        let store = DocumentStore::new();
        store.store(text_doc("a.txt", "x"), NO_TAGS).unwrap();

        let order_only = SearchQuery {
            sort_order: Some(SortOrder::Asc),
            ..SearchQuery::default()
        };
        assert!(matches!(store.search(&order_only), Err(ResumeIndexerError::InvalidQuery(_))));
        assert!(matches!(
            store.search(&SearchQuery::new().terms(["the"])),
            Err(ResumeIndexerError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let store = DocumentStore::new();
        let results = store.search(&SearchQuery::new().content("nothing")).unwrap();
        assert!(results.documents.is_empty());
        assert_eq!(results.total, 0);
    }

    #[test]
    fn test_concurrent_updates_produce_unique_versions() {
        let store = Arc::new(DocumentStore::new());
        let id = store.store(text_doc("cv.txt", "base"), NO_TAGS).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for n in 0..25 {
                        store
                            .update(
                                id,
                                DocumentPatch::new().extracted_text(format!("worker{} edit{}", worker, n)),
                            )
                            .unwrap();
                    }
                });
            }
        });

        let numbers: Vec<u32> = store.versions(id).unwrap().iter().map(|v| v.version).collect();
        assert_eq!(numbers, (1..=200).collect::<Vec<u32>>());

        // the index reflects exactly the last write
        let last = store.get(id).unwrap().document.extracted_text;
        for token in TextProcessor::new().tokenize(&last) {
            assert_eq!(store.documents_for_token(&token), vec![id]);
        }
        assert_eq!(store.indexed_token_count(), 3);
    }

    #[test]
    fn test_search_runs_alongside_mutations() {
        let store = Arc::new(DocumentStore::new());
        let ids: Vec<DocumentId> = (0..4)
            .map(|i| store.store(text_doc(&format!("{}.txt", i), "rust"), NO_TAGS).unwrap())
            .collect();

        std::thread::scope(|scope| {
            for id in ids.iter().copied() {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for n in 0..20 {
                        store
                            .update(id, DocumentPatch::new().extracted_text(format!("rust {}", n)))
                            .unwrap();
                    }
                });
            }
            let reader = Arc::clone(&store);
            scope.spawn(move || {
                for _ in 0..50 {
                    let results = reader.search(&SearchQuery::new().content("rust")).unwrap();
                    assert_eq!(results.total, 4);
                }
            });
        });
    }

    #[test]
    fn test_term_search_agrees_with_record_under_updates() {
        let store = Arc::new(DocumentStore::new());
        let id = store.store(text_doc("cv.txt", "python developer"), NO_TAGS).unwrap();

        std::thread::scope(|scope| {
            let writer = Arc::clone(&store);
            scope.spawn(move || {
                for n in 0..200 {
                    let text = if n % 2 == 0 { "haskell developer" } else { "python developer" };
                    writer.update(id, DocumentPatch::new().extracted_text(text)).unwrap();
                }
            });
            let reader = Arc::clone(&store);
            scope.spawn(move || {
                for _ in 0..200 {
                    let python = reader.search(&SearchQuery::new().terms(["python"])).unwrap();
                    for stored in &python.documents {
                        assert!(stored.document.extracted_text.contains("python"));
                    }
                    let developer = reader.search(&SearchQuery::new().terms(["developer"])).unwrap();
                    assert_eq!(developer.total, 1);
                }
            });
        });

        // 200 updates end on the python text
        let results = store.search(&SearchQuery::new().terms(["python"])).unwrap();
        assert_eq!(results.documents[0].id(), id);
    }

    #[test]
    fn test_update_racing_soft_delete_leaves_consistent_tombstone() {
        let store = Arc::new(DocumentStore::new());
        let id = store.store(text_doc("cv.txt", "rust engineer"), NO_TAGS).unwrap();

        let applied = std::thread::scope(|scope| {
            let writer = Arc::clone(&store);
            let updates = scope.spawn(move || {
                let mut applied = 0u32;
                for n in 0..500 {
                    match writer.update(id, DocumentPatch::new().extracted_text(format!("rust edit{}", n))) {
                        Ok(_) => applied += 1,
                        Err(ResumeIndexerError::NotFound(_)) => break,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
                applied
            });
            let deleter = Arc::clone(&store);
            scope.spawn(move || {
                std::thread::yield_now();
                deleter.soft_delete(id).unwrap();
            });
            updates.join().unwrap()
        });

        let stored = store.get(id).unwrap();
        assert!(!stored.is_active());
        assert!(!store.is_indexed(id));
        assert!(store.documents_for_token("rust").is_empty());
        let numbers: Vec<u32> = store.versions(id).unwrap().iter().map(|v| v.version).collect();
        assert_eq!(numbers, (1..=applied).collect::<Vec<u32>>());
        assert!(matches!(
            store.update(id, DocumentPatch::new().extracted_text("late")),
            Err(ResumeIndexerError::NotFound(_))
        ));
    }
}
