//! Version history and partial updates

use crate::processing::document::{
    DocumentMetadata, DocumentPage, DocumentStructure, ProcessedDocument,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot taken before an update is applied. Numbers start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    /// Best effort; the metadata snapshot is authoritative.
    pub changes: Vec<DocumentChange>,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
    pub change_type: ChangeType,
    pub target: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// Partial record for `DocumentStore::update`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub filename: Option<String>,
    pub extracted_text: Option<String>,
    pub pages: Option<Vec<DocumentPage>>,
    pub metadata: Option<DocumentMetadata>,
    pub structure: Option<DocumentStructure>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn extracted_text(mut self, text: impl Into<String>) -> Self {
        self.extracted_text = Some(text.into());
        self
    }

    pub fn pages(mut self, pages: Vec<DocumentPage>) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn structure(mut self, structure: DocumentStructure) -> Self {
        self.structure = Some(structure);
        self
    }

    /// Replace a document's content wholesale with a freshly processed one, keeping its id.
    pub fn from_processed(document: ProcessedDocument) -> Self {
        Self {
            filename: Some(document.filename),
            extracted_text: Some(document.extracted_text),
            pages: Some(document.pages),
            metadata: Some(document.metadata),
            structure: Some(document.structure),
        }
    }

    /// Shallow merge: each present field replaces the existing one.
    pub fn apply(self, document: &mut ProcessedDocument) {
        if let Some(filename) = self.filename {
            document.filename = filename;
        }
        if let Some(text) = self.extracted_text {
            document.extracted_text = text;
        }
        if let Some(pages) = self.pages {
            document.pages = pages;
        }
        if let Some(metadata) = self.metadata {
            document.metadata = metadata;
        }
        if let Some(structure) = self.structure {
            document.structure = structure;
        }
    }

    pub fn describe_changes(&self, current: &ProcessedDocument) -> Vec<DocumentChange> {
        let mut changes = Vec::new();

        if let Some(filename) = &self.filename {
            if filename != &current.filename {
                changes.push(modified("filename", format!("{} -> {}", current.filename, filename)));
            }
        }
        if let Some(text) = &self.extracted_text {
            if text != &current.extracted_text {
                changes.push(modified(
                    "content",
                    format!(
                        "{} -> {} characters",
                        current.extracted_text.chars().count(),
                        text.chars().count()
                    ),
                ));
            }
        }
        if let Some(pages) = &self.pages {
            if pages != &current.pages {
                changes.push(modified(
                    "pages",
                    format!("{} -> {} pages", current.pages.len(), pages.len()),
                ));
            }
        }
        if let Some(metadata) = &self.metadata {
            if metadata != &current.metadata {
                changes.push(modified("metadata", "metadata replaced".to_string()));
            }
        }
        if let Some(structure) = &self.structure {
            changes.extend(section_changes(&current.structure, structure));
        }

        changes
    }
}

fn modified(target: &str, description: String) -> DocumentChange {
    DocumentChange {
        change_type: ChangeType::Modified,
        target: target.to_string(),
        description,
    }
}

/// Sections are matched by title.
fn section_changes(before: &DocumentStructure, after: &DocumentStructure) -> Vec<DocumentChange> {
    let old: HashMap<&str, &str> = before
        .sections
        .iter()
        .map(|s| (s.title.as_str(), s.content.as_str()))
        .collect();
    let new: HashMap<&str, &str> = after
        .sections
        .iter()
        .map(|s| (s.title.as_str(), s.content.as_str()))
        .collect();

    let mut changes = Vec::new();
    for section in &after.sections {
        let title = section.title.as_str();
        match old.get(title) {
            None => changes.push(DocumentChange {
                change_type: ChangeType::Added,
                target: format!("section:{}", title),
                description: format!("section '{}' added", title),
            }),
            Some(content) if *content != section.content => changes.push(DocumentChange {
                change_type: ChangeType::Modified,
                target: format!("section:{}", title),
                description: format!("section '{}' changed", title),
            }),
            Some(_) => {}
        }
    }
    for section in &before.sections {
        let title = section.title.as_str();
        if !new.contains_key(title) {
            changes.push(DocumentChange {
                change_type: ChangeType::Removed,
                target: format!("section:{}", title),
                description: format!("section '{}' removed", title),
            });
        }
    }

    changes
}
