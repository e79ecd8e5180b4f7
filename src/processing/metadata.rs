//! Document metadata derivation

use crate::input::parser::RawDocument;
use crate::processing::document::{DocumentMetadata, DocumentPage};
use crate::processing::text_processor::TextProcessor;
use chrono::Utc;

#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Counts come from the extracted text and pages; file attributes pass through.
    pub fn extract(&self, raw: &RawDocument, text: &str, pages: &[DocumentPage]) -> DocumentMetadata {
        DocumentMetadata {
            filename: raw.filename.clone(),
            size: raw.size,
            file_type: raw.format.mime_type().to_string(),
            last_modified: raw.last_modified,
            processed_at: Utc::now(),
            page_count: pages.len(),
            word_count: TextProcessor::word_count(text),
            character_count: text.chars().count(),
        }
    }
}
