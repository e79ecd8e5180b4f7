//! Document structures produced by the intake pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Handle identifying a document inside the store and its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub id: DocumentId,
    pub filename: String,
    pub extracted_text: String,
    pub pages: Vec<DocumentPage>,
    pub metadata: DocumentMetadata,
    pub structure: DocumentStructure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPage {
    /// 1-indexed
    pub page_number: u32,
    pub content: String,
    pub width: f32,
    pub height: f32,
    pub text_blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub font_family: String,
    /// Inferred from heading-like shape, not from font data.
    pub is_bold: bool,
    pub is_italic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub size: u64,
    pub file_type: String,
    pub last_modified: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
    pub page_count: usize,
    pub word_count: usize,
    pub character_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub sections: Vec<DocumentSection>,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<Paragraph>,
    pub lists: Vec<DocumentList>,
}

/// A classified region of the content. `start_offset..end_offset` is a byte range
/// into the extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    pub section_type: SectionType,
    pub content: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Contact,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub text: String,
    pub level: u8,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    pub offset: usize,
    /// Index into `DocumentStructure::sections`; `None` before the first heading.
    pub section_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    pub ordered: bool,
    pub items: Vec<ListItem>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    pub offset: usize,
}

impl ProcessedDocument {
    pub fn sections_of_type(&self, section_type: SectionType) -> impl Iterator<Item = &DocumentSection> {
        self.structure
            .sections
            .iter()
            .filter(move |s| s.section_type == section_type)
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionType::Contact => write!(f, "contact"),
            SectionType::Summary => write!(f, "summary"),
            SectionType::Experience => write!(f, "experience"),
            SectionType::Education => write!(f, "education"),
            SectionType::Skills => write!(f, "skills"),
            SectionType::Projects => write!(f, "projects"),
            SectionType::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_round_trips_through_display() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_section_type_serializes_lowercase() {
        let json = serde_json::to_string(&SectionType::Experience).unwrap();
        assert_eq!(json, "\"experience\"");
    }
}
