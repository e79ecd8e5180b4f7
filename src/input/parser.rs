//! Raw document parsing: text extraction plus page and text-block synthesis

use crate::config::ParserConfig;
use crate::error::Result;
use crate::input::file_detector::DocumentFormat;
use crate::input::text_extractor::{
    DocxExtractor, LegacyDocExtractor, MarkdownExtractor, PdfExtractor, PlainTextExtractor,
    TextExtractor,
};
use crate::processing::document::{DocumentPage, TextBlock};
use chrono::{DateTime, Utc};
use log::debug;
use regex::Regex;

const PAGE_BREAK: char = '\u{000C}';

/// A file as handed over by the upload side, before any processing.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub format: DocumentFormat,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

impl RawDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>, format: DocumentFormat) -> Self {
        let size = bytes.len() as u64;
        Self {
            filename: filename.into(),
            bytes,
            format,
            size,
            last_modified: Utc::now(),
        }
    }

    /// Build from a declared MIME type, failing on anything unsupported.
    pub fn from_mime(filename: impl Into<String>, bytes: Vec<u8>, mime: &str) -> Result<Self> {
        Ok(Self::new(filename, bytes, DocumentFormat::from_mime_type(mime)?))
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContent {
    pub text: String,
    pub pages: Vec<DocumentPage>,
}

pub struct DocumentParser {
    config: ParserConfig,
    all_caps_regex: Regex,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl DocumentParser {
    pub fn new(config: ParserConfig) -> Self {
        let all_caps_regex = Regex::new(r"^[A-Z\s]+$").expect("Invalid all-caps regex");
        Self {
            config,
            all_caps_regex,
        }
    }

    pub fn parse(&self, raw: &RawDocument) -> Result<ParsedContent> {
        let text = self.extract_text(raw)?;
        let pages = self.synthesize_pages(&text, raw.format);
        debug!(
            "Parsed '{}' ({}): {} characters, {} pages",
            raw.filename,
            raw.format,
            text.len(),
            pages.len()
        );
        Ok(ParsedContent { text, pages })
    }

    fn extract_text(&self, raw: &RawDocument) -> Result<String> {
        match raw.format {
            DocumentFormat::PlainText => PlainTextExtractor.extract(&raw.filename, &raw.bytes),
            DocumentFormat::Markdown => MarkdownExtractor.extract(&raw.filename, &raw.bytes),
            DocumentFormat::Pdf => PdfExtractor.extract(&raw.filename, &raw.bytes),
            DocumentFormat::Docx => DocxExtractor.extract(&raw.filename, &raw.bytes),
            DocumentFormat::Doc => LegacyDocExtractor.extract(&raw.filename, &raw.bytes),
        }
    }

    /// PDF text is split on form feeds; every other format is a single page.
    pub fn synthesize_pages(&self, text: &str, format: DocumentFormat) -> Vec<DocumentPage> {
        let chunks: Vec<&str> = if format == DocumentFormat::Pdf {
            text.split(PAGE_BREAK).collect()
        } else {
            vec![text]
        };

        chunks
            .into_iter()
            .enumerate()
            .map(|(idx, content)| self.build_page(idx as u32 + 1, content))
            .collect()
    }

    fn build_page(&self, page_number: u32, content: &str) -> DocumentPage {
        let text_blocks = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(row, line)| TextBlock {
                text: line.to_string(),
                x: self.config.margin,
                y: self.config.margin + row as f32 * self.config.line_height,
                width: self.config.block_width,
                height: self.config.line_height,
                font_size: self.config.font_size,
                font_family: self.config.font_family.clone(),
                is_bold: self.is_heading_like(line),
                is_italic: false,
            })
            .collect();

        DocumentPage {
            page_number,
            content: content.to_string(),
            width: self.config.page_width,
            height: self.config.page_height,
            text_blocks,
        }
    }

    /// Short line that is all caps or ends with a colon.
    pub fn is_heading_like(&self, line: &str) -> bool {
        line.chars().count() < self.config.heading_max_length
            && (is_fully_uppercase(line) || self.all_caps_regex.is_match(line) || line.ends_with(':'))
    }
}

/// Uppercase with at least one letter, so digit-only lines such as dates do not qualify.
pub(crate) fn is_fully_uppercase(line: &str) -> bool {
    line.chars().any(char::is_alphabetic) && line.to_uppercase() == line
}
