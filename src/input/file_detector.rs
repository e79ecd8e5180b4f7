//! Declared document format detection

use crate::error::{Result, ResumeIndexerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Pdf,
    Docx,
    Doc,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Ok(DocumentFormat::PlainText),
            "md" | "markdown" => Ok(DocumentFormat::Markdown),
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "doc" => Ok(DocumentFormat::Doc),
            other => Err(ResumeIndexerError::UnsupportedFormat(format!(".{}", other))),
        }
    }

    pub fn from_mime_type(mime: &str) -> Result<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "text/plain" => Ok(DocumentFormat::PlainText),
            "text/markdown" | "text/x-markdown" => Ok(DocumentFormat::Markdown),
            "application/pdf" => Ok(DocumentFormat::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Ok(DocumentFormat::Docx)
            }
            "application/msword" => Ok(DocumentFormat::Doc),
            _ => Err(ResumeIndexerError::UnsupportedFormat(mime.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ResumeIndexerError::UnsupportedFormat(format!(
                    "File has no extension: {}",
                    path.display()
                ))
            })?;

        Self::from_extension(extension)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "text/plain",
            DocumentFormat::Markdown => "text/markdown",
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Doc => "application/msword",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}
