//! Error handling for the resume indexer

use crate::processing::document::DocumentId;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Parse,
    Segment,
    Store,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Parse => write!(f, "parse"),
            PipelineStage::Segment => write!(f, "segment"),
            PipelineStage::Store => write!(f, "store"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResumeIndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read '{filename}': {reason}")]
    Read { filename: String, reason: String },

    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Document already exists: {0}")]
    Conflict(DocumentId),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("{stage} stage failed for '{subject}': {source}")]
    Stage {
        stage: PipelineStage,
        subject: String,
        #[source]
        source: Box<ResumeIndexerError>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ResumeIndexerError {
    /// Attribute this error to a pipeline stage and the file or id it concerns.
    pub fn at_stage(self, stage: PipelineStage, subject: impl Into<String>) -> Self {
        ResumeIndexerError::Stage {
            stage,
            subject: subject.into(),
            source: Box::new(self),
        }
    }

    /// The stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            ResumeIndexerError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error, with stage wrappers removed.
    pub fn root(&self) -> &ResumeIndexerError {
        match self {
            ResumeIndexerError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResumeIndexerError>;
