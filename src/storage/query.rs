//! Search filters, sorting, and results

use crate::error::{Result, ResumeIndexerError};
use crate::storage::engine::{normalize_tags, StoredDocument};
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Last modification time
    Date,
    Name,
    Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortBy {
    type Err = ResumeIndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortBy::Date),
            "name" => Ok(SortBy::Name),
            "size" => Ok(SortBy::Size),
            other => Err(ResumeIndexerError::InvalidQuery(format!(
                "unknown sort key '{}', expected date, name or size",
                other
            ))),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ResumeIndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ResumeIndexerError::InvalidQuery(format!(
                "unknown sort order '{}', expected asc or desc",
                other
            ))),
        }
    }
}

/// All filters are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive regex over the filename; invalid patterns match literally.
    pub filename: Option<String>,
    pub file_type: Option<String>,
    /// Matches documents carrying any of these tags. Tags are trimmed and
    /// blank ones ignored, as when storing.
    pub tags: Vec<String>,
    /// Every whitespace-separated term must occur in the content.
    pub content: Option<String>,
    /// Exact index tokens, all of which must be present.
    pub terms: Vec<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub documents: Vec<StoredDocument>,
    /// Matches before `limit` was applied.
    pub total: usize,
    pub query_time: Duration,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(mut self, pattern: impl Into<String>) -> Self {
        self.filename = Some(pattern.into());
        self
    }

    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn created_between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.created_after = from;
        self.created_before = to;
        self
    }

    pub fn sort(mut self, sort_by: SortBy, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by);
        self.sort_order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sort_order.is_some() && self.sort_by.is_none() {
            return Err(ResumeIndexerError::InvalidQuery(
                "sort order given without a sort key".to_string(),
            ));
        }
        if let (Some(from), Some(to)) = (self.created_after, self.created_before) {
            if from > to {
                return Err(ResumeIndexerError::InvalidQuery(format!(
                    "date range starts after it ends ({} > {})",
                    from, to
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn compile(&self) -> Result<CompiledQuery<'_>> {
        self.validate()?;

        let filename = match &self.filename {
            Some(pattern) => Some(build_filename_regex(pattern)?),
            None => None,
        };
        let content_terms = self
            .content
            .as_deref()
            .map(|c| c.to_lowercase().split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(CompiledQuery {
            query: self,
            filename,
            tags: normalize_tags(&self.tags).collect(),
            content_terms,
        })
    }
}

fn build_filename_regex(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
        })
        .map_err(|e| ResumeIndexerError::InvalidQuery(format!("filename pattern: {}", e)))
}

pub(crate) struct CompiledQuery<'a> {
    query: &'a SearchQuery,
    filename: Option<Regex>,
    tags: Vec<String>,
    content_terms: Vec<String>,
}

impl CompiledQuery<'_> {
    pub(crate) fn matches(&self, stored: &StoredDocument) -> bool {
        let doc = &stored.document;

        if let Some(regex) = &self.filename {
            if !regex.is_match(&doc.filename) {
                return false;
            }
        }
        if let Some(file_type) = &self.query.file_type {
            if &doc.metadata.file_type != file_type {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| stored.tags.contains(t)) {
            return false;
        }
        if !self.content_terms.is_empty() {
            let content = doc.extracted_text.to_lowercase();
            if !self.content_terms.iter().all(|term| content.contains(term.as_str())) {
                return false;
            }
        }
        if let Some(from) = self.query.created_after {
            if stored.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.query.created_before {
            if stored.created_at > to {
                return false;
            }
        }
        true
    }

    pub(crate) fn sort(&self, documents: &mut [StoredDocument]) {
        let Some(sort_by) = self.query.sort_by else {
            return;
        };
        let order = self.query.sort_order.unwrap_or_default();

        documents.sort_by(|a, b| {
            let ordering = compare(sort_by, a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
}

fn compare(sort_by: SortBy, a: &StoredDocument, b: &StoredDocument) -> Ordering {
    match sort_by {
        SortBy::Date => a.last_modified.cmp(&b.last_modified),
        SortBy::Name => a.document.filename.cmp(&b.document.filename),
        SortBy::Size => a.document.metadata.size.cmp(&b.document.metadata.size),
    }
}
