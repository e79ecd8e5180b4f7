//! CLI interface for the resume indexer

use crate::config::OutputFormat;
use crate::storage::{SearchQuery, SortBy, SortOrder};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-indexer")]
#[command(about = "Parse, segment and index resume documents")]
#[command(long_about = "Extract text from PDF, DOCX, DOC, Markdown and plain text resumes, detect their sections, and query them through an in-memory inverted index")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and segment a single document
    Inspect {
        /// Path to the document (PDF, DOCX, DOC, MD, TXT)
        file: PathBuf,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Ingest documents and run a search over them
    Search {
        /// Documents to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        filters: SearchFilters,

        /// Tags applied to every ingested document
        #[arg(long = "tag-all")]
        apply_tags: Vec<String>,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Ingest documents and print storage statistics
    Stats {
        /// Documents to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Tags applied to every ingested document
        #[arg(long = "tag-all")]
        apply_tags: Vec<String>,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args, Default)]
pub struct SearchFilters {
    /// Filename pattern (case-insensitive regex)
    #[arg(long)]
    pub filename: Option<String>,

    /// MIME type, e.g. application/pdf
    #[arg(long)]
    pub file_type: Option<String>,

    /// Match documents carrying any of these tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Words that must all appear in the text
    #[arg(long)]
    pub content: Option<String>,

    /// Index tokens that must all be present
    #[arg(long = "term")]
    pub terms: Vec<String>,

    /// Only documents stored on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub after: Option<String>,

    /// Only documents stored on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub before: Option<String>,

    /// Sort key: date, name, size
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort order: asc, desc
    #[arg(long)]
    pub order: Option<String>,

    /// Maximum number of results
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

impl SearchFilters {
    pub fn to_query(&self) -> Result<SearchQuery, String> {
        let mut query = SearchQuery::new().tags(self.tags.clone()).terms(self.terms.clone());

        if let Some(pattern) = &self.filename {
            query = query.filename(pattern.clone());
        }
        if let Some(file_type) = &self.file_type {
            query = query.file_type(file_type.clone());
        }
        if let Some(content) = &self.content {
            query = query.content(content.clone());
        }

        let after = self.after.as_deref().map(|d| parse_date(d, false)).transpose()?;
        let before = self.before.as_deref().map(|d| parse_date(d, true)).transpose()?;
        query = query.created_between(after, before);

        match (&self.sort_by, &self.order) {
            (Some(key), order) => {
                let key: SortBy = key.parse().map_err(|e| format!("{}", e))?;
                let order: SortOrder = match order {
                    Some(o) => o.parse().map_err(|e| format!("{}", e))?,
                    None => SortOrder::default(),
                };
                query = query.sort(key, order);
            }
            (None, Some(_)) => return Err("--order requires --sort-by".to_string()),
            (None, None) => {}
        }

        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

/// Whole-day bounds: the start of the day for `after`, the last second for `before`.
fn parse_date(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}. Expected YYYY-MM-DD", value, e))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| format!("Invalid date '{}'", value))
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Invalid output format: {}. Supported: console, json", format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("JSON").unwrap(), OutputFormat::Json);
        assert!(parse_output_format("html").is_err());
    }

    #[test]
    fn test_search_arguments_build_query() {
        let cli = Cli::try_parse_from([
            "resume-indexer",
            "search",
            "a.txt",
            "b.md",
            "--term",
            "rust",
            "--tag",
            "backend",
            "--sort-by",
            "size",
            "--order",
            "desc",
            "--limit",
            "5",
            "--after",
            "2024-01-01",
        ])
        .unwrap();

        let Commands::Search { files, filters, .. } = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(files.len(), 2);

        let query = filters.to_query().unwrap();
        assert_eq!(query.terms, vec!["rust"]);
        assert_eq!(query.tags, vec!["backend"]);
        assert_eq!(query.sort_by, Some(SortBy::Size));
        assert_eq!(query.sort_order, Some(SortOrder::Desc));
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.created_after.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_order_without_sort_key_rejected() {
        let filters = SearchFilters {
            order: Some("desc".to_string()),
            ..SearchFilters::default()
        };
        assert!(filters.to_query().is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        let filters = SearchFilters {
            before: Some("yesterday".to_string()),
            ..SearchFilters::default()
        };
        assert!(filters.to_query().unwrap_err().contains("yesterday"));
    }
}
