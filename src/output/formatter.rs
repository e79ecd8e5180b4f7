//! Output formatters for processed documents, search results, and stats

use crate::config::OutputFormat;
use crate::error::Result;
use crate::processing::document::ProcessedDocument;
use crate::storage::{SearchResults, StorageStats};
use colored::{Color, Colorize};
use std::path::Path;

/// Longest section preview printed on the console.
const PREVIEW_CHARS: usize = 80;

pub trait OutputFormatter {
    fn format_document(&self, document: &ProcessedDocument) -> Result<String>;
    fn format_search(&self, results: &SearchResults) -> Result<String>;
    fn format_stats(&self, stats: &StorageStats) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

/// Picks the formatter for the configured output format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{} {}\n", "█".blue().bold(), title.blue().bold())
        } else {
            format!("\n█ {}\n", title)
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_document(&self, document: &ProcessedDocument) -> Result<String> {
        let meta = &document.metadata;
        let mut output = self.format_header(&document.filename);

        output.push_str(&format!(
            "{} | {} bytes | {} pages | {} words | {} characters\n",
            meta.file_type, meta.size, meta.page_count, meta.word_count, meta.character_count
        ));
        output.push_str(&format!(
            "{} headings, {} paragraphs, {} lists\n",
            document.structure.headings.len(),
            document.structure.paragraphs.len(),
            document.structure.lists.len()
        ));

        output.push_str(&self.format_header("Sections"));
        if document.structure.sections.is_empty() {
            output.push_str("  (none detected)\n");
        }
        for section in &document.structure.sections {
            output.push_str(&format!(
                "  • {} [{}] {}..{} (confidence {:.2})\n",
                self.colorize(&section.title, Color::Green),
                section.section_type,
                section.start_offset,
                section.end_offset,
                section.confidence
            ));
            let preview = preview(&section.content);
            if !preview.is_empty() {
                output.push_str(&format!("    {}\n", self.colorize(&preview, Color::White)));
            }
        }

        Ok(output)
    }

    fn format_search(&self, results: &SearchResults) -> Result<String> {
        let mut output = self.format_header(&format!(
            "{} matching documents ({:.2?})",
            results.total, results.query_time
        ));

        for stored in &results.documents {
            let tags: Vec<&str> = stored.tags.iter().map(String::as_str).collect();
            output.push_str(&format!(
                "  • {} {} | {} | {} bytes | v{} | tags: {}\n",
                self.colorize(&stored.document.filename, Color::Green),
                self.colorize(&stored.id().to_string(), Color::BrightBlack),
                stored.document.metadata.file_type,
                stored.document.metadata.size,
                stored.current_version(),
                if tags.is_empty() { "-".to_string() } else { tags.join(", ") }
            ));
        }
        if results.documents.len() < results.total {
            output.push_str(&format!(
                "  … {} more not shown\n",
                results.total - results.documents.len()
            ));
        }

        Ok(output)
    }

    fn format_stats(&self, stats: &StorageStats) -> Result<String> {
        let mut output = self.format_header("Storage statistics");

        output.push_str(&format!("  Documents:     {}\n", stats.total_documents));
        output.push_str(&format!("  Total size:    {} bytes\n", stats.total_size));
        output.push_str(&format!("  Average size:  {:.1} bytes\n", stats.average_size));
        output.push_str(&format!("  Versions:      {}\n", stats.total_versions));
        output.push_str(&format!("  Deleted:       {}\n", stats.deleted_documents));

        if !stats.file_types.is_empty() {
            output.push_str(&self.format_header("File types"));
            for (file_type, count) in &stats.file_types {
                output.push_str(&format!("  {:<40} {}\n", file_type, count));
            }
        }
        if !stats.tag_usage.is_empty() {
            output.push_str(&self.format_header("Tags"));
            for (tag, count) in &stats.tag_usage {
                output.push_str(&format!("  {:<40} {}\n", self.colorize(tag, Color::Yellow), count));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_document(&self, document: &ProcessedDocument) -> Result<String> {
        self.to_json(document)
    }

    fn format_search(&self, results: &SearchResults) -> Result<String> {
        self.to_json(results)
    }

    fn format_stats(&self, stats: &StorageStats) -> Result<String> {
        self.to_json(stats)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl ReportGenerator {
    pub fn new(use_colors: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            json_formatter: JsonFormatter::new(true),
        }
    }

    pub fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

fn preview(content: &str) -> String {
    let flattened = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= PREVIEW_CHARS {
        flattened
    } else {
        let cut: String = flattened.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    }
}
