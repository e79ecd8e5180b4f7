//! Output generation module
//! Console and JSON rendering of documents, search results, and statistics

pub mod formatter;

pub use formatter::{ConsoleFormatter, JsonFormatter, OutputFormatter, ReportGenerator};
