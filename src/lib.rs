//! Resume indexer library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;
pub mod storage;

pub use config::Config;
pub use error::{PipelineStage, Result, ResumeIndexerError};
pub use processing::IntakePipeline;
pub use storage::{DocumentStore, SearchQuery};
