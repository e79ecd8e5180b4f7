//! Input processing module
//! Handles format detection, text extraction, page synthesis, and file loading

pub mod file_detector;
pub mod manager;
pub mod parser;
pub mod text_extractor;

pub use file_detector::DocumentFormat;
pub use manager::InputManager;
pub use parser::{DocumentParser, ParsedContent, RawDocument};
