//! Document processing module
//! Segmentation, metadata derivation, tokenization, and the intake pipeline

pub mod document;
pub mod metadata;
pub mod pipeline;
pub mod segmenter;
pub mod text_processor;

pub use pipeline::IntakePipeline;
