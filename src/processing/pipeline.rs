//! Intake pipeline: raw file to processed record, and optionally into the store

use crate::config::Config;
use crate::error::{PipelineStage, Result};
use crate::input::parser::{DocumentParser, RawDocument};
use crate::processing::document::{DocumentId, ProcessedDocument};
use crate::processing::metadata::MetadataExtractor;
use crate::processing::segmenter::StructuralSegmenter;
use crate::storage::DocumentStore;
use log::info;
use rayon::prelude::*;

pub struct IntakePipeline {
    parser: DocumentParser,
    segmenter: StructuralSegmenter,
    extractor: MetadataExtractor,
}

impl Default for IntakePipeline {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl IntakePipeline {
    pub fn from_config(config: &Config) -> Self {
        Self {
            parser: DocumentParser::new(config.parser.clone()),
            segmenter: StructuralSegmenter::new(config.segmenter.clone()),
            extractor: MetadataExtractor,
        }
    }

    /// Parse, segment and describe one file. Nothing partial escapes on failure;
    /// errors name the stage and the file.
    pub fn process(&self, raw: &RawDocument) -> Result<ProcessedDocument> {
        let parsed = self
            .parser
            .parse(raw)
            .map_err(|e| e.at_stage(PipelineStage::Parse, &raw.filename))?;

        let structure = self
            .segmenter
            .segment(&parsed.text)
            .map_err(|e| e.at_stage(PipelineStage::Segment, &raw.filename))?;

        let metadata = self.extractor.extract(raw, &parsed.text, &parsed.pages);

        info!(
            "Processed {}: {} sections, {} words",
            raw.filename,
            structure.sections.len(),
            metadata.word_count
        );

        Ok(ProcessedDocument {
            id: DocumentId::new(),
            filename: raw.filename.clone(),
            extracted_text: parsed.text,
            pages: parsed.pages,
            metadata,
            structure,
        })
    }

    /// Documents share no state, so each one is processed on its own worker.
    /// Results come back in input order.
    pub fn process_batch(&self, raws: &[RawDocument]) -> Vec<Result<ProcessedDocument>> {
        raws.par_iter().map(|raw| self.process(raw)).collect()
    }

    /// Process and store in one step.
    pub fn ingest<I, S>(&self, store: &DocumentStore, raw: &RawDocument, tags: I) -> Result<DocumentId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let document = self.process(raw)?;
        store
            .store(document, tags)
            .map_err(|e| e.at_stage(PipelineStage::Store, &raw.filename))
    }
}
