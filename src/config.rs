//! Configuration management for the resume indexer

use crate::error::{Result, ResumeIndexerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub parser: ParserConfig,
    pub segmenter: SegmenterConfig,
    pub intake: IntakeConfig,
    pub output: OutputConfig,
}

/// Geometry used when synthesizing pages and text blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub line_height: f32,
    pub block_width: f32,
    pub font_size: f32,
    pub font_family: String,
    pub heading_max_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    pub heading_max_length: usize,
    pub section_confidence: f32,
    /// Documents with more lines than this are rejected before segmentation.
    pub max_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeConfig {
    pub enable_caching: bool,
    pub default_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
}

impl Default for ParserConfig {
    fn default() -> Self {
        // US Letter in points
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin: 50.0,
            line_height: 20.0,
            block_width: 500.0,
            font_size: 12.0,
            font_family: "Arial".to_string(),
            heading_max_length: 50,
        }
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            heading_max_length: 100,
            section_confidence: 0.8,
            max_lines: 100_000,
        }
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            enable_caching: true,
            default_tags: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            color_output: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ResumeIndexerError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeIndexerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-indexer")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.parser;
        let geometry = [
            ("parser.page_width", p.page_width),
            ("parser.page_height", p.page_height),
            ("parser.line_height", p.line_height),
            ("parser.block_width", p.block_width),
            ("parser.font_size", p.font_size),
        ];
        for (key, value) in geometry {
            if value <= 0.0 {
                return Err(ResumeIndexerError::Configuration(format!(
                    "{} must be positive, got {}",
                    key, value
                )));
            }
        }

        let confidence = self.segmenter.section_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ResumeIndexerError::Configuration(format!(
                "segmenter.section_confidence must be within [0, 1], got {}",
                confidence
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segmenter.heading_max_length, 100);
        assert_eq!(config.parser.heading_max_length, 50);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.intake.default_tags = vec!["resume".to_string()];
        config.output.format = OutputFormat::Json;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let mut config = Config::default();
        config.segmenter.section_confidence = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ResumeIndexerError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "parser = 12").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ResumeIndexerError::Configuration(_))
        ));
    }
}
