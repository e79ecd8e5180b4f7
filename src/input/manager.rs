//! Input manager for loading files from disk

use crate::error::{Result, ResumeIndexerError};
use crate::input::file_detector::DocumentFormat;
use crate::input::parser::RawDocument;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct InputManager {
    cache: HashMap<PathBuf, RawDocument>,
    enable_cache: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub async fn load(&mut self, path: &Path) -> Result<RawDocument> {
        if self.enable_cache {
            if let Some(cached) = self.cache.get(path) {
                info!("Using cached bytes for: {}", path.display());
                return Ok(cached.clone());
            }
        }

        if !path.exists() {
            return Err(ResumeIndexerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        // Reject unsupported files before reading them
        let format = DocumentFormat::from_path(path)?;

        let bytes = fs::read(path).await.map_err(|e| ResumeIndexerError::Read {
            filename: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file_meta = fs::metadata(path).await?;
        let last_modified = file_meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        info!("Loaded {} ({}, {} bytes)", filename, format, bytes.len());
        let raw = RawDocument::new(filename, bytes, format).with_last_modified(last_modified);

        if self.enable_cache {
            self.cache.insert(path.to_path_buf(), raw.clone());
        }

        Ok(raw)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
