//! JSON output for questions and page records.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::ResultSink;
use crate::error::{Error, Result};
use crate::model::{PageRecord, Question};

/// Default directory result files are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "extracted_content";

/// File name of the questions document.
pub const QUESTIONS_FILE: &str = "questions.json";

/// File name of the raw pages document.
pub const RAW_PAGES_FILE: &str = "raw_pages.json";

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any value to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Serialize(format!("JSON serialization error: {}", e)))
}

/// Writes `questions.json` and `raw_pages.json` into a directory.
#[derive(Debug, Clone)]
pub struct JsonSink {
    output_dir: PathBuf,
    format: JsonFormat,
}

impl JsonSink {
    /// Create a sink writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            format: JsonFormat::default(),
        }
    }

    /// Set the output format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the questions document.
    pub fn questions_path(&self) -> PathBuf {
        self.output_dir.join(QUESTIONS_FILE)
    }

    /// Path of the raw pages document.
    pub fn pages_path(&self) -> PathBuf {
        self.output_dir.join(RAW_PAGES_FILE)
    }

    fn write<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let json = to_json(value, self.format)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for JsonSink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl ResultSink for JsonSink {
    fn write_questions(&mut self, questions: &[Question]) -> Result<()> {
        let path = self.questions_path();
        self.write(&path, questions)?;
        log::info!("Saved {} questions to {}", questions.len(), path.display());
        Ok(())
    }

    fn write_pages(&mut self, pages: &[PageRecord]) -> Result<()> {
        let path = self.pages_path();
        self.write(&path, pages)?;
        log::info!("Saved {} raw pages to {}", pages.len(), path.display());
        Ok(())
    }
}
