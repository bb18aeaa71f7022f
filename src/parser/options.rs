//! Extraction options and configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Error;

/// Default directory for rasterized images.
pub const DEFAULT_IMAGE_DIR: &str = "extracted_content/images";

/// Options for extracting pages from a document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Directory PNG files are written to (rasterizing variant only)
    pub image_dir: PathBuf,

    /// Error handling mode for page-level failures
    pub error_mode: ErrorMode,

    /// Checked before each page; when set, extraction stops
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image output directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (record failing pages as empty and continue).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Install a cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    /// Image output directory.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            error_mode: ErrorMode::Strict,
            cancel_flag: None,
        }
    }
}

/// Error handling mode for page-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// The first failing page aborts the whole call
    #[default]
    Strict,
    /// A failing page is logged and recorded as an empty page
    Lenient,
}

/// Which page extractor to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionVariant {
    /// Text plus images saved as PNG files
    #[default]
    Rasterizing,
    /// Text plus image bounding boxes, nothing written
    GeometryOnly,
}

impl ExtractionVariant {
    /// Canonical name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionVariant::Rasterizing => "rasterizing",
            ExtractionVariant::GeometryOnly => "geometry-only",
        }
    }
}

impl fmt::Display for ExtractionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rasterizing" => Ok(ExtractionVariant::Rasterizing),
            "geometry-only" => Ok(ExtractionVariant::GeometryOnly),
            _ => Err(Error::UnsupportedVariant(s.to_string())),
        }
    }
}
