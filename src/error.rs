//! Error types for unquiz.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for unquiz operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting and segmenting a paper.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input path does not point to an existing file.
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The extraction variant name is not recognized.
    #[error("Unsupported extraction variant: {0:?} (expected \"rasterizing\" or \"geometry-only\")")]
    UnsupportedVariant(String),

    /// The input could not be opened as a PDF document.
    #[error("Failed to open document: {0}")]
    DocumentOpen(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error decoding image samples.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// A single embedded image could not be materialized.
    #[error("Failed to extract image {index} from page {page}: {reason}")]
    ImageMaterialization {
        /// Page number (1-indexed)
        page: u32,
        /// Image index within the page (1-indexed)
        index: usize,
        /// Underlying failure
        reason: String,
    },

    /// Extraction was cancelled between pages.
    #[error("Extraction cancelled after {0} page(s)")]
    Cancelled(u32),

    /// Error serializing results.
    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::ImageDecode(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(err.to_string())
    }
}
