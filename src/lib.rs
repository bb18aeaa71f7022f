//! # unquiz
//!
//! Question extraction from PDF exam papers.
//!
//! The pipeline has three stages. Pages are extracted from a PDF in one of
//! two variants: `rasterizing` saves every embedded image as a PNG file,
//! `geometry-only` reports each image's bounding box instead. The page text
//! is then segmented into questions using trigger keywords. Finally the
//! questions and raw pages are handed to a [`ResultSink`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use unquiz::{process_file, ExtractOptions, JsonSink};
//!
//! fn main() -> unquiz::Result<()> {
//!     let mut sink = JsonSink::default();
//!     let questions = process_file("paper.pdf", "rasterizing", &ExtractOptions::default(), &mut sink)?;
//!     println!("{} questions", questions.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod model;
pub mod parser;
pub mod segment;
pub mod sink;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{BoundingBox, ImageRef, PageRecord, Question};
pub use parser::{
    DocumentExtractor, ErrorMode, ExtractOptions, ExtractionVariant, PageExtractor, PdfDocument,
};
pub use segment::{ImagePolicy, QuestionSegmenter, SegmentOptions};
pub use sink::{JsonFormat, JsonSink, ResultSink};

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Extract every page of a PDF file.
///
/// `variant` is `"rasterizing"` or `"geometry-only"` (case-insensitive). It
/// is checked before the file is touched, so an unknown variant fails with
/// [`Error::UnsupportedVariant`] even when the path does not exist.
///
/// # Example
///
/// ```no_run
/// use unquiz::{extract, ExtractOptions};
///
/// let pages = extract("paper.pdf", "geometry-only", &ExtractOptions::default()).unwrap();
/// for page in &pages {
///     println!("page {}: {} images", page.page_number(), page.image_count());
/// }
/// ```
pub fn extract<P: AsRef<Path>>(
    path: P,
    variant: &str,
    options: &ExtractOptions,
) -> Result<Vec<PageRecord>> {
    let variant: ExtractionVariant = variant.parse()?;
    DocumentExtractor::new(variant, options.clone()).extract(path)
}

/// Segment page records into questions with the default trigger keywords.
pub fn segment(pages: &[PageRecord]) -> Vec<Question> {
    QuestionSegmenter::new().segment(pages)
}

/// Extract, segment and write the results of a PDF file.
///
/// Questions are written to the sink before the raw pages. Returns the
/// questions.
pub fn process_file<P: AsRef<Path>, S: ResultSink + ?Sized>(
    path: P,
    variant: &str,
    options: &ExtractOptions,
    sink: &mut S,
) -> Result<Vec<Question>> {
    let pages = extract(path, variant, options)?;
    let questions = segment(&pages);
    sink.write_questions(&questions)?;
    sink.write_pages(&pages)?;
    Ok(questions)
}

/// Builder for running the pipeline with custom settings.
///
/// # Example
///
/// ```no_run
/// use unquiz::{ImagePolicy, Unquiz};
///
/// let result = Unquiz::new()
///     .with_variant("geometry-only")
///     .with_image_policy(ImagePolicy::Advance)
///     .lenient()
///     .process("paper.pdf")?;
/// println!("{} questions", result.questions().len());
/// # Ok::<(), unquiz::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Unquiz {
    variant: String,
    extract_options: ExtractOptions,
    segment_options: SegmentOptions,
}

impl Unquiz {
    /// Create a new builder using the rasterizing variant.
    pub fn new() -> Self {
        Self {
            variant: ExtractionVariant::default().to_string(),
            extract_options: ExtractOptions::default(),
            segment_options: SegmentOptions::default(),
        }
    }

    /// Set the extraction variant by name.
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    /// Set the image output directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_options = self.extract_options.with_image_dir(dir);
        self
    }

    /// Record failing pages as empty instead of aborting.
    pub fn lenient(mut self) -> Self {
        self.extract_options = self.extract_options.lenient();
        self
    }

    /// Install a cancellation flag checked before each page.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.extract_options = self.extract_options.with_cancel_flag(flag);
        self
    }

    /// Replace the trigger keywords.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segment_options = self.segment_options.with_keywords(keywords);
        self
    }

    /// Set the image assignment policy.
    pub fn with_image_policy(mut self, policy: ImagePolicy) -> Self {
        self.segment_options = self.segment_options.with_image_policy(policy);
        self
    }

    /// Extract pages only.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PageRecord>> {
        extract(path, &self.variant, &self.extract_options)
    }

    /// Extract and segment a PDF file.
    pub fn process<P: AsRef<Path>>(&self, path: P) -> Result<UnquizResult> {
        let pages = self.extract(path)?;
        let questions = QuestionSegmenter::with_options(self.segment_options.clone()).segment(&pages);
        Ok(UnquizResult { pages, questions })
    }
}

impl Default for Unquiz {
    fn default() -> Self {
        Self::new()
    }
}

/// Pages and questions produced by [`Unquiz::process`].
#[derive(Debug, Clone)]
pub struct UnquizResult {
    pages: Vec<PageRecord>,
    questions: Vec<Question>,
}

impl UnquizResult {
    /// Raw page records, in page order.
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Questions, in document order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Hand both result sets to a sink, questions first.
    pub fn write_to<S: ResultSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.write_questions(&self.questions)?;
        sink.write_pages(&self.pages)
    }

    /// Serialize the questions to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        sink::to_json(&self.questions, format)
    }
}
