//! Result sinks.
//!
//! A sink receives the segmented questions and the raw page records once
//! extraction and segmentation have finished. [`JsonSink`] writes both as
//! JSON documents; other consumers can implement [`ResultSink`] directly.

mod json;

pub use json::{to_json, JsonFormat, JsonSink, DEFAULT_OUTPUT_DIR, QUESTIONS_FILE, RAW_PAGES_FILE};

use crate::error::Result;
use crate::model::{PageRecord, Question};

/// Destination for pipeline results.
pub trait ResultSink {
    /// Receive the questions, in document order.
    fn write_questions(&mut self, questions: &[Question]) -> Result<()>;

    /// Receive the page records, in page order.
    fn write_pages(&mut self, pages: &[PageRecord]) -> Result<()>;
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn write_questions(&mut self, questions: &[Question]) -> Result<()> {
        (**self).write_questions(questions)
    }

    fn write_pages(&mut self, pages: &[PageRecord]) -> Result<()> {
        (**self).write_pages(pages)
    }
}
