//! Question segmentation.
//!
//! Regroups each page's lines into questions. A line containing any trigger
//! keyword (case-insensitive, anywhere in the line) opens a new question;
//! other lines are appended to the open question with a single space.
//! Lines before the first trigger on a page are dropped. Nothing carries
//! over between pages, and images are only ever taken from the page the
//! question was opened on.

mod options;

pub use options::{ImagePolicy, SegmentOptions, DEFAULT_TRIGGER_KEYWORDS};

use crate::model::{PageRecord, Question};

/// Splits page text into questions.
#[derive(Debug, Clone)]
pub struct QuestionSegmenter {
    keywords: Vec<String>,
    image_policy: ImagePolicy,
}

/// Question being accumulated.
struct Draft {
    text: String,
    /// Position of this question among the page's questions
    slot: usize,
}

impl QuestionSegmenter {
    /// Create a segmenter with the default trigger keywords.
    pub fn new() -> Self {
        Self::with_options(SegmentOptions::default())
    }

    /// Create a segmenter with custom options.
    pub fn with_options(options: SegmentOptions) -> Self {
        let keywords = options
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            keywords,
            image_policy: options.image_policy,
        }
    }

    /// Check whether a line opens a new question.
    pub fn is_trigger(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.keywords.iter().any(|k| line.contains(k.as_str()))
    }

    /// Segment all pages, in order.
    pub fn segment(&self, pages: &[PageRecord]) -> Vec<Question> {
        let mut questions = Vec::new();
        for page in pages {
            self.segment_page(page, &mut questions);
        }
        log::info!("Parsed {} questions from {} pages", questions.len(), pages.len());
        questions
    }

    /// Segment a single page, appending its questions to `out`.
    pub fn segment_page(&self, page: &PageRecord, out: &mut Vec<Question>) {
        let mut current: Option<Draft> = None;
        let mut opened = 0;

        for line in page.lines() {
            if self.is_trigger(line) {
                if let Some(draft) = current.take() {
                    out.push(self.finish(draft, page));
                }
                current = Some(Draft {
                    text: line.to_string(),
                    slot: opened,
                });
                opened += 1;
            } else if let Some(draft) = current.as_mut() {
                draft.text.push(' ');
                draft.text.push_str(line);
            } else {
                log::trace!(
                    "Dropping line before first question on page {}: {:?}",
                    page.page_number(),
                    line
                );
            }
        }

        if let Some(draft) = current {
            out.push(self.finish(draft, page));
        }
    }

    fn finish(&self, draft: Draft, page: &PageRecord) -> Question {
        let primary = match self.image_policy {
            ImagePolicy::SharedPool => 0,
            ImagePolicy::Advance => draft.slot,
        };
        Question::from_pool(draft.text, page.images(), primary)
    }
}

impl Default for QuestionSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
