//! Page-level records.

use serde::Serialize;

use super::ImageRef;

/// Text and images extracted from a single page.
///
/// `image_count` always equals `images.len()`; the fields are private so
/// the two cannot drift apart after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    page_number: u32,
    text: String,
    images: Vec<ImageRef>,
    image_count: usize,
}

impl PageRecord {
    /// Create a page record. Leading and trailing whitespace is trimmed from
    /// `text`; internal line breaks are kept.
    pub fn new(page_number: u32, text: impl AsRef<str>, images: Vec<ImageRef>) -> Self {
        let image_count = images.len();
        Self {
            page_number,
            text: text.as_ref().trim().to_string(),
            images,
            image_count,
        }
    }

    /// Record for a page that yielded nothing.
    pub fn empty(page_number: u32) -> Self {
        Self::new(page_number, "", Vec::new())
    }

    /// Page number (1-indexed).
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Full page text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Images in document order.
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// Number of images on the page.
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    /// Non-empty, trimmed lines of the page text.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|line| !line.is_empty())
    }

    /// Check if the page has neither text nor images.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }
}
