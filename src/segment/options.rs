//! Segmentation options.

/// Words that mark a line as the start of a new question.
pub const DEFAULT_TRIGGER_KEYWORDS: &[&str] =
    &["question", "what", "which", "find", "solve", "calculate"];

/// How questions on the same page draw from the page's image pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePolicy {
    /// Every question takes the pool's first image as primary and the
    /// rest as option images
    #[default]
    SharedPool,
    /// The k-th question on a page takes image k as primary and the
    /// images after it as option images
    Advance,
}

/// Options for question segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Trigger keywords, matched case-insensitively anywhere in a line
    pub keywords: Vec<String>,

    /// Image assignment policy
    pub image_policy: ImagePolicy,
}

impl SegmentOptions {
    /// Create new segment options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the trigger keywords.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Add a trigger keyword.
    pub fn add_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    /// Set the image assignment policy.
    pub fn with_image_policy(mut self, policy: ImagePolicy) -> Self {
        self.image_policy = policy;
        self
    }
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_TRIGGER_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            image_policy: ImagePolicy::SharedPool,
        }
    }
}
