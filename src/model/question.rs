//! Segmented question records.

use serde::{Serialize, Serializer};

use super::ImageRef;

/// One logical question and the images judged to belong to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    question: String,
    #[serde(serialize_with = "serialize_primary")]
    images: Option<ImageRef>,
    option_images: Vec<ImageRef>,
}

impl Question {
    /// Build a question from a page's image pool.
    ///
    /// `primary` indexes the pool; every pool element after it becomes an
    /// option image. An out-of-range index leaves the question without
    /// images.
    pub fn from_pool(text: impl AsRef<str>, pool: &[ImageRef], primary: usize) -> Self {
        let images = pool.get(primary).cloned();
        let option_images = match images {
            Some(_) => pool[primary + 1..].to_vec(),
            None => Vec::new(),
        };
        Self {
            question: text.as_ref().trim().to_string(),
            images,
            option_images,
        }
    }

    /// Question text.
    pub fn text(&self) -> &str {
        &self.question
    }

    /// Primary image, if any.
    pub fn primary_image(&self) -> Option<&ImageRef> {
        self.images.as_ref()
    }

    /// Answer-choice images.
    pub fn option_images(&self) -> &[ImageRef] {
        &self.option_images
    }

    /// Check if the question carries any image.
    pub fn has_images(&self) -> bool {
        self.images.is_some()
    }
}

/// A missing primary image is written as an empty string.
fn serialize_primary<S>(image: &Option<ImageRef>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match image {
        Some(image) => image.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<ImageRef> {
        vec![
            ImageRef::raster("p1.png"),
            ImageRef::raster("p2.png"),
            ImageRef::raster("p3.png"),
        ]
    }

    #[test]
    fn test_from_pool_first() {
        let q = Question::from_pool(" What comes next? ", &pool(), 0);
        assert_eq!(q.text(), "What comes next?");
        assert_eq!(q.primary_image(), Some(&ImageRef::raster("p1.png")));
        assert_eq!(q.option_images().len(), 2);
        assert!(!q.option_images().contains(&ImageRef::raster("p1.png")));
    }

    #[test]
    fn test_from_pool_out_of_range() {
        let q = Question::from_pool("Which one?", &pool(), 3);
        assert!(!q.has_images());
        assert!(q.option_images().is_empty());
    }

    #[test]
    fn test_from_empty_pool() {
        let q = Question::from_pool("Solve.", &[], 0);
        assert!(q.primary_image().is_none());
        assert!(q.option_images().is_empty());
    }

    #[test]
    fn test_serialize_without_images() {
        let q = Question::from_pool("Solve for x.", &[], 0);
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(
            json,
            r#"{"question":"Solve for x.","images":"","option_images":[]}"#
        );
    }

    #[test]
    fn test_serialize_with_images() {
        let q = Question::from_pool("Find it.", &pool()[..2], 0);
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["images"]["path"], "p1.png");
        assert_eq!(value["option_images"][0]["path"], "p2.png");
    }
}
