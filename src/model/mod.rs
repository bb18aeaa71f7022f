//! Record types produced by extraction and segmentation.
//!
//! [`PageRecord`]s come out of the document extractor, one per page, and
//! [`Question`]s come out of the segmenter. Both are plain immutable values
//! that serialize with the field names downstream consumers expect.

mod image;
mod page;
mod question;

pub use image::{BoundingBox, ImageRef};
pub use page::PageRecord;
pub use question::Question;
