//! Image references attached to pages and questions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// An image associated with a page.
///
/// The shape depends on which extractor produced it: the rasterizing
/// extractor writes PNG files and reports their paths, the geometry-only
/// extractor reports where the image sits on the page without decoding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    /// A saved raster file
    Raster {
        /// Location of the PNG file
        path: PathBuf,
    },
    /// Placement on the page, in PDF user space
    Geometry(BoundingBox),
}

impl ImageRef {
    /// Create a raster reference.
    pub fn raster(path: impl Into<PathBuf>) -> Self {
        ImageRef::Raster { path: path.into() }
    }

    /// Create a geometry reference.
    pub fn geometry(bbox: BoundingBox) -> Self {
        ImageRef::Geometry(bbox)
    }

    /// File path, for raster references.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageRef::Raster { path } => Some(path),
            ImageRef::Geometry(_) => None,
        }
    }

    /// Bounding box, for geometry references.
    pub fn bbox(&self) -> Option<&BoundingBox> {
        match self {
            ImageRef::Raster { .. } => None,
            ImageRef::Geometry(bbox) => Some(bbox),
        }
    }
}

/// Axis-aligned bounding box of an image placement.
///
/// Coordinates are in PDF user space (origin bottom-left). Missing
/// coordinates deserialize as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Create a box from two corners; width and height are derived.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let (x0, x1) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (y0, y1) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        Self {
            x0,
            y0,
            x1,
            y1,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Smallest box containing all the given points.
    pub fn enclosing(points: &[(f32, f32)]) -> Self {
        let Some(&(fx, fy)) = points.first() else {
            return Self::default();
        };
        let (mut x0, mut y0, mut x1, mut y1) = (fx, fy, fx, fy);
        for &(x, y) in &points[1..] {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Self::from_corners(x0, y0, x1, y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let bbox = BoundingBox::from_corners(300.0, 450.0, 100.0, 300.0);
        assert_eq!(bbox.x0, 100.0);
        assert_eq!(bbox.y0, 300.0);
        assert_eq!(bbox.width, 200.0);
        assert_eq!(bbox.height, 150.0);
    }

    #[test]
    fn test_enclosing_empty() {
        assert_eq!(BoundingBox::enclosing(&[]), BoundingBox::default());
    }

    #[test]
    fn test_raster_serializes_as_path_object() {
        let image = ImageRef::raster("images/page_1_image_1.png");
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, r#"{"path":"images/page_1_image_1.png"}"#);
    }

    #[test]
    fn test_geometry_missing_coordinates_default_to_zero() {
        let image: ImageRef = serde_json::from_str(r#"{"x0": 10.0, "width": 5.0}"#).unwrap();
        let bbox = image.bbox().unwrap();
        assert_eq!(bbox.x0, 10.0);
        assert_eq!(bbox.y0, 0.0);
        assert_eq!(bbox.x1, 0.0);
        assert_eq!(bbox.width, 5.0);
        assert_eq!(bbox.height, 0.0);
    }
}
