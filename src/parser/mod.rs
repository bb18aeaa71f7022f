//! Document extraction: opening PDFs and turning pages into records.

mod backend;
mod extractor;
mod materialize;
mod options;
mod text;

pub use backend::{ImagePlacement, Matrix, PageRef, PdfDocument};
pub use extractor::{DocumentExtractor, GeometryExtractor, PageExtractor, RasterExtractor};
pub use materialize::{
    cmyk_to_rgb, decode_image, raster_file_name, ColorSpace, ImageMaterializer, Materialized,
    Pixmap,
};
pub use options::{ErrorMode, ExtractOptions, ExtractionVariant, DEFAULT_IMAGE_DIR};
