//! Page and document extraction.

use std::collections::HashSet;
use std::path::Path;

use super::backend::{PageRef, PdfDocument};
use super::materialize::{ImageMaterializer, Materialized};
use super::options::{ErrorMode, ExtractOptions, ExtractionVariant};
use crate::error::{Error, Result};
use crate::model::{ImageRef, PageRecord};

/// Produces a [`PageRecord`] for one page of an open document.
pub trait PageExtractor {
    /// Which variant this extractor implements.
    fn variant(&self) -> ExtractionVariant;

    /// Called once after the document is opened, before the first page.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Extract text and images from a single page.
    fn extract_page(&self, doc: &PdfDocument, page: PageRef) -> Result<PageRecord>;
}

/// Saves each distinct image on a page as a PNG file.
#[derive(Debug, Clone)]
pub struct RasterExtractor {
    materializer: ImageMaterializer,
}

impl RasterExtractor {
    /// Create an extractor writing images into `image_dir`.
    pub fn new(image_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            materializer: ImageMaterializer::new(image_dir),
        }
    }
}

impl PageExtractor for RasterExtractor {
    fn variant(&self) -> ExtractionVariant {
        ExtractionVariant::Rasterizing
    }

    fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(self.materializer.output_dir())?;
        Ok(())
    }

    fn extract_page(&self, doc: &PdfDocument, page: PageRef) -> Result<PageRecord> {
        let text = doc.page_text(page)?;

        // An image drawn several times is saved once, at its first position.
        let mut seen = HashSet::new();
        let image_ids: Vec<_> = doc
            .image_placements(page)?
            .into_iter()
            .filter(|p| seen.insert(p.id))
            .map(|p| p.id)
            .collect();

        let mut images = Vec::with_capacity(image_ids.len());
        for (i, id) in image_ids.into_iter().enumerate() {
            match self.materializer.materialize(doc, id, page.number, i + 1) {
                Materialized::Image(image) => images.push(image),
                Materialized::Skipped(err) => log::warn!("{}", err),
            }
        }

        Ok(PageRecord::new(page.number, text, images))
    }
}

/// Reports image bounding boxes without decoding anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryExtractor;

impl PageExtractor for GeometryExtractor {
    fn variant(&self) -> ExtractionVariant {
        ExtractionVariant::GeometryOnly
    }

    fn extract_page(&self, doc: &PdfDocument, page: PageRef) -> Result<PageRecord> {
        let text = doc.page_text(page)?;
        let images: Vec<ImageRef> = doc
            .image_placements(page)?
            .iter()
            .map(ImageMaterializer::geometry)
            .collect();
        Ok(PageRecord::new(page.number, text, images))
    }
}

/// Drives a [`PageExtractor`] over every page of a document.
pub struct DocumentExtractor {
    page_extractor: Box<dyn PageExtractor>,
    options: ExtractOptions,
}

impl DocumentExtractor {
    /// Create a document extractor for the given variant.
    pub fn new(variant: ExtractionVariant, options: ExtractOptions) -> Self {
        let page_extractor: Box<dyn PageExtractor> = match variant {
            ExtractionVariant::Rasterizing => Box::new(RasterExtractor::new(options.image_dir.clone())),
            ExtractionVariant::GeometryOnly => Box::new(GeometryExtractor),
        };
        Self::with_page_extractor(page_extractor, options)
    }

    /// Create a document extractor around a custom page extractor.
    pub fn with_page_extractor(page_extractor: Box<dyn PageExtractor>, options: ExtractOptions) -> Self {
        Self {
            page_extractor,
            options,
        }
    }

    /// Variant of the underlying page extractor.
    pub fn variant(&self) -> ExtractionVariant {
        self.page_extractor.variant()
    }

    /// Extract every page of the document at `path`, in page order.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PageRecord>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        log::info!(
            "Extracting content from {} using the {} extractor",
            path.display(),
            self.variant()
        );

        let doc = PdfDocument::open(path)?;
        self.extract_document(&doc)
    }

    /// Extract every page of an already opened document.
    pub fn extract_document(&self, doc: &PdfDocument) -> Result<Vec<PageRecord>> {
        self.page_extractor.prepare()?;

        let pages = doc.pages();
        let mut records = Vec::with_capacity(pages.len());

        for page in pages {
            if self.options.is_cancelled() {
                return Err(Error::Cancelled(records.len() as u32));
            }

            match self.page_extractor.extract_page(doc, page) {
                Ok(record) => records.push(record),
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Failed to extract page {}: {}", page.number, e);
                    records.push(PageRecord::empty(page.number));
                }
                Err(e) => return Err(e),
            }
        }

        log::info!("Successfully extracted content from {} pages", records.len());
        Ok(records)
    }
}

impl std::fmt::Debug for DocumentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentExtractor")
            .field("variant", &self.variant())
            .field("options", &self.options)
            .finish()
    }
}
