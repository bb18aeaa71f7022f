//! Document handle over lopdf.
//!
//! [`PdfDocument`] owns the parsed file for the duration of one extraction
//! call and exposes the few page-level queries the extractors need: page
//! enumeration, page text, and image placements found by walking the
//! content stream.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::text::{collect_text, decode_text_simple};
use crate::error::{Error, Result};
use crate::model::BoundingBox;

/// Maximum Form XObject nesting followed when looking for images.
const MAX_FORM_DEPTH: u8 = 8;

/// A page of an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page object id
    pub id: ObjectId,
}

/// One drawing of an Image XObject on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Resource name the image was drawn under (e.g. `Im0`)
    pub name: String,
    /// Image XObject id
    pub id: ObjectId,
    /// Unit square mapped through the CTM at the time of drawing
    pub bbox: BoundingBox,
}

/// An open PDF document.
pub struct PdfDocument {
    doc: LopdfDocument,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("version", &self.doc.version)
            .field("pages", &self.page_count())
            .finish()
    }
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path).map_err(open_error)?;
        Ok(Self { doc })
    }

    /// Open a PDF held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(open_error)?;
        Ok(Self { doc })
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// All pages in ascending page-number order.
    pub fn pages(&self) -> Vec<PageRef> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(number, id)| PageRef { number, id })
            .collect()
    }

    /// Full text of a page, one line per baseline, trimmed.
    pub fn page_text(&self, page: PageRef) -> Result<String> {
        let content = self.page_content(page.id)?;
        let fonts = self
            .doc
            .get_page_fonts(page.id)
            .map_err(|e| Error::TextExtract(format!("Page {}: {}", page.number, e)))?;
        let encodings: BTreeMap<Vec<u8>, _> = fonts
            .into_iter()
            .filter_map(|(name, font)| {
                font.get_font_encoding(&self.doc)
                    .ok()
                    .map(|encoding| (name, encoding))
            })
            .collect();

        let text = collect_text(&content, |font, bytes| match encodings.get(font) {
            Some(encoding) => LopdfDocument::decode_text(encoding, bytes).unwrap_or_default(),
            None => decode_text_simple(bytes),
        })
        .map_err(|e| Error::TextExtract(format!("Page {}: {}", page.number, e)))?;

        Ok(text.trim().to_string())
    }

    /// Image placements on a page, in content-stream order.
    pub fn image_placements(&self, page: PageRef) -> Result<Vec<ImagePlacement>> {
        let content = self.page_content(page.id)?;
        let resources = self.page_resources(page.id);
        let mut placements = Vec::new();
        self.walk_content(&content, resources, Matrix::IDENTITY, 0, &mut placements)?;
        Ok(placements)
    }

    /// Look up an object, following a reference if needed.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Fetch a stream object by id.
    pub fn stream(&self, id: ObjectId) -> Result<&Stream> {
        match self.doc.get_object(id)? {
            Object::Stream(stream) => Ok(stream),
            _ => Err(Error::PdfParse(format!(
                "object {} {} is not a stream",
                id.0, id.1
            ))),
        }
    }

    /// Look up a dictionary value, following a reference if needed.
    pub fn dict_get<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        dict.get(key).ok().map(|obj| self.resolve(obj))
    }

    /// Decompressed content of a page; an absent `/Contents` is empty.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(Vec::new()),
        };

        match self.resolve(contents) {
            Object::Stream(s) => Ok(stream_bytes(s)),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    match self.resolve(obj) {
                        Object::Stream(s) => {
                            content.extend_from_slice(&stream_bytes(s));
                            content.push(b'\n');
                        }
                        _ => return Err(Error::PdfParse("Invalid content stream".to_string())),
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    /// Resources of a page, inherited from ancestor page-tree nodes when
    /// the page itself has none.
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        // Bounded in case of a cyclic /Parent chain.
        for _ in 0..64 {
            if let Some(Object::Dictionary(res)) = self.dict_get(node, b"Resources") {
                return Some(res);
            }
            node = match self.dict_get(node, b"Parent") {
                Some(Object::Dictionary(parent)) => parent,
                _ => return None,
            };
        }
        None
    }

    fn walk_content(
        &self,
        content: &[u8],
        resources: Option<&Dictionary>,
        base: Matrix,
        depth: u8,
        placements: &mut Vec<ImagePlacement>,
    ) -> Result<()> {
        let content = Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut ctm = base;
        let mut saved: Vec<Matrix> = Vec::new();

        for op in &content.operations {
            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => {
                    if let Some(m) = saved.pop() {
                        ctm = m;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.concat(&ctm);
                    }
                }
                "Do" => {
                    let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) else {
                        continue;
                    };
                    let Some(id) = resources.and_then(|res| self.xobject_id(res, name)) else {
                        log::debug!(
                            "XObject /{} not found in resources",
                            String::from_utf8_lossy(name)
                        );
                        continue;
                    };
                    let Ok(stream) = self.stream(id) else {
                        continue;
                    };

                    match stream.dict.get(b"Subtype").and_then(Object::as_name) {
                        Ok(b"Image") => placements.push(ImagePlacement {
                            name: String::from_utf8_lossy(name).to_string(),
                            id,
                            bbox: ctm.unit_square_bbox(),
                        }),
                        Ok(b"Form") if depth < MAX_FORM_DEPTH => {
                            let matrix = self
                                .dict_get(&stream.dict, b"Matrix")
                                .and_then(|m| m.as_array().ok())
                                .and_then(|arr| Matrix::from_operands(arr))
                                .unwrap_or(Matrix::IDENTITY);
                            let form_resources = match self.dict_get(&stream.dict, b"Resources") {
                                Some(Object::Dictionary(d)) => Some(d),
                                _ => resources,
                            };
                            self.walk_content(
                                &stream_bytes(stream),
                                form_resources,
                                matrix.concat(&ctm),
                                depth + 1,
                                placements,
                            )?;
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn xobject_id(&self, resources: &Dictionary, name: &[u8]) -> Option<ObjectId> {
        match self.dict_get(resources, b"XObject")? {
            Object::Dictionary(xobjects) => xobjects.get(name).ok()?.as_reference().ok(),
            _ => None,
        }
    }
}

fn open_error(err: lopdf::Error) -> Error {
    match err {
        lopdf::Error::IO(e) => Error::Io(e),
        lopdf::Error::Decryption(_) => Error::Encrypted,
        _ => Error::DocumentOpen(err.to_string()),
    }
}

/// Stream data with filters removed; unfiltered streams are returned as-is.
fn stream_bytes(stream: &Stream) -> Vec<u8> {
    if stream.dict.get(b"Filter").is_err() {
        return stream.content.clone();
    }
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// Helper to extract number from PDF object.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Build from six numeric operands.
    pub fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Self {
            a: get_number(&operands[0]).unwrap_or(1.0),
            b: get_number(&operands[1]).unwrap_or(0.0),
            c: get_number(&operands[2]).unwrap_or(0.0),
            d: get_number(&operands[3]).unwrap_or(1.0),
            e: get_number(&operands[4]).unwrap_or(0.0),
            f: get_number(&operands[5]).unwrap_or(0.0),
        })
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Bounding box of the unit square under this transform.
    pub fn unit_square_bbox(&self) -> BoundingBox {
        BoundingBox::enclosing(&[
            self.apply(0.0, 0.0),
            self.apply(1.0, 0.0),
            self.apply(0.0, 1.0),
            self.apply(1.0, 1.0),
        ])
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}
