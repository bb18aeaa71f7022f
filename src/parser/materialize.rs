//! Image materialization.
//!
//! Turns one embedded image into an [`ImageRef`]: either a PNG written to
//! the image directory (raster path) or the placement box reported by the
//! content-stream walk (geometry path). A failing image is reported as
//! [`Materialized::Skipped`] so callers can drop it and keep going.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use lopdf::{Dictionary, Object, ObjectId, Stream};

use super::backend::{ImagePlacement, PdfDocument};
use crate::error::{Error, Result};
use crate::model::ImageRef;

/// Outcome of materializing one image.
#[derive(Debug)]
pub enum Materialized {
    /// The image was materialized.
    Image(ImageRef),
    /// The image could not be materialized; the error says why.
    Skipped(Error),
}

/// Deterministic file name for the `index`-th image of a page (both 1-based).
pub fn raster_file_name(page_number: u32, index: usize) -> String {
    format!("page_{}_image_{}.png", page_number, index)
}

/// Writes embedded images to disk as PNG files.
#[derive(Debug, Clone)]
pub struct ImageMaterializer {
    output_dir: PathBuf,
}

impl ImageMaterializer {
    /// Create a materializer writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory images are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Decode the image XObject `image_id` and save it as
    /// `page_{page_number}_image_{index}.png`.
    pub fn materialize(
        &self,
        doc: &PdfDocument,
        image_id: ObjectId,
        page_number: u32,
        index: usize,
    ) -> Materialized {
        match self.save(doc, image_id, page_number, index) {
            Ok(path) => Materialized::Image(ImageRef::raster(path)),
            Err(e) => Materialized::Skipped(Error::ImageMaterialization {
                page: page_number,
                index,
                reason: e.to_string(),
            }),
        }
    }

    /// Geometry-only materialization: no decoding, just the placement box.
    pub fn geometry(placement: &ImagePlacement) -> ImageRef {
        ImageRef::geometry(placement.bbox)
    }

    fn save(
        &self,
        doc: &PdfDocument,
        image_id: ObjectId,
        page_number: u32,
        index: usize,
    ) -> Result<PathBuf> {
        let image = decode_image(doc, doc.stream(image_id)?)?;
        let name = raster_file_name(page_number, index);
        let path = self.output_dir.join(&name);
        image.save_with_format(&path, ImageFormat::Png)?;
        log::debug!("Saved image: {}", name);
        Ok(path)
    }
}

/// Decode an Image XObject into pixels, normalizing colour where needed.
pub fn decode_image(doc: &PdfDocument, stream: &Stream) -> Result<DynamicImage> {
    let filters = filter_names(doc, &stream.dict);
    match filters.as_slice() {
        [f] if f == "DCTDecode" || f == "DCT" => {
            Ok(image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?)
        }
        _ => {
            let data = decoded_samples(stream, &filters)?;
            let mut pixmap = Pixmap::from_image_dict(doc, &stream.dict, &data)?;
            if let Some(mask) = soft_mask(doc, &stream.dict, &pixmap) {
                pixmap = pixmap.with_alpha(&mask)?;
            }
            pixmap.into_image()
        }
    }
}

fn filter_names(doc: &PdfDocument, dict: &Dictionary) -> Vec<String> {
    match doc.dict_get(dict, b"Filter") {
        Some(Object::Name(name)) => vec![String::from_utf8_lossy(name).to_string()],
        Some(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| doc.resolve(o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn decoded_samples(stream: &Stream, filters: &[String]) -> Result<Vec<u8>> {
    match filters {
        [] => Ok(stream.content.clone()),
        [f] if matches!(f.as_str(), "FlateDecode" | "Fl" | "LZWDecode" | "LZW") => stream
            .decompressed_content()
            .map_err(|e| Error::ImageDecode(format!("{}: {}", f, e))),
        _ => Err(Error::ImageDecode(format!(
            "unsupported image filter {}",
            filters.join(" ")
        ))),
    }
}

/// Decoded soft mask samples, when present and matching the image size.
fn soft_mask(doc: &PdfDocument, dict: &Dictionary, pixmap: &Pixmap) -> Option<Vec<u8>> {
    let id = dict.get(b"SMask").ok()?.as_reference().ok()?;
    let stream = doc.stream(id).ok()?;
    let filters = filter_names(doc, &stream.dict);
    let mask = decoded_samples(stream, &filters)
        .and_then(|data| Pixmap::from_image_dict(doc, &stream.dict, &data));
    match mask {
        Ok(mask)
            if mask.width == pixmap.width
                && mask.height == pixmap.height
                && mask.channels == 1 =>
        {
            Some(mask.samples)
        }
        Ok(_) => {
            log::debug!("Ignoring soft mask with mismatched layout");
            None
        }
        Err(e) => {
            log::debug!("Ignoring undecodable soft mask: {}", e);
            None
        }
    }
}

/// Image colour space, as far as raw sample decoding is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorSpace>,
        hival: u8,
        lookup: Vec<u8>,
    },
}

impl ColorSpace {
    /// Components per sample in the image data.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn from_object(doc: &PdfDocument, obj: &Object) -> Result<Self> {
        match doc.resolve(obj) {
            Object::Name(name) => Self::from_name(name),
            Object::Array(arr) => {
                let family = arr
                    .first()
                    .and_then(|o| doc.resolve(o).as_name().ok())
                    .ok_or_else(|| Error::ImageDecode("empty colour space array".to_string()))?;
                match family {
                    b"ICCBased" => {
                        let n = arr
                            .get(1)
                            .and_then(|o| o.as_reference().ok())
                            .and_then(|id| doc.stream(id).ok())
                            .and_then(|s| s.dict.get(b"N").ok())
                            .and_then(|n| n.as_i64().ok());
                        match n {
                            Some(1) => Ok(ColorSpace::Gray),
                            Some(3) => Ok(ColorSpace::Rgb),
                            Some(4) => Ok(ColorSpace::Cmyk),
                            _ => Err(Error::ImageDecode(format!(
                                "unsupported ICC component count {:?}",
                                n
                            ))),
                        }
                    }
                    b"Indexed" | b"I" => {
                        let base = arr
                            .get(1)
                            .ok_or_else(|| Error::ImageDecode("Indexed without base".to_string()))
                            .and_then(|b| Self::from_object(doc, b))?;
                        if matches!(base, ColorSpace::Indexed { .. }) {
                            return Err(Error::ImageDecode("nested Indexed colour space".into()));
                        }
                        let hival = arr
                            .get(2)
                            .and_then(|h| doc.resolve(h).as_i64().ok())
                            .unwrap_or(255)
                            .clamp(0, 255) as u8;
                        let lookup = match arr.get(3).map(|l| doc.resolve(l)) {
                            Some(Object::String(bytes, _)) => bytes.clone(),
                            Some(Object::Stream(s)) => decoded_samples(s, &filter_names(doc, &s.dict))?,
                            _ => {
                                return Err(Error::ImageDecode(
                                    "Indexed without lookup table".to_string(),
                                ))
                            }
                        };
                        Ok(ColorSpace::Indexed {
                            base: Box::new(base),
                            hival,
                            lookup,
                        })
                    }
                    other => Self::from_name(other),
                }
            }
            _ => Err(Error::ImageDecode("invalid colour space".to_string())),
        }
    }

    fn from_name(name: &[u8]) -> Result<Self> {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorSpace::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
            other => Err(Error::ImageDecode(format!(
                "unsupported colour space {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }
}

/// 8-bit interleaved pixel samples, optionally with a trailing alpha channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    /// Total channels per pixel, alpha included
    pub channels: u8,
    pub alpha: bool,
    pub samples: Vec<u8>,
}

impl Pixmap {
    /// Create a pixmap, checking the buffer length.
    pub fn new(width: u32, height: u32, channels: u8, alpha: bool, samples: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels as usize));
        if expected != Some(samples.len()) || channels == 0 || (alpha && channels < 2) {
            return Err(Error::ImageDecode(format!(
                "{} samples for {}x{}x{}",
                samples.len(),
                width,
                height,
                channels
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            alpha,
            samples,
        })
    }

    /// Decode raw image data described by an image dictionary.
    pub fn from_image_dict(doc: &PdfDocument, dict: &Dictionary, data: &[u8]) -> Result<Self> {
        let dimension = |key: &[u8]| -> Result<u32> {
            doc.dict_get(dict, key)
                .and_then(|o| o.as_i64().ok())
                .filter(|v| *v > 0 && *v <= u32::MAX as i64)
                .map(|v| v as u32)
                .ok_or_else(|| {
                    Error::ImageDecode(format!("missing {}", String::from_utf8_lossy(key)))
                })
        };
        let width = dimension(b"Width")?;
        let height = dimension(b"Height")?;

        let image_mask = matches!(doc.dict_get(dict, b"ImageMask"), Some(Object::Boolean(true)));
        let (color_space, bpc) = if image_mask {
            (ColorSpace::Gray, 1)
        } else {
            let cs = doc
                .dict_get(dict, b"ColorSpace")
                .ok_or_else(|| Error::ImageDecode("missing ColorSpace".to_string()))
                .and_then(|cs| ColorSpace::from_object(doc, cs))?;
            let bpc = match doc.dict_get(dict, b"BitsPerComponent") {
                Some(obj) => obj
                    .as_i64()
                    .ok()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| {
                        Error::ImageDecode(format!("invalid BitsPerComponent {:?}", obj))
                    })?,
                None => 8,
            };
            (cs, bpc)
        };

        let raw = unpack_samples(data, width, height, color_space.components(), bpc)?;

        match color_space {
            ColorSpace::Indexed {
                base,
                hival,
                lookup,
            } => {
                let n = base.components() as usize;
                let mut samples = Vec::with_capacity(raw.len() * n);
                for index in raw {
                    let start = index.min(hival) as usize * n;
                    match lookup.get(start..start + n) {
                        Some(entry) => samples.extend_from_slice(entry),
                        None => samples.extend(std::iter::repeat(0).take(n)),
                    }
                }
                Self::new(width, height, n as u8, false, samples)
            }
            cs => {
                let invert = decode_inverted(doc, dict);
                let samples = raw
                    .into_iter()
                    .map(|v| {
                        let v = scale_sample(v, bpc);
                        if invert {
                            255 - v
                        } else {
                            v
                        }
                    })
                    .collect();
                Self::new(width, height, cs.components(), false, samples)
            }
        }
    }

    /// Colour channels, alpha excluded.
    pub fn color_channels(&self) -> u8 {
        self.channels - self.alpha as u8
    }

    /// More than three colour channels cannot be written as PNG directly.
    pub fn needs_rgb_conversion(&self) -> bool {
        self.color_channels() > 3
    }

    /// Convert CMYK samples to RGB, keeping alpha.
    pub fn to_rgb(&self) -> Pixmap {
        let stride = self.channels as usize;
        let color = self.color_channels() as usize;
        let out_channels = 3 + self.alpha as usize;
        let mut samples = Vec::with_capacity(self.samples.len() / stride * out_channels);

        for px in self.samples.chunks_exact(stride) {
            let [r, g, b] = cmyk_to_rgb(px[0], px[1], px[2], px[3]);
            samples.extend_from_slice(&[r, g, b]);
            if self.alpha {
                samples.push(px[color]);
            }
        }

        Pixmap {
            width: self.width,
            height: self.height,
            channels: out_channels as u8,
            alpha: self.alpha,
            samples,
        }
    }

    /// Attach an 8-bit alpha plane.
    pub fn with_alpha(self, alpha: &[u8]) -> Result<Pixmap> {
        if self.alpha {
            return Ok(self);
        }
        let stride = self.channels as usize;
        let mut samples = Vec::with_capacity(self.samples.len() + alpha.len());
        for (px, a) in self.samples.chunks_exact(stride).zip(alpha) {
            samples.extend_from_slice(px);
            samples.push(*a);
        }
        Pixmap::new(self.width, self.height, self.channels + 1, true, samples)
    }

    /// Convert to a `DynamicImage`, normalizing to RGB when required.
    pub fn into_image(self) -> Result<DynamicImage> {
        let pixmap = if self.needs_rgb_conversion() {
            self.to_rgb()
        } else {
            self
        };
        let Pixmap {
            width,
            height,
            channels,
            alpha,
            samples,
        } = pixmap;

        let image = match (channels, alpha) {
            (1, false) => image::GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
            (2, true) => {
                image::GrayAlphaImage::from_raw(width, height, samples).map(DynamicImage::ImageLumaA8)
            }
            (3, false) => image::RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
            (4, true) => image::RgbaImage::from_raw(width, height, samples).map(DynamicImage::ImageRgba8),
            _ => None,
        };
        image.ok_or_else(|| {
            Error::ImageDecode(format!("cannot encode {} channel pixmap", channels))
        })
    }
}

/// Naive CMYK to RGB conversion.
pub fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 1.0 - k as f32 / 255.0;
    let channel = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
    [channel(c), channel(m), channel(y)]
}

/// Unpack packed samples into one byte per sample. Values are left
/// unscaled for depths below 8; 16-bit samples keep their high byte.
fn unpack_samples(data: &[u8], width: u32, height: u32, components: u8, bpc: u8) -> Result<Vec<u8>> {
    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(Error::ImageDecode(format!("unsupported BitsPerComponent {}", bpc)));
    }

    let bits = bpc as usize;
    let rows = height as usize;
    let too_large = || Error::ImageDecode(format!("image too large: {}x{}", width, height));
    let per_row = (width as usize)
        .checked_mul(components as usize)
        .ok_or_else(too_large)?;
    let stride = per_row
        .checked_mul(bits)
        .and_then(|b| b.checked_add(7))
        .ok_or_else(too_large)?
        / 8;
    let needed = stride.checked_mul(rows).ok_or_else(too_large)?;
    if data.len() < needed {
        return Err(Error::ImageDecode(format!(
            "image data truncated: {} of {} bytes",
            data.len(),
            needed
        )));
    }

    let mut out = Vec::with_capacity(per_row.checked_mul(rows).ok_or_else(too_large)?);
    for row in data.chunks_exact(stride).take(rows) {
        match bpc {
            8 => out.extend_from_slice(&row[..per_row]),
            16 => out.extend(row.chunks_exact(2).take(per_row).map(|pair| pair[0])),
            _ => {
                let mask = (1u8 << bpc) - 1;
                for i in 0..per_row {
                    let bit = i * bits;
                    let shift = 8 - bits - (bit % 8);
                    out.push((row[bit / 8] >> shift) & mask);
                }
            }
        }
    }
    Ok(out)
}

fn scale_sample(value: u8, bpc: u8) -> u8 {
    match bpc {
        1 => value * 255,
        2 => value * 85,
        4 => value * 17,
        _ => value,
    }
}

/// `/Decode [1 0 ...]` flips sample values.
fn decode_inverted(doc: &PdfDocument, dict: &Dictionary) -> bool {
    let Some(Object::Array(decode)) = doc.dict_get(dict, b"Decode") else {
        return false;
    };
    let lo = decode.first().and_then(super::backend::get_number);
    let hi = decode.get(1).and_then(super::backend::get_number);
    matches!((lo, hi), (Some(lo), Some(hi)) if lo > hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_raster_file_name() {
        assert_eq!(raster_file_name(1, 1), "page_1_image_1.png");
        assert_eq!(raster_file_name(12, 3), "page_12_image_3.png");
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(0, 0, 0, 0), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(0, 0, 0, 255), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(255, 0, 0, 0), [0, 255, 255]);
    }

    #[test]
    fn test_channel_rule() {
        let gray_alpha = Pixmap::new(1, 1, 2, true, vec![10, 255]).unwrap();
        assert_eq!(gray_alpha.color_channels(), 1);
        assert!(!gray_alpha.needs_rgb_conversion());

        let rgba = Pixmap::new(1, 1, 4, true, vec![1, 2, 3, 255]).unwrap();
        assert!(!rgba.needs_rgb_conversion());

        let cmyk = Pixmap::new(1, 1, 4, false, vec![0, 0, 0, 0]).unwrap();
        assert!(cmyk.needs_rgb_conversion());

        let cmyka = Pixmap::new(1, 1, 5, true, vec![0, 0, 0, 0, 128]).unwrap();
        assert!(cmyka.needs_rgb_conversion());
    }

    #[test]
    fn test_cmyk_alpha_to_rgba() {
        let cmyka = Pixmap::new(2, 1, 5, true, vec![0, 0, 0, 0, 128, 0, 0, 0, 255, 7]).unwrap();
        let rgba = cmyka.to_rgb();
        assert_eq!(rgba.channels, 4);
        assert_eq!(rgba.samples, vec![255, 255, 255, 128, 0, 0, 0, 7]);

        let image = Pixmap::new(1, 1, 4, false, vec![0, 0, 0, 255])
            .unwrap()
            .into_image()
            .unwrap();
        assert!(matches!(image, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_pixmap_length_checked() {
        assert!(Pixmap::new(2, 2, 3, false, vec![0; 11]).is_err());
    }

    #[test]
    fn test_unpack_one_bit() {
        // 3 pixels per row, rows padded to a full byte.
        let data = [0b1010_0000, 0b0110_0000];
        let samples = unpack_samples(&data, 3, 2, 1, 1).unwrap();
        assert_eq!(samples, vec![1, 0, 1, 0, 1, 1]);
    }

    #[test]
    fn test_unpack_four_and_sixteen_bit() {
        assert_eq!(unpack_samples(&[0xAB], 2, 1, 1, 4).unwrap(), vec![0xA, 0xB]);
        assert_eq!(
            unpack_samples(&[0x12, 0x34, 0x56, 0x78], 2, 1, 1, 16).unwrap(),
            vec![0x12, 0x56]
        );
    }

    #[test]
    fn test_unpack_truncated() {
        assert!(unpack_samples(&[0, 0], 2, 1, 3, 8).is_err());
        assert!(unpack_samples(&[0; 16], 2, 1, 3, 12).is_err());
    }

    #[test]
    fn test_unpack_huge_dimensions() {
        let result = unpack_samples(&[0; 12], u32::MAX, u32::MAX, 3, 8);
        assert!(matches!(result, Err(Error::ImageDecode(_))));
        assert!(unpack_samples(&[0; 12], u32::MAX, u32::MAX, 4, 16).is_err());
    }

    #[test]
    fn test_pixmap_huge_dimensions() {
        assert!(Pixmap::new(u32::MAX, u32::MAX, 4, false, Vec::new()).is_err());
        assert!(Pixmap::new(u32::MAX, 2, 3, false, vec![0; 6]).is_err());
    }

    fn blank_document() -> PdfDocument {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(lopdf::dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0i64,
            }),
        );
        let catalog_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        PdfDocument::from_bytes(&buf).unwrap()
    }

    fn gray_dict(bpc: i64) -> Dictionary {
        lopdf::dictionary! {
            "Width" => 2i64,
            "Height" => 2i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => bpc,
        }
    }

    #[test]
    fn test_bits_per_component_out_of_range() {
        let doc = blank_document();
        // 264 would wrap to 8 if truncated.
        for bpc in [264, -8, 3] {
            let result = Pixmap::from_image_dict(&doc, &gray_dict(bpc), &[0; 8]);
            assert!(matches!(result, Err(Error::ImageDecode(_))), "bpc {}", bpc);
        }
        assert!(Pixmap::from_image_dict(&doc, &gray_dict(8), &[0; 4]).is_ok());
    }

    #[test]
    fn test_scale_sample() {
        assert_eq!(scale_sample(1, 1), 255);
        assert_eq!(scale_sample(3, 2), 255);
        assert_eq!(scale_sample(15, 4), 255);
        assert_eq!(scale_sample(200, 8), 200);
    }
}
