//! Helpers for building small PDFs in integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Initialize logging once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An image XObject plus the objects it links to.
#[derive(Clone)]
struct TestImage {
    stream: Stream,
    smask: Option<Stream>,
    icc_components: Option<i64>,
}

/// A page under construction.
#[derive(Default)]
pub struct TestPage {
    lines: Vec<String>,
    raw: Vec<String>,
    images: Vec<(String, TestImage)>,
    draws: Vec<(String, [f32; 4])>,
    broken_contents: bool,
}

impl TestPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line of text, drawn in its own text object.
    pub fn line(mut self, text: &str) -> Self {
        self.lines.push(text.to_string());
        self
    }

    /// Register an image XObject under `name` and draw it once at
    /// `[x, y, width, height]`.
    pub fn image(self, name: &str, stream: Stream, rect: [f32; 4]) -> Self {
        self.add_image(name, TestImage { stream, smask: None, icc_components: None }, rect)
    }

    /// Like [`TestPage::image`], with `mask` linked as the image's `/SMask`.
    pub fn masked_image(self, name: &str, stream: Stream, mask: Stream, rect: [f32; 4]) -> Self {
        self.add_image(name, TestImage { stream, smask: Some(mask), icc_components: None }, rect)
    }

    /// Like [`TestPage::image`], with colour space `[/ICCBased profile]`
    /// where the profile stream declares `components`.
    pub fn icc_image(self, name: &str, stream: Stream, components: i64, rect: [f32; 4]) -> Self {
        self.add_image(
            name,
            TestImage { stream, smask: None, icc_components: Some(components) },
            rect,
        )
    }

    fn add_image(mut self, name: &str, image: TestImage, rect: [f32; 4]) -> Self {
        self.images.push((name.to_string(), image));
        self.draws.push((name.to_string(), rect));
        self
    }

    /// Append content-stream operators verbatim.
    pub fn raw(mut self, content: &str) -> Self {
        self.raw.push(content.to_string());
        self
    }

    /// Draw an already registered image again.
    pub fn redraw(mut self, name: &str, rect: [f32; 4]) -> Self {
        self.draws.push((name.to_string(), rect));
        self
    }

    /// Point `/Contents` at a dictionary instead of a stream.
    pub fn broken(mut self) -> Self {
        self.broken_contents = true;
        self
    }

    fn content(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, line) in self.lines.iter().enumerate() {
            let y = 720 - 20 * i as i32;
            writeln!(out, "BT /F1 12 Tf 72 {} Td ({}) Tj ET", y, escape(line)).unwrap();
        }
        for raw in &self.raw {
            writeln!(out, "{}", raw).unwrap();
        }
        for (name, [x, y, w, h]) in &self.draws {
            writeln!(out, "q {} 0 0 {} {} {} cm /{} Do Q", w, h, x, y, name).unwrap();
        }
        out
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '(' | ')' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build a PDF with the given pages.
pub fn build_pdf(pages: Vec<TestPage>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for page in pages {
        let mut xobjects = Dictionary::new();
        for (name, image) in &page.images {
            let mut stream = image.stream.clone();
            if let Some(mask) = &image.smask {
                let mask_id = doc.add_object(Object::Stream(mask.clone()));
                stream.dict.set("SMask", mask_id);
            }
            if let Some(n) = image.icc_components {
                let profile_id = doc.add_object(Object::Stream(Stream::new(
                    dictionary! { "N" => n },
                    Vec::new(),
                )));
                stream.dict.set(
                    "ColorSpace",
                    vec![Object::Name(b"ICCBased".to_vec()), Object::from(profile_id)],
                );
            }
            let id = doc.add_object(Object::Stream(stream));
            xobjects.set(name.as_bytes().to_vec(), id);
        }

        let contents_id = if page.broken_contents {
            doc.add_object(dictionary! { "Length" => 0i64 })
        } else {
            doc.add_object(Object::Stream(Stream::new(Dictionary::new(), page.content())))
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => contents_id,
            "Resources" => Object::Dictionary(dictionary! {
                "Font" => Object::Dictionary(dictionary! { "F1" => font_id }),
                "XObject" => Object::Dictionary(xobjects),
            }),
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// Write a PDF into `dir` and return its path.
pub fn write_pdf(dir: &std::path::Path, name: &str, pages: Vec<TestPage>) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(pages)).unwrap();
    path
}

fn image_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8i64,
    }
}

/// Uncompressed DeviceRGB image filled with one color.
pub fn rgb_image(width: u32, height: u32, rgb: [u8; 3]) -> Stream {
    let data = rgb.repeat((width * height) as usize);
    Stream::new(image_dict(width, height, "DeviceRGB"), data)
}

/// Uncompressed DeviceCMYK image filled with one color.
pub fn cmyk_image(width: u32, height: u32, cmyk: [u8; 4]) -> Stream {
    let data = cmyk.repeat((width * height) as usize);
    Stream::new(image_dict(width, height, "DeviceCMYK"), data)
}

/// FlateDecode DeviceGray image filled with one value.
pub fn flate_gray_image(width: u32, height: u32, value: u8) -> Stream {
    let raw = vec![value; (width * height) as usize];
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&raw).unwrap();
    let data = encoder.finish().unwrap();

    let mut dict = image_dict(width, height, "DeviceGray");
    dict.set("Filter", "FlateDecode");
    Stream::new(dict, data).with_compression(false)
}

/// DCTDecode image holding a real JPEG.
pub fn jpeg_image(width: u32, height: u32) -> Stream {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut data = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Jpeg)
        .unwrap();

    let mut dict = image_dict(width, height, "DeviceRGB");
    dict.set("Filter", "DCTDecode");
    Stream::new(dict, data).with_compression(false)
}

/// DCTDecode image whose payload is not a JPEG.
pub fn corrupt_jpeg_image() -> Stream {
    let mut dict = image_dict(4, 4, "DeviceRGB");
    dict.set("Filter", "DCTDecode");
    Stream::new(dict, b"definitely not a jpeg".to_vec()).with_compression(false)
}

/// Uncompressed image with an arbitrary colour space and depth.
pub fn raw_image(width: i64, height: i64, color_space: Object, bpc: i64, data: Vec<u8>) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => color_space,
            "BitsPerComponent" => bpc,
        },
        data,
    )
}

/// Uncompressed DeviceGray image from explicit samples.
pub fn gray_image(width: u32, height: u32, samples: Vec<u8>) -> Stream {
    Stream::new(image_dict(width, height, "DeviceGray"), samples)
}

/// `[/Indexed /DeviceRGB hival lookup]` over 8-bit indices.
pub fn indexed_image(width: u32, height: u32, hival: i64, lookup: &[u8], indices: Vec<u8>) -> Stream {
    let color_space = Object::Array(vec![
        Object::Name(b"Indexed".to_vec()),
        Object::Name(b"DeviceRGB".to_vec()),
        Object::Integer(hival),
        Object::string_literal(lookup.to_vec()),
    ]);
    raw_image(width as i64, height as i64, color_space, 8, indices)
}

/// 1-bit stencil mask (`/ImageMask true`).
pub fn stencil_mask(width: u32, height: u32, data: Vec<u8>) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ImageMask" => true,
        },
        data,
    )
}

/// Image using a filter the materializer does not decode.
pub fn jpx_image() -> Stream {
    let mut dict = image_dict(2, 2, "DeviceRGB");
    dict.set("Filter", "JPXDecode");
    Stream::new(dict, vec![0; 12]).with_compression(false)
}
