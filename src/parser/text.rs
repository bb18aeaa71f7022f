//! Page text from content-stream text operators.
//!
//! Text is emitted in content-stream order. A span whose baseline differs
//! from the previous span's starts a new line, so `Td`/`TD`/`T*`/`Tm`/`'`/`"`
//! moves and separate text objects at different heights all become line
//! breaks. Horizontal moves on the same baseline become a single space.

use lopdf::content::Content;
use lopdf::Object;

use super::backend::get_number;
use crate::error::{Error, Result};

/// Baselines closer than this are treated as the same line.
const LINE_TOLERANCE: f32 = 1.0;

/// `TJ` adjustments beyond this (thousandths of an em) read as a word gap.
const SPACE_THRESHOLD: f32 = 200.0;

/// Text line matrix plus leading.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            leading: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, operands: &[Object]) {
        if operands.len() < 6 {
            return;
        }
        let n = |i: usize, default: f32| get_number(&operands[i]).unwrap_or(default);
        self.a = n(0, 1.0);
        self.b = n(1, 0.0);
        self.c = n(2, 0.0);
        self.d = n(3, 1.0);
        self.e = n(4, 0.0);
        self.f = n(5, 0.0);
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        // Without TL the leading is zero; fall back to a nominal line.
        let leading = if self.leading == 0.0 { 12.0 } else { self.leading };
        self.translate(0.0, -leading);
    }
}

/// Accumulates spans into newline-separated lines.
#[derive(Debug, Default)]
struct LineWriter {
    text: String,
    line_y: Option<f32>,
    gap: bool,
}

impl LineWriter {
    fn push(&mut self, y: f32, span: &str) {
        if span.is_empty() {
            return;
        }
        match self.line_y {
            Some(prev) if (prev - y).abs() <= LINE_TOLERANCE => {
                if self.gap
                    && !self.text.ends_with(char::is_whitespace)
                    && !span.starts_with(char::is_whitespace)
                {
                    self.text.push(' ');
                }
            }
            Some(_) => self.text.push('\n'),
            None => {}
        }
        self.text.push_str(span);
        self.line_y = Some(y);
        self.gap = false;
    }
}

/// Collect the text of a content stream.
///
/// `decode` turns a string operand into text given the current font
/// resource name.
pub(crate) fn collect_text<F>(content: &[u8], decode: F) -> Result<String>
where
    F: Fn(&[u8], &[u8]) -> String,
{
    let content = Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut writer = LineWriter::default();
    let mut matrix = TextMatrix::default();
    let mut font: Vec<u8> = Vec::new();

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                let leading = matrix.leading;
                matrix = TextMatrix {
                    leading,
                    ..TextMatrix::default()
                };
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    font = name.clone();
                }
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(get_number) {
                    matrix.leading = leading;
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        matrix.leading = -ty;
                    }
                    matrix.translate(tx, ty);
                    if tx != 0.0 {
                        writer.gap = true;
                    }
                }
            }
            "Tm" => {
                matrix.set(&op.operands);
                writer.gap = true;
            }
            "T*" => matrix.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    writer.push(matrix.f, &decode(font.as_slice(), bytes.as_slice()));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let mut combined = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                combined.push_str(&decode(font.as_slice(), bytes.as_slice()))
                            }
                            other => {
                                let adjustment = -get_number(other).unwrap_or(0.0);
                                if adjustment > SPACE_THRESHOLD
                                    && !combined.is_empty()
                                    && !combined.ends_with(' ')
                                {
                                    combined.push(' ');
                                }
                            }
                        }
                    }
                    writer.push(matrix.f, &combined);
                }
            }
            "'" | "\"" => {
                matrix.next_line();
                let index = if op.operator == "\"" { 2 } else { 0 };
                if let Some(Object::String(bytes, _)) = op.operands.get(index) {
                    writer.push(matrix.f, &decode(font.as_slice(), bytes.as_slice()));
                }
            }
            _ => {}
        }
    }

    Ok(writer.text)
}

/// Decoding used when a font has no usable encoding.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
