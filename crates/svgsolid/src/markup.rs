use crate::error::{ConvertError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// Counts of markup features that do not turn into solid outlines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupCensus {
    /// `<text>` elements; only glyphs already converted to paths are imported.
    pub text_elements: usize,
    /// Embedded raster `<image>` elements.
    pub images: usize,
    /// Gradient and pattern paint servers.
    pub paint_servers: usize,
    /// Shapes drawn with a stroke but no fill.
    pub stroke_only: usize,
}

const SHAPE_ELEMENTS: &[&[u8]] = &[
    b"path",
    b"rect",
    b"circle",
    b"ellipse",
    b"polygon",
    b"polyline",
    b"line",
];

impl MarkupCensus {
    /// Scan raw markup. Markup that is not well-formed XML is a parse error.
    pub fn scan(markup: &str) -> Result<Self> {
        let mut reader = Reader::from_str(markup);
        reader.trim_text(true);

        let mut census = Self::default();
        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) | Ok(Event::Empty(element)) => census.record(&element),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    return Err(ConvertError::Parse(format!(
                        "malformed markup at byte {}: {}",
                        reader.buffer_position(),
                        err
                    )))
                }
            }
        }
        Ok(census)
    }

    fn record(&mut self, element: &BytesStart<'_>) {
        let name = element.local_name();
        match name.as_ref() {
            b"text" => self.text_elements += 1,
            b"image" => self.images += 1,
            b"linearGradient" | b"radialGradient" | b"pattern" => self.paint_servers += 1,
            shape if SHAPE_ELEMENTS.contains(&shape) => {
                if is_stroke_only(element) {
                    self.stroke_only += 1;
                }
            }
            _ => {}
        }
    }

    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// True when the element declares `fill: none` and a stroke, via attributes or inline style.
fn is_stroke_only(element: &BytesStart<'_>) -> bool {
    let mut fill_none = false;
    let mut stroked = false;
    for attr in element.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"fill" => fill_none = value.trim() == "none",
            b"stroke" => stroked = value.trim() != "none",
            b"style" => {
                for declaration in value.split(';') {
                    let Some((property, setting)) = declaration.split_once(':') else {
                        continue;
                    };
                    match property.trim() {
                        "fill" => fill_none = setting.trim() == "none",
                        "stroke" => stroked = setting.trim() != "none",
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    fill_none && stroked
}
