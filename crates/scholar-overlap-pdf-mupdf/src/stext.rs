//! Parser for MuPDF's structured-text XML (`stext`) output.
//!
//! The XML carries one `<char>` element per glyph with its quad, color and
//! the enclosing `<font>`. Spans are rebuilt from runs of characters:
//! consecutive characters of a line sharing font, size and color form one
//! span. Anything the parser does not recognise is skipped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use scholar_overlap_core::{BBox, BackendError, Block, Line, Span};

struct SpanBuilder {
    text: String,
    color: u32,
    font: String,
    size: f32,
    bbox: Option<BBox>,
}

impl SpanBuilder {
    fn same_style(&self, color: u32, font: &str, size: f32) -> bool {
        self.color == color && self.font == font && self.size == size
    }

    fn build(self) -> Span {
        Span {
            text: self.text,
            color: self.color,
            bbox: self.bbox.unwrap_or_default(),
            font: self.font,
            size: self.size,
        }
    }
}

#[derive(Default)]
struct LineBuilder {
    bbox: Option<BBox>,
    spans: Vec<Span>,
    current: Option<SpanBuilder>,
}

impl LineBuilder {
    fn push_char(&mut self, c: &str, color: u32, font: &str, size: f32, quad: Option<BBox>) {
        let extend = self
            .current
            .as_ref()
            .is_some_and(|s| s.same_style(color, font, size));
        if !extend {
            self.flush_span();
            self.current = Some(SpanBuilder {
                text: String::new(),
                color,
                font: font.to_string(),
                size,
                bbox: None,
            });
        }
        if let Some(span) = self.current.as_mut() {
            span.text.push_str(c);
            span.bbox = match (span.bbox, quad) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                (a, b) => a.or(b),
            };
        }
    }

    fn flush_span(&mut self) {
        if let Some(span) = self.current.take() {
            self.spans.push(span.build());
        }
    }

    fn build(mut self) -> Option<Line> {
        self.flush_span();
        if self.spans.is_empty() {
            return None;
        }
        let mut line = Line::new(self.spans);
        if let Some(bbox) = self.bbox {
            line.bbox = bbox;
        }
        Some(line)
    }
}

#[derive(Default)]
struct BlockBuilder {
    bbox: Option<BBox>,
    lines: Vec<Line>,
}

impl BlockBuilder {
    fn build(self) -> Option<Block> {
        if self.lines.is_empty() {
            return None;
        }
        let bbox = self.bbox.unwrap_or_else(|| {
            self.lines
                .iter()
                .map(|l| l.bbox)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_default()
        });
        Some(Block::text(bbox, self.lines))
    }
}

/// Parse the blocks of one page from MuPDF stext XML.
pub fn parse_stext_blocks(xml: &str) -> Result<Vec<Block>, BackendError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut blocks = Vec::new();
    let mut block: Option<BlockBuilder> = None;
    let mut line: Option<LineBuilder> = None;
    let mut font = String::new();
    let mut size = 0.0f32;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| BackendError::ExtractionError(format!("stext XML: {}", e)))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"block" => {
                    if let Some(b) = block.take().and_then(BlockBuilder::build) {
                        blocks.push(b);
                    }
                    block = Some(BlockBuilder {
                        bbox: attr(&e, "bbox").and_then(|v| parse_bbox(&v)),
                        lines: Vec::new(),
                    });
                }
                b"line" => {
                    line = Some(LineBuilder {
                        bbox: attr(&e, "bbox").and_then(|v| parse_bbox(&v)),
                        ..Default::default()
                    });
                }
                b"font" => {
                    font = attr(&e, "name").unwrap_or_default();
                    size = attr(&e, "size")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0.0);
                }
                b"image" => push_other(&mut blocks, &e),
                b"char" => push_char(&mut line, &e, &font, size),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"char" => push_char(&mut line, &e, &font, size),
                b"image" => push_other(&mut blocks, &e),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"line" => {
                    if let Some(l) = line.take().and_then(LineBuilder::build) {
                        match block.as_mut() {
                            Some(b) => b.lines.push(l),
                            None => tracing::trace!("line outside of a block, skipped"),
                        }
                    }
                }
                b"block" => {
                    if let Some(b) = block.take().and_then(BlockBuilder::build) {
                        blocks.push(b);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(blocks)
}

fn push_char(line: &mut Option<LineBuilder>, e: &BytesStart<'_>, font: &str, size: f32) {
    let Some(line) = line.as_mut() else {
        tracing::trace!("char outside of a line, skipped");
        return;
    };
    let Some(c) = attr(e, "c") else {
        return;
    };
    let color = attr(e, "color").and_then(|v| parse_color(&v)).unwrap_or(0);
    let quad = attr(e, "quad").and_then(|v| parse_quad(&v));
    line.push_char(&c, color, font, size, quad);
}

fn push_other(blocks: &mut Vec<Block>, e: &BytesStart<'_>) {
    let bbox = attr(e, "bbox").and_then(|v| parse_bbox(&v)).unwrap_or_default();
    blocks.push(Block::Other { bbox });
}

fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn parse_floats(value: &str) -> Vec<f32> {
    value
        .split_whitespace()
        .filter_map(|v| v.parse().ok())
        .collect()
}

/// `"x0 y0 x1 y1"`
fn parse_bbox(value: &str) -> Option<BBox> {
    match parse_floats(value).as_slice() {
        [x0, y0, x1, y1] => Some(BBox::new(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}

/// `"ulx uly urx ury llx lly lrx lry"`, reduced to its bounding rectangle.
fn parse_quad(value: &str) -> Option<BBox> {
    let v = parse_floats(value);
    if v.len() != 8 {
        return None;
    }
    let xs = [v[0], v[2], v[4], v[6]];
    let ys = [v[1], v[3], v[5], v[7]];
    Some(BBox::new(
        xs.iter().copied().fold(f32::INFINITY, f32::min),
        ys.iter().copied().fold(f32::INFINITY, f32::min),
        xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        ys.iter().copied().fold(f32::NEG_INFINITY, f32::max),
    ))
}

/// `"#rrggbb"` → `0xRRGGBB`.
fn parse_color(value: &str) -> Option<u32> {
    let hex = value.trim().trim_start_matches('#');
    u32::from_str_radix(hex, 16).ok().map(|c| c & 0x00FF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(c: &str, x: f32, color: &str) -> String {
        format!(
            r##"<char quad="{x} 10 {x2} 10 {x} 20 {x2} 20" x="{x}" y="18" bidi="0" color="{color}" alpha="#ff" flags="0" c="{c}"/>"##,
            x = x,
            x2 = x + 5.0,
            color = color,
            c = c,
        )
    }

    fn sample_page() -> String {
        let mut xml = String::from(r#"<page id="page1" width="612" height="792">"#);
        xml.push_str(r#"<block bbox="40 12 300 24"><line bbox="40 12 300 24" wmode="0" dir="1 0">"#);
        xml.push_str(r#"<font name="Arial" size="10">"#);
        for (i, c) in "Scholar".chars().enumerate() {
            xml.push_str(&ch(&c.to_string(), 40.0 + i as f32 * 5.0, "#000000"));
        }
        xml.push_str("</font></line></block>");
        xml.push_str(r#"<image bbox="0 0 30 30"/>"#);
        xml.push_str(r#"<block bbox="40 100 300 130"><line bbox="40 100 300 110" wmode="0" dir="1 0">"#);
        xml.push_str(r#"<font name="Arial" size="11">"#);
        xml.push_str(&ch("A", 40.0, "#1a0dab"));
        xml.push_str(&ch(" ", 45.0, "#1a0dab"));
        xml.push_str(&ch("B", 50.0, "#1a0dab"));
        xml.push_str(&ch("x", 55.0, "#777777"));
        xml.push_str("</font></line></block></page>");
        xml
    }

    #[test]
    fn test_parses_blocks_and_images() {
        let blocks = parse_stext_blocks(&sample_page()).unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].is_text());
        assert!(!blocks[1].is_text());
        assert_eq!(blocks[0].bbox(), BBox::new(40.0, 12.0, 300.0, 24.0));
    }

    #[test]
    fn test_chars_grouped_into_spans_by_color() {
        let blocks = parse_stext_blocks(&sample_page()).unwrap();
        let spans: Vec<&Span> = blocks[2].spans().collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "A B");
        assert_eq!(spans[0].color, 0x1A0DAB);
        assert_eq!(spans[0].font, "Arial");
        assert_eq!(spans[0].size, 11.0);
        assert_eq!(spans[1].text, "x");
        assert_eq!(spans[1].color, 0x777777);
    }

    #[test]
    fn test_span_bbox_covers_chars() {
        let blocks = parse_stext_blocks(&sample_page()).unwrap();
        let first = blocks[0].spans().next().unwrap();
        assert_eq!(first.text, "Scholar");
        assert_eq!(first.bbox, BBox::new(40.0, 10.0, 75.0, 20.0));
    }

    #[test]
    fn test_font_change_splits_span() {
        let xml = format!(
            r#"<page><block bbox="0 0 10 10"><line bbox="0 0 10 10"><font name="A" size="9">{}</font><font name="A-Bold" size="9">{}</font></line></block></page>"#,
            ch("a", 0.0, "#000000"),
            ch("b", 5.0, "#000000"),
        );
        let blocks = parse_stext_blocks(&xml).unwrap();
        assert_eq!(blocks[0].spans().count(), 2);
    }

    #[test]
    fn test_escaped_characters() {
        let xml = r##"<page><block bbox="0 0 1 1"><line bbox="0 0 1 1"><font name="F" size="1"><char quad="0 0 1 0 0 1 1 1" color="#000000" c="&amp;"/><char quad="0 0 1 0 0 1 1 1" color="#000000" c="&lt;"/></font></line></block></page>"##;
        let blocks = parse_stext_blocks(xml).unwrap();
        assert_eq!(blocks[0].spans().next().unwrap().text, "&<");
    }

    #[test]
    fn test_missing_attributes_are_tolerated() {
        // No bbox on the block, no color and no quad on the char.
        let xml = r#"<page><block><line><font name="F" size="1"><char c="z"/></font></line></block></page>"#;
        let blocks = parse_stext_blocks(xml).unwrap();
        assert_eq!(blocks.len(), 1);
        let span = blocks[0].spans().next().unwrap();
        assert_eq!(span.text, "z");
        assert_eq!(span.color, 0);
    }

    #[test]
    fn test_empty_blocks_dropped() {
        let xml = r#"<page><block bbox="0 0 1 1"><line bbox="0 0 1 1"></line></block></page>"#;
        assert!(parse_stext_blocks(xml).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let err = parse_stext_blocks("<page><block></line></page>").unwrap_err();
        assert!(matches!(err, BackendError::ExtractionError(_)));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#1a0dab"), Some(0x1A0DAB));
        assert_eq!(parse_color("#ff1a0dab"), Some(0x1A0DAB));
        assert_eq!(parse_color("blue"), None);
    }

    #[test]
    fn test_parse_bbox_requires_four_numbers() {
        assert_eq!(parse_bbox("1 2 3 4"), Some(BBox::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(parse_bbox("1 2 3"), None);
    }
}
