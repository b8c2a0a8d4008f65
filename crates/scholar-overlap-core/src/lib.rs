pub mod backend;
pub mod compare;
pub mod config_file;
pub mod detect;
pub mod highlight;
pub mod normalize;
pub mod recency;
pub mod segment;
pub mod years;

// Re-export for convenience
pub use backend::{BackendError, DocumentBackend};
pub use compare::{ALL_RESEARCHERS_LABEL, ComparisonRow, ResearcherRecord, compare_records};
pub use detect::{DEFAULT_MARKER, FormatDetector, topmost_block_text};
pub use highlight::{BlueDominant, ExactColor, HighlightClassifier, is_highlighted};
pub use normalize::Normalization;
pub use recency::{DEFAULT_WINDOW_YEARS, RecencyFilter};
pub use segment::{ExtractedTitles, Segmenter, TitleExtractor};
pub use years::latest_year;

/// Axis-aligned rectangle in page coordinates.
///
/// The y axis grows downward, so `y0` is the top edge and a smaller `y0`
/// means the box sits higher on the page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn top(&self) -> f32 {
        self.y0
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A run of text sharing one style within a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    /// Packed sRGB color, `0xRRGGBB`.
    pub color: u32,
    pub bbox: BBox,
    pub font: String,
    pub size: f32,
}

impl Span {
    pub fn new(text: impl Into<String>, color: u32) -> Self {
        Self {
            text: text.into(),
            color,
            bbox: BBox::default(),
            font: String::new(),
            size: 0.0,
        }
    }

    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = bbox;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub bbox: BBox,
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new(spans: Vec<Span>) -> Self {
        let bbox = spans
            .iter()
            .map(|s| s.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        Self { bbox, spans }
    }
}

/// A layout block. Only text blocks carry lines; image and vector blocks
/// are kept for their position but ignored by every algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text { bbox: BBox, lines: Vec<Line> },
    Other { bbox: BBox },
}

impl Block {
    pub fn text(bbox: BBox, lines: Vec<Line>) -> Self {
        Block::Text { bbox, lines }
    }

    pub fn bbox(&self) -> BBox {
        match self {
            Block::Text { bbox, .. } | Block::Other { bbox } => *bbox,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Block::Text { .. })
    }

    pub fn lines(&self) -> &[Line] {
        match self {
            Block::Text { lines, .. } => lines,
            Block::Other { .. } => &[],
        }
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.lines().iter().flat_map(|l| l.spans.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// 0-based page index.
    pub index: usize,
    pub blocks: Vec<Block>,
    /// Plain text of the page, one layout line per text line.
    pub text: String,
}

impl Page {
    pub fn new(index: usize, blocks: Vec<Block>) -> Self {
        let text = blocks
            .iter()
            .flat_map(|b| b.lines())
            .map(|l| l.spans.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            index,
            blocks,
            text,
        }
    }

    /// Replace the derived plain text with the backend's own text extraction.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn text_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.is_text())
    }

    /// All spans of the page in block → line → span order.
    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.blocks.iter().flat_map(|b| b.spans())
    }
}

/// A decoded document. Built once per input and dropped after extraction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn first_page(&self) -> Option<&Page> {
        self.pages.first()
    }
}
