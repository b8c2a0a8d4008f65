use crate::{Block, Document, Page};

/// Text found in the page header of a Google Scholar profile export.
pub const DEFAULT_MARKER: &str = "Google Scholar";

/// Text of the physically topmost text block of `page`, its span texts
/// joined with single spaces.
///
/// The topmost block is the one with the smallest top coordinate; on a tie
/// the first block encountered wins. A page without text blocks yields an
/// empty string.
pub fn topmost_block_text(page: &Page) -> String {
    let mut topmost: Option<&Block> = None;
    for block in page.text_blocks() {
        if topmost.is_none_or(|t| block.bbox().top() < t.bbox().top()) {
            topmost = Some(block);
        }
    }
    topmost
        .map(|b| b.spans().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Classifies documents by a marker in the header of their first page.
#[derive(Debug, Clone)]
pub struct FormatDetector {
    marker: String,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl FormatDetector {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether the topmost text block of the first page contains the marker.
    /// Documents without pages never match.
    pub fn matches(&self, document: &Document) -> bool {
        let header = document
            .first_page()
            .map(topmost_block_text)
            .unwrap_or_default();
        let matched = header.contains(&self.marker);
        tracing::debug!(header = %header, marker = %self.marker, matched, "format detection");
        matched
    }
}
