use mupdf::{Document as MuDocument, TextPageFlags};

use scholar_overlap_core::{BackendError, Document, DocumentBackend, Page};

pub mod stext;

pub use stext::parse_stext_blocks;

/// MuPDF-based implementation of [`DocumentBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so the extraction and comparison crates never link it.
///
/// Styled spans come from the text page's structured-text XML, which reports
/// each glyph's color; the page's plain text comes from the same text page.
/// The MuPDF document is dropped when `decode` returns, on success and on
/// error alike.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    _private: (),
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentBackend for MupdfBackend {
    fn decode(&self, bytes: &[u8]) -> Result<Document, BackendError> {
        let document = MuDocument::from_bytes(bytes, "application/pdf")
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages = Vec::new();

        for (index, page_result) in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            .enumerate()
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let xml = text_page
                .to_xml(index as i32)
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let blocks = parse_stext_blocks(&xml)?;

            // One output line per layout line, in block order
            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }

            tracing::trace!(page = index, blocks = blocks.len(), "decoded page");
            pages.push(Page::new(index, blocks).with_text(page_text));
        }

        Ok(Document::new(pages))
    }
}
