use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use scholar_overlap_core::{
    BackendError, DocumentBackend, ExtractedTitles, FormatDetector, RecencyFilter,
    ResearcherRecord, TitleExtractor,
};

pub mod archive;

pub use archive::{ArchiveExpansion, expand_archive, is_archive_name};

/// Default cap on bytes extracted from a single archive.
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 200 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("input is empty")]
    EmptyInput,
    #[error("input is not a PDF")]
    NotPdf,
    #[error("not detected as a {marker} PDF")]
    FormatMismatch { marker: String },
    #[error("PDF decoding error: {0}")]
    Backend(#[from] BackendError),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),
}

/// How far into a file the `%PDF-` header may appear.
const PDF_HEADER_WINDOW: usize = 1024;

/// Whether `bytes` carries a `%PDF-` header within the first kilobyte.
/// Leading junk such as a byte-order mark is tolerated, as MuPDF does.
pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// An uploaded item: a display name and its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl NamedInput {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Knobs for the per-document pipeline.
pub struct IngestOptions {
    pub detector: FormatDetector,
    pub extractor: TitleExtractor,
    /// When set, records keep only titles dated within the window.
    pub recency: Option<RecencyFilter>,
    /// Accept documents whose header lacks the marker.
    pub skip_detection: bool,
    /// Byte cap per archive (0 = unlimited).
    pub max_archive_size: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            detector: FormatDetector::default(),
            extractor: TitleExtractor::default(),
            recency: None,
            skip_detection: false,
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
        }
    }
}

impl IngestOptions {
    pub fn with_detector(mut self, detector: FormatDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Enable the recency filter. Year association is switched on with it,
    /// since the filter needs dated titles.
    pub fn with_recency(mut self, filter: RecencyFilter) -> Self {
        self.extractor = std::mem::take(&mut self.extractor).with_year_association(true);
        self.recency = Some(filter);
        self
    }

    pub fn with_skip_detection(mut self, skip: bool) -> Self {
        self.skip_detection = skip;
        self
    }

    pub fn with_max_archive_size(mut self, bytes: u64) -> Self {
        self.max_archive_size = bytes;
        self
    }
}

/// A document that passed detection, with its titles and comparison record.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub name: String,
    pub page_count: usize,
    /// Every extracted title, with its associated year when known.
    pub titles: ExtractedTitles,
    /// The titles that take part in comparison (after the recency filter).
    pub record: ResearcherRecord,
}

/// An item that was skipped, and why.
#[derive(Debug)]
pub struct IngestIssue {
    pub name: String,
    pub error: IngestError,
}

/// Outcome of ingesting a batch. Failures are isolated per item.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<IngestedDocument>,
    pub issues: Vec<IngestIssue>,
    /// Non-fatal notices such as archive size limits.
    pub warnings: Vec<String>,
}

impl IngestReport {
    pub fn records(&self) -> Vec<ResearcherRecord> {
        self.documents.iter().map(|d| d.record.clone()).collect()
    }

    /// Comparison needs at least two valid documents.
    pub fn has_enough_records(&self) -> bool {
        self.documents.len() >= 2
    }
}

/// Read one file into a [`NamedInput`] named after its file name.
pub fn read_input(path: &Path) -> Result<NamedInput, IngestError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::read(path)?;
    Ok(NamedInput::new(name, bytes))
}

/// Read every path. Unreadable paths become issues instead of aborting.
pub fn read_inputs<P: AsRef<Path>>(paths: &[P]) -> (Vec<NamedInput>, Vec<IngestIssue>) {
    let mut inputs = Vec::new();
    let mut issues = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match read_input(path) {
            Ok(input) => inputs.push(input),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "skipping unreadable input"
                );
                issues.push(IngestIssue {
                    name: path.display().to_string(),
                    error,
                });
            }
        }
    }
    (inputs, issues)
}

/// Reject zero-length items and items without a PDF header.
pub fn validate_input(input: &NamedInput) -> Result<(), IngestError> {
    if input.bytes.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    if !has_pdf_header(&input.bytes) {
        return Err(IngestError::NotPdf);
    }
    Ok(())
}

/// Run one document through validate → decode → detect → extract.
///
/// The decoded document is dropped before this returns.
pub fn process_document(
    input: &NamedInput,
    backend: &dyn DocumentBackend,
    options: &IngestOptions,
) -> Result<IngestedDocument, IngestError> {
    validate_input(input)?;

    let document = backend.decode(&input.bytes)?;

    if !options.skip_detection && !options.detector.matches(&document) {
        return Err(IngestError::FormatMismatch {
            marker: options.detector.marker().to_string(),
        });
    }

    let titles = options.extractor.extract(&document);
    let record = ResearcherRecord::from_extraction(&input.name, &titles, options.recency.as_ref());

    tracing::debug!(
        name = %input.name,
        pages = document.page_count(),
        titles = titles.len(),
        dated = titles.dated_count(),
        compared = record.len(),
        "document ingested"
    );

    Ok(IngestedDocument {
        name: input.name.clone(),
        page_count: document.page_count(),
        titles,
        record,
    })
}

/// Expand archives, then ingest every item in order.
///
/// Items whose display name is already taken get the first free ` (2)`,
/// ` (3)`, ... suffix, so comparison labels stay distinct.
pub fn ingest_all(
    inputs: Vec<NamedInput>,
    backend: &dyn DocumentBackend,
    options: &IngestOptions,
) -> IngestReport {
    let mut report = IngestReport::default();
    let mut items = Vec::new();

    for input in inputs {
        if is_archive_name(&input.name) {
            match expand_archive(&input.name, &input.bytes, options.max_archive_size) {
                Ok(expansion) => {
                    tracing::debug!(
                        archive = %input.name,
                        members = expansion.members.len(),
                        "archive expanded"
                    );
                    report.warnings.extend(
                        expansion
                            .warnings
                            .into_iter()
                            .map(|w| format!("{}: {}", input.name, w)),
                    );
                    items.extend(expansion.members);
                }
                Err(error) => {
                    tracing::warn!(name = %input.name, error = %error, "skipping archive");
                    report.issues.push(IngestIssue {
                        name: input.name,
                        error,
                    });
                }
            }
        } else {
            items.push(input);
        }
    }

    let mut taken: HashSet<String> = HashSet::new();
    for mut item in items {
        item.name = unique_name(&item.name, &taken);
        taken.insert(item.name.clone());

        match process_document(&item, backend, options) {
            Ok(document) => report.documents.push(document),
            Err(error) => {
                tracing::warn!(name = %item.name, error = %error, "skipping document");
                report.issues.push(IngestIssue {
                    name: item.name,
                    error,
                });
            }
        }
    }

    report
}

fn unique_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{} ({})", name, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// The MuPDF backend, when PDF support is compiled in.
#[cfg(feature = "pdf")]
pub fn default_backend() -> scholar_overlap_pdf_mupdf::MupdfBackend {
    scholar_overlap_pdf_mupdf::MupdfBackend::default()
}
