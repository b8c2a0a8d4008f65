use thiserror::Error;

use crate::Document;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
}

/// Trait for document decoding backends.
///
/// Implementors turn the raw bytes of an upload into the layout model
/// ([`Document`] → pages → blocks → lines → spans). Everything downstream
/// (format detection, title segmentation, year association) works on that
/// model only and never sees the decoding library.
pub trait DocumentBackend: Send + Sync {
    /// Decode a complete document held in memory.
    fn decode(&self, bytes: &[u8]) -> Result<Document, BackendError>;
}
