use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;
use tar::Archive;

use crate::{IngestError, NamedInput, has_pdf_header};

/// PDF members pulled out of an archive, plus any warnings (e.g. size limit reached).
#[derive(Debug, Default)]
pub struct ArchiveExpansion {
    pub members: Vec<NamedInput>,
    pub warnings: Vec<String>,
}

/// Returns true if the given name looks like a supported archive.
pub fn is_archive_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".zip") || lower.ends_with(".tar.gz") || lower.ends_with(".tgz")
}

fn is_pdf_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

/// Skip directories' leftovers, hidden files and macOS resource forks.
fn is_ignored_member(path: &Path) -> bool {
    path.to_string_lossy().contains("__MACOSX")
        || path
            .file_name()
            .is_none_or(|f| f.to_string_lossy().starts_with('.'))
}

fn basename(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn size_limit_warning(max_size: u64, extracted: usize) -> String {
    format!(
        "Size limit ({}MB) reached after {} files, skipping remaining",
        max_size / 1024 / 1024,
        extracted
    )
}

/// Expand an in-memory archive into its PDF members.
///
/// Supports ZIP and tar.gz archives. Type is detected by name and magic bytes.
/// `max_size` limits total extracted bytes (0 = unlimited). Members whose
/// content lacks a `%PDF-` header are skipped.
pub fn expand_archive(
    name: &str,
    data: &[u8],
    max_size: u64,
) -> Result<ArchiveExpansion, IngestError> {
    let lower = name.to_lowercase();

    // Detect by extension first, then fall back to magic bytes
    if lower.ends_with(".zip") || data.starts_with(b"PK") {
        expand_zip(data, max_size)
    } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") || data.starts_with(&[0x1f, 0x8b])
    {
        expand_tar_gz(data, max_size)
    } else {
        Err(IngestError::Archive(format!(
            "Unsupported archive format: {}",
            name
        )))
    }
}

/// Expand PDF members of a ZIP archive.
pub fn expand_zip(data: &[u8], max_size: u64) -> Result<ArchiveExpansion, IngestError> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| IngestError::Archive(format!("Failed to open ZIP: {}", e)))?;

    let mut expansion = ArchiveExpansion::default();
    let mut total_size: u64 = 0;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| IngestError::Archive(format!("Failed to read ZIP entry: {}", e)))?;

        let path = match file.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => continue, // Skip path traversal attempts
        };
        let name_str = path.to_string_lossy().to_string();

        if file.is_dir() || is_ignored_member(&path) || !is_pdf_name(&name_str) {
            continue;
        }

        if max_size > 0 {
            total_size += file.size();
            if total_size > max_size {
                expansion
                    .warnings
                    .push(size_limit_warning(max_size, expansion.members.len()));
                break;
            }
        }

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| IngestError::Archive(format!("Failed to extract {}: {}", name_str, e)))?;

        if !has_pdf_header(&buf) {
            tracing::debug!(member = %name_str, "skipping archive member without PDF header");
            continue;
        }

        expansion.members.push(NamedInput::new(basename(&path), buf));
    }

    finish(expansion)
}

/// Expand PDF members of a tar.gz archive.
pub fn expand_tar_gz(data: &[u8], max_size: u64) -> Result<ArchiveExpansion, IngestError> {
    let gz = GzDecoder::new(data);
    let mut archive = Archive::new(gz);

    let entries = archive
        .entries()
        .map_err(|e| IngestError::Archive(format!("Failed to read tar.gz: {}", e)))?;

    let mut expansion = ArchiveExpansion::default();
    let mut total_size: u64 = 0;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| IngestError::Archive(format!("Failed to read tar entry: {}", e)))?;

        let path = entry
            .path()
            .map_err(|e| IngestError::Archive(format!("Failed to read entry path: {}", e)))?
            .to_path_buf();
        let name_str = path.to_string_lossy().to_string();

        if entry.header().entry_type().is_dir() {
            continue;
        }
        // Check for path traversal
        if name_str.contains("..") || name_str.starts_with('/') {
            continue;
        }
        if is_ignored_member(&path) || !is_pdf_name(&name_str) {
            continue;
        }

        if max_size > 0 {
            total_size += entry.size();
            if total_size > max_size {
                expansion
                    .warnings
                    .push(size_limit_warning(max_size, expansion.members.len()));
                break;
            }
        }

        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| IngestError::Archive(format!("Failed to extract {}: {}", name_str, e)))?;

        if !has_pdf_header(&buf) {
            tracing::debug!(member = %name_str, "skipping archive member without PDF header");
            continue;
        }

        expansion.members.push(NamedInput::new(basename(&path), buf));
    }

    finish(expansion)
}

fn finish(expansion: ArchiveExpansion) -> Result<ArchiveExpansion, IngestError> {
    if expansion.members.is_empty() {
        return Err(IngestError::Archive(
            "No PDF files found in archive".to_string(),
        ));
    }
    Ok(expansion)
}
