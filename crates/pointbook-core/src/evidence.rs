//! Client-side gate for evidence attachments.
//!
//! Size and MIME type are checked before any upload is attempted, so the
//! upload client can assume valid input.

use std::path::Path;

use crate::error::{Error, Result};
use crate::models::EvidenceFile;

/// Largest accepted evidence file (10 MiB).
pub const MAX_EVIDENCE_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted as evidence.
pub const ALLOWED_EVIDENCE_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// A validated evidence file together with its bytes, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub file: EvidenceFile,
    pub bytes: Vec<u8>,
}

impl Evidence {
    /// Reads and validates the file at `path`.
    ///
    /// The size limit is checked against file metadata before reading.
    pub fn load(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "evidence path {} is not a file",
                path.display()
            )));
        }
        check_size(metadata.len())?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                Error::InvalidInput(format!("evidence path {} has no file name", path.display()))
            })?;
        let bytes = std::fs::read(path)?;
        let file = EvidenceFile {
            path: path.to_path_buf(),
            mime_type: infer_evidence_mime_type(None, &file_name),
            file_name,
            size_bytes: bytes.len() as u64,
        };
        validate_evidence(&file)?;

        Ok(Self { file, bytes })
    }
}

/// Rejects files that are too large or of an unsupported type.
pub fn validate_evidence(file: &EvidenceFile) -> Result<()> {
    check_size(file.size_bytes)?;
    if !is_allowed_mime_type(&file.mime_type) {
        return Err(Error::InvalidInput(format!(
            "evidence must be a PDF, JPEG, or PNG file (got {})",
            file.mime_type
        )));
    }
    Ok(())
}

pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    let normalized = mime_type.trim().to_ascii_lowercase();
    ALLOWED_EVIDENCE_TYPES.contains(&normalized.as_str())
}

/// Picks a MIME type from an explicit content type, falling back to the
/// file extension.
pub fn infer_evidence_mime_type(content_type: Option<&str>, file_name: &str) -> String {
    if let Some(content_type) = content_type {
        let trimmed = content_type.trim();
        if !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("application/octet-stream") {
            return trimmed.to_ascii_lowercase();
        }
    }

    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn check_size(size_bytes: u64) -> Result<()> {
    if size_bytes == 0 {
        return Err(Error::InvalidInput("evidence file is empty".to_string()));
    }
    if size_bytes > MAX_EVIDENCE_BYTES {
        return Err(Error::InvalidInput(format!(
            "evidence file is {size_bytes} bytes; the limit is 10 MiB"
        )));
    }
    Ok(())
}
