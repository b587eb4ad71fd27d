//! Upload validation: the gate every resume passes before extraction.
//!
//! A rejected upload never reaches extraction and never touches the database.

pub mod handlers;

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

/// Maximum accepted resume size: 16 MiB.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Request body limit for the multipart upload route: the file plus form overhead.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// The file formats the screener can extract text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Pdf,
    Docx,
    Text,
}

impl UploadKind {
    pub const ALL: [UploadKind; 3] = [UploadKind::Pdf, UploadKind::Docx, UploadKind::Text];

    pub fn mime(&self) -> &'static str {
        match self {
            UploadKind::Pdf => "application/pdf",
            UploadKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            UploadKind::Text => "text/plain",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            UploadKind::Pdf => "pdf",
            UploadKind::Docx => "docx",
            UploadKind::Text => "txt",
        }
    }

    /// Maps a declared MIME type to a kind. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.mime() == essence)
    }

    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.extension() == ext)
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UploadKind::Pdf => "PDF",
            UploadKind::Docx => "DOCX",
            UploadKind::Text => "plain text",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No file selected")]
    MissingFile,

    #[error("The uploaded file is empty")]
    EmptyFile,

    #[error("File too large. Maximum size is 16MB.")]
    TooLarge,

    #[error("Unsupported file type '{declared}'. Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedType { declared: String },
}

/// An upload that passed every check and is ready for extraction.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub filename: String,
    pub kind: UploadKind,
    pub bytes: Bytes,
}

/// Published limits so clients can reject bad files before submitting.
#[derive(Debug, Serialize)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_mime_types: Vec<&'static str>,
    pub allowed_extensions: Vec<&'static str>,
}

pub fn upload_policy() -> UploadPolicy {
    UploadPolicy {
        max_bytes: MAX_UPLOAD_BYTES,
        allowed_mime_types: UploadKind::ALL.iter().map(|k| k.mime()).collect(),
        allowed_extensions: UploadKind::ALL.iter().map(|k| k.extension()).collect(),
    }
}

/// Validates an uploaded file.
///
/// Checks run in order: size, emptiness, type. The declared MIME type decides the
/// kind; a missing or generic declaration falls back to the file extension.
pub fn validate_upload(
    filename: &str,
    declared_mime: Option<&str>,
    bytes: Bytes,
) -> Result<ValidatedUpload, ValidationError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge);
    }
    if bytes.is_empty() {
        return Err(ValidationError::EmptyFile);
    }

    let declared = declared_mime
        .map(str::trim)
        .filter(|m| !m.is_empty() && !GENERIC_MIME_TYPES.contains(&m.to_ascii_lowercase().as_str()));

    let kind = match declared {
        Some(mime) => UploadKind::from_mime(mime).ok_or_else(|| ValidationError::UnsupportedType {
            declared: mime.to_string(),
        })?,
        None => UploadKind::from_extension(filename).ok_or_else(|| {
            ValidationError::UnsupportedType {
                declared: Path::new(filename)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{e}"))
                    .unwrap_or_else(|| "unknown".to_string()),
            }
        })?,
    };

    Ok(ValidatedUpload {
        filename: sanitize_filename(filename, kind),
        kind,
        bytes,
    })
}

/// Reduces a client-supplied filename to a safe basename.
pub fn sanitize_filename(filename: &str, kind: UploadKind) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        format!("resume.{}", kind.extension())
    } else {
        cleaned
    }
}
