//! Text extraction: turns a validated upload into one normalized string.
//!
//! Each format has its own `TextExtractor`. Parsing is CPU-bound and runs on the
//! blocking pool via `extract_text_blocking`.

pub mod docx;
pub mod pdf;
pub mod text;

use bytes::Bytes;
use thiserror::Error;

use crate::errors::AppError;
use crate::upload::UploadKind;

use self::docx::DocxExtractor;
use self::pdf::PdfExtractor;
use self::text::PlainTextExtractor;

/// Extraction failed for a file of `kind`; `cause` carries the underlying reason.
#[derive(Debug, Clone, Error)]
#[error("Failed to extract text from {kind} file: {cause}")]
pub struct ExtractionError {
    pub kind: UploadKind,
    pub cause: String,
}

impl ExtractionError {
    pub fn new(kind: UploadKind, cause: impl ToString) -> Self {
        Self {
            kind,
            cause: cause.to_string(),
        }
    }
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

static PDF: PdfExtractor = PdfExtractor;
static DOCX: DocxExtractor = DocxExtractor;
static TEXT: PlainTextExtractor = PlainTextExtractor;

pub fn extractor_for(kind: UploadKind) -> &'static dyn TextExtractor {
    match kind {
        UploadKind::Pdf => &PDF,
        UploadKind::Docx => &DOCX,
        UploadKind::Text => &TEXT,
    }
}

/// Extracts and normalizes text. Empty output is an error: there is nothing to analyze.
pub fn extract_text(kind: UploadKind, bytes: &[u8]) -> Result<String, ExtractionError> {
    let raw = extractor_for(kind).extract(bytes)?;
    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(ExtractionError::new(
            kind,
            "no readable text found; ensure the file contains selectable text",
        ));
    }
    Ok(text)
}

/// Runs `extract_text` on the blocking thread pool.
pub async fn extract_text_blocking(kind: UploadKind, bytes: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}")))??;
    Ok(text)
}

/// Unifies line endings and trims surrounding whitespace.
pub fn normalize_text(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_round_trip_is_exact() {
        let content = "John Doe, john@example.com\nSenior Electrician\n\n- 10 years commercial wiring";
        let text = extract_text(UploadKind::Text, content.as_bytes()).unwrap();
        assert_eq!(text, content);
    }

    #[test]
    fn test_normalize_line_endings_and_trim() {
        assert_eq!(normalize_text("  a\r\nb\rc\n\n"), "a\nb\nc");
    }

    #[test]
    fn test_whitespace_only_file_is_extraction_error() {
        let err = extract_text(UploadKind::Text, b"   \n\t ").unwrap_err();
        assert_eq!(err.kind, UploadKind::Text);
        assert!(err.cause.contains("no readable text"));
    }

    #[test]
    fn test_error_message_names_kind() {
        let err = ExtractionError::new(UploadKind::Docx, "missing word/document.xml");
        assert_eq!(
            err.to_string(),
            "Failed to extract text from DOCX file: missing word/document.xml"
        );
    }

    #[tokio::test]
    async fn test_blocking_extraction_returns_text() {
        let text = extract_text_blocking(UploadKind::Text, Bytes::from_static(b"Jane Roe\r\n"))
            .await
            .unwrap();
        assert_eq!(text, "Jane Roe");
    }
}
