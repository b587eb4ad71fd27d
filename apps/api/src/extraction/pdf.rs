use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::extraction::{ExtractionError, TextExtractor};
use crate::upload::UploadKind;

/// PDF text via `pdf-extract`.
///
/// The parser panics on some malformed documents, so the call is isolated with
/// `catch_unwind` and a panic becomes an ordinary `ExtractionError`.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(ExtractionError::new(UploadKind::Pdf, "missing %PDF header"));
        }

        match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractionError::new(UploadKind::Pdf, e)),
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::warn!("PDF parser panicked: {msg}");
                Err(ExtractionError::new(
                    UploadKind::Pdf,
                    format!("PDF parser crashed: {msg}"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_pdf_bytes_rejected() {
        let err = PdfExtractor.extract(b"Just some text").unwrap_err();
        assert_eq!(err.kind, UploadKind::Pdf);
        assert!(err.cause.contains("%PDF"));
    }

    #[test]
    fn test_truncated_pdf_is_error_not_panic() {
        let err = PdfExtractor.extract(b"%PDF-1.4\n1 0 obj\n<<").unwrap_err();
        assert_eq!(err.kind, UploadKind::Pdf);
    }
}
