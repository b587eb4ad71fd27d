use tracing::debug;

use crate::extraction::{ExtractionError, TextExtractor};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Plain text reader: UTF-8 first, Latin-1 when the bytes are not valid UTF-8.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(e) => {
                debug!("Resume is not valid UTF-8 ({e}); decoding as Latin-1");
                Ok(decode_latin1(bytes))
            }
        }
    }
}

/// Every byte maps to the code point of the same value, so this cannot fail.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
