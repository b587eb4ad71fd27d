use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::extraction::{ExtractionError, TextExtractor};
use crate::upload::UploadKind;

/// Largest `word/document.xml` accepted after decompression.
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

/// DOCX text from `word/document.xml`: one line per paragraph, tabs and breaks kept.
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionError::new(UploadKind::Docx, format!("not a DOCX archive: {e}")))?;

        let document = archive.by_name("word/document.xml").map_err(|e| {
            ExtractionError::new(UploadKind::Docx, format!("missing word/document.xml: {e}"))
        })?;
        let declared_size = document.size();

        let xml = read_document_xml(document, declared_size, MAX_DOCUMENT_XML_BYTES)?;
        parse_document_xml(&xml)
    }
}

/// Reads at most `limit` bytes. The declared size is checked first, then the
/// actual stream, since archive headers can understate it.
fn read_document_xml<R: Read>(
    reader: R,
    declared_size: u64,
    limit: u64,
) -> Result<String, ExtractionError> {
    let too_large = || ExtractionError::new(UploadKind::Docx, "document.xml too large");
    if declared_size > limit {
        return Err(too_large());
    }

    let mut buf = Vec::new();
    reader.take(limit + 1).read_to_end(&mut buf).map_err(|e| {
        ExtractionError::new(UploadKind::Docx, format!("unreadable word/document.xml: {e}"))
    })?;
    if buf.len() as u64 > limit {
        return Err(too_large());
    }

    String::from_utf8(buf).map_err(|e| {
        ExtractionError::new(UploadKind::Docx, format!("unreadable word/document.xml: {e}"))
    })
}

fn parse_document_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    lines.push(current.trim_end().to_string());
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let value = e.xml_content().map_err(|err| {
                        ExtractionError::new(UploadKind::Docx, format!("bad text encoding: {err}"))
                    })?;
                    current.push_str(&value);
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if in_text {
                    if let Ok(Some(ch)) = r.resolve_char_ref() {
                        current.push(ch);
                    } else if let Ok(name) = r.decode() {
                        if let Some(value) = quick_xml::escape::resolve_predefined_entity(&name) {
                            current.push_str(value);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::new(
                    UploadKind::Docx,
                    format!("XML parsing error: {e}"),
                ));
            }
            _ => {}
        }
    }

    if !current.trim().is_empty() {
        lines.push(current.trim_end().to_string());
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Jane Smith</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Journeyman </w:t></w:r><w:r><w:t>Plumber</w:t></w:r></w:p>
    <w:p><w:r><w:t>Phone:</w:t></w:r><w:r><w:tab/><w:t>555-123-4567</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn test_paragraphs_become_lines() {
        let text = DocxExtractor.extract(&build_docx(DOCUMENT)).unwrap();
        assert_eq!(text, "Jane Smith\nJourneyman Plumber\nPhone:\t555-123-4567");
    }

    #[test]
    fn test_oversized_document_rejected() {
        let mut body = String::with_capacity(MAX_DOCUMENT_XML_BYTES as usize + 64);
        body.push_str("<w:document><w:body><w:p><w:r><w:t>");
        body.extend(std::iter::repeat('a').take(MAX_DOCUMENT_XML_BYTES as usize));
        body.push_str("</w:t></w:r></w:p></w:body></w:document>");

        let err = DocxExtractor.extract(&build_docx(&body)).unwrap_err();
        assert_eq!(err.kind, UploadKind::Docx);
        assert_eq!(err.cause, "document.xml too large");
    }

    #[test]
    fn test_stream_longer_than_declared_size_rejected() {
        let xml = "<w:p>0123456789</w:p>";
        let err = read_document_xml(xml.as_bytes(), 4, 16).unwrap_err();
        assert_eq!(err.cause, "document.xml too large");

        let read = read_document_xml(xml.as_bytes(), 4, xml.len() as u64).unwrap();
        assert_eq!(read, xml);
    }

    #[test]
    fn test_non_zip_bytes_rejected() {
        let err = DocxExtractor.extract(b"plain text pretending").unwrap_err();
        assert_eq!(err.kind, UploadKind::Docx);
        assert!(err.cause.contains("not a DOCX archive"));
    }

    #[test]
    fn test_archive_without_document_rejected() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("readme.txt", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"hello").unwrap();
            writer.finish().unwrap();
        }
        let err = DocxExtractor.extract(&buf.into_inner()).unwrap_err();
        assert!(err.cause.contains("word/document.xml"));
    }
}
