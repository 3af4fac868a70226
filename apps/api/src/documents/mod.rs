//! Converts uploaded résumé files (PDF, DOCX, plain text) into the text the parser consumes.
//!
//! Decoding is CPU-bound and synchronous; handlers call [`extract_text`] inside
//! `tokio::task::spawn_blocking`.

use std::io::Read;

use quick_xml::events::Event;
use thiserror::Error;
use tracing::debug;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Upper bound on the decompressed size of `word/document.xml`.
const MAX_DOCUMENT_XML_BYTES: u64 = 20 * 1024 * 1024;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported document type: {0}")]
    UnsupportedKind(String),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX text extraction failed: {0}")]
    Docx(String),

    #[error("document is not valid UTF-8 or UTF-16 text")]
    InvalidText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

/// Decodes `bytes` into text according to its detected kind.
pub fn extract_text(
    bytes: &[u8],
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, DocumentError> {
    let kind = detect_kind(bytes, file_name, content_type)?;
    debug!(?kind, size = bytes.len(), "extracting document text");
    match kind {
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::Docx => extract_docx(bytes),
        DocumentKind::Text => decode_text(bytes),
    }
}

/// Content type first, then file extension, then magic bytes. Anything left is
/// treated as plain text.
pub fn detect_kind(
    bytes: &[u8],
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<DocumentKind, DocumentError> {
    if let Some(kind) = content_type.map(kind_from_content_type).transpose()?.flatten() {
        return Ok(kind);
    }
    if let Some(kind) = file_name.map(kind_from_extension).transpose()?.flatten() {
        return Ok(kind);
    }
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(DocumentKind::Pdf);
    }
    if bytes.starts_with(ZIP_MAGIC) {
        return Ok(DocumentKind::Docx);
    }
    Ok(DocumentKind::Text)
}

/// `Ok(None)` means the content type says nothing useful (`application/octet-stream`).
fn kind_from_content_type(content_type: &str) -> Result<Option<DocumentKind>, DocumentError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "" | "application/octet-stream" | "binary/octet-stream" => Ok(None),
        MIME_PDF => Ok(Some(DocumentKind::Pdf)),
        MIME_DOCX => Ok(Some(DocumentKind::Docx)),
        t if t.starts_with("text/") => Ok(Some(DocumentKind::Text)),
        other => Err(DocumentError::UnsupportedKind(other.to_string())),
    }
}

fn kind_from_extension(file_name: &str) -> Result<Option<DocumentKind>, DocumentError> {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return Ok(None);
    };
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Ok(Some(DocumentKind::Pdf)),
        "docx" => Ok(Some(DocumentKind::Docx)),
        "txt" | "text" | "md" => Ok(Some(DocumentKind::Text)),
        "doc" | "rtf" | "odt" | "pages" | "png" | "jpg" | "jpeg" => {
            Err(DocumentError::UnsupportedKind(format!(".{ext}")))
        }
        _ => Ok(None),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocumentError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| DocumentError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| DocumentError::Docx(e.to_string()))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_DOCUMENT_XML_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| DocumentError::Docx(e.to_string()))?;
    if xml.len() as u64 >= MAX_DOCUMENT_XML_BYTES {
        return Err(DocumentError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    document_xml_text(&xml)
}

/// Flattens WordprocessingML into lines: one line per paragraph, tabs and
/// breaks kept so column layouts survive.
fn document_xml_text(xml: &[u8]) -> Result<String, DocumentError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| DocumentError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(DocumentError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// UTF-8 (BOM optional), or UTF-16 when a byte-order mark says so.
fn decode_text(bytes: &[u8]) -> Result<String, DocumentError> {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|_| DocumentError::InvalidText)
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, DocumentError> {
    if bytes.len() % 2 != 0 {
        return Err(DocumentError::InvalidText);
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| DocumentError::InvalidText)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_kind_from_content_type_wins() {
        let kind = detect_kind(b"%PDF-1.7", Some("resume.txt"), Some(MIME_DOCX)).unwrap();
        assert_eq!(kind, DocumentKind::Docx);
        let kind = detect_kind(b"", None, Some("text/plain; charset=utf-8")).unwrap();
        assert_eq!(kind, DocumentKind::Text);
    }

    #[test]
    fn test_kind_from_extension_then_magic() {
        let kind = detect_kind(b"", Some("Resume.PDF"), Some("application/octet-stream")).unwrap();
        assert_eq!(kind, DocumentKind::Pdf);
        assert_eq!(detect_kind(b"%PDF-1.4", None, None).unwrap(), DocumentKind::Pdf);
        assert_eq!(detect_kind(b"PK\x03\x04rest", Some("upload"), None).unwrap(), DocumentKind::Docx);
        assert_eq!(detect_kind(b"Jane Doe", None, None).unwrap(), DocumentKind::Text);
    }

    #[test]
    fn test_unsupported_kinds() {
        assert!(matches!(
            detect_kind(b"", None, Some("image/png")),
            Err(DocumentError::UnsupportedKind(_))
        ));
        assert!(matches!(
            detect_kind(b"", Some("resume.doc"), None),
            Err(DocumentError::UnsupportedKind(_))
        ));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let text = extract_text(b"\xEF\xBB\xBFJane Doe", None, None).unwrap();
        assert_eq!(text, "Jane Doe");
    }

    #[test]
    fn test_utf16_with_bom() {
        let mut le = vec![0xFF, 0xFE];
        le.extend("Jané".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(extract_text(&le, Some("cv.txt"), None).unwrap(), "Jané");

        let mut be = vec![0xFE, 0xFF];
        be.extend("Jané".encode_utf16().flat_map(u16::to_be_bytes));
        assert_eq!(extract_text(&be, Some("cv.txt"), None).unwrap(), "Jané");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert!(matches!(
            extract_text(&[0xC3, 0x28, 0xA0], None, Some("text/plain")),
            Err(DocumentError::InvalidText)
        ));
    }

    #[test]
    fn test_docx_paragraphs_tabs_and_breaks() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
<w:p><w:r><w:t>EDUCATION</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Boston University</w:t><w:tab/><w:t>Boston, MA</w:t></w:r></w:p>
<w:p><w:r><w:t>AT&amp;T</w:t><w:br/><w:t>Intern</w:t></w:r></w:p>
</w:body></w:document>"#;
        let text = extract_text(&docx_with(xml), Some("cv.docx"), None).unwrap();
        assert_eq!(
            text,
            "Jane Doe\nEDUCATION\nBoston University\tBoston, MA\nAT&T\nIntern\n"
        );
    }

    #[test]
    fn test_docx_without_document_xml() {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            extract_text(&bytes, None, Some(MIME_DOCX)),
            Err(DocumentError::Docx(_))
        ));
    }

    #[test]
    fn test_invalid_pdf_is_an_extraction_error() {
        assert!(matches!(
            extract_text(b"not a pdf", Some("cv.pdf"), None),
            Err(DocumentError::Pdf(_))
        ));
    }
}
