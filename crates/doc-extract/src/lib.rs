//! Contract text extraction
//!
//! Turns an uploaded file into a [`Document`] holding normalized plain text.
//!
//! - PDF via `pdf-extract`
//! - DOCX by reading `word/document.xml` out of the archive
//! - TXT as UTF-8 (lossy)
//!
//! Extraction is a pure function of the input bytes. Any failure is returned
//! as an [`ExtractError`] and no partial document is produced.
//!
//! # Example
//! ```no_run
//! use doc_extract::{extract, ExtractError};
//!
//! fn load(bytes: Vec<u8>) -> Result<(), ExtractError> {
//!     let document = extract("lease.pdf", bytes)?;
//!     println!("{} characters", document.text.len());
//!     Ok(())
//! }
//! ```

pub mod docx;
pub mod normalize;
pub mod pdf;

use shared_types::{hash_document, Document, DocumentFormat};
use thiserror::Error;

pub use docx::DocxExtractor;
pub use normalize::normalize_text;
pub use pdf::PdfExtractor;

/// Errors that can occur during text extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file format '{0}'. Supported formats: pdf, docx, txt")]
    UnsupportedFormat(String),

    #[error("Could not read {format} file: {reason}")]
    CorruptFile {
        format: DocumentFormat,
        reason: String,
    },

    #[error("No extractable text found in document")]
    EmptyDocument,
}

impl ExtractError {
    pub(crate) fn corrupt(format: DocumentFormat, reason: impl Into<String>) -> Self {
        Self::CorruptFile {
            format,
            reason: reason.into(),
        }
    }
}

/// Detect the document format from the filename extension
pub fn detect_format(filename: &str) -> Result<DocumentFormat, ExtractError> {
    DocumentFormat::from_filename(filename).ok_or_else(|| {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        ExtractError::UnsupportedFormat(if ext.is_empty() {
            "(none)".to_string()
        } else {
            ext.to_string()
        })
    })
}

/// Extract raw (un-normalized) text and page count for a known format
pub fn extract_raw(
    format: DocumentFormat,
    bytes: &[u8],
) -> Result<(String, Option<usize>), ExtractError> {
    match format {
        DocumentFormat::Pdf => {
            let extracted = PdfExtractor::extract(bytes)?;
            Ok((extracted.text, Some(extracted.page_count)))
        }
        DocumentFormat::Docx => Ok((DocxExtractor::extract(bytes)?, None)),
        DocumentFormat::Txt => Ok((decode_plain_text(bytes), None)),
    }
}

/// Extract and normalize an uploaded file
pub fn extract(filename: &str, bytes: Vec<u8>) -> Result<Document, ExtractError> {
    let format = detect_format(filename)?;
    let (raw, page_count) = extract_raw(format, &bytes)?;

    let text = normalize_text(&raw);
    if text.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    tracing::debug!(
        filename,
        %format,
        bytes = bytes.len(),
        chars = text.len(),
        "document extracted"
    );

    Ok(Document {
        filename: filename.to_string(),
        format,
        sha256: hash_document(&bytes),
        bytes,
        text,
        page_count,
    })
}

/// Decode plain text as UTF-8, replacing invalid sequences and dropping a BOM
fn decode_plain_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("contract.PDF").unwrap(), DocumentFormat::Pdf);
        assert_eq!(detect_format("a.b.docx").unwrap(), DocumentFormat::Docx);
        assert_eq!(detect_format("notes.txt").unwrap(), DocumentFormat::Txt);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = extract("contract.rtf", b"{\\rtf1 hello}".to_vec()).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref ext) if ext == "rtf"));

        let err = extract("README", b"hello".to_vec()).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_txt_extraction() {
        let doc = extract(
            "lease.txt",
            b"\xef\xbb\xbf1. Rent.\r\nTenant   pays $500.\r\n\r\n\r\n2. Term.".to_vec(),
        )
        .unwrap();
        assert_eq!(doc.format, DocumentFormat::Txt);
        assert_eq!(doc.text, "1. Rent.\nTenant pays $500.\n\n2. Term.");
        assert_eq!(doc.sha256.len(), 64);
        assert_eq!(doc.page_count, None);
    }

    #[test]
    fn test_txt_invalid_utf8_is_replaced() {
        let doc = extract("x.txt", b"Caf\xe9 agreement".to_vec()).unwrap();
        assert!(doc.text.contains('\u{fffd}'));
        assert!(doc.text.ends_with("agreement"));
    }

    #[test]
    fn test_whitespace_only_is_empty_document() {
        let err = extract("blank.txt", b"  \n\t\n\x0c  ".to_vec()).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument));
    }

    #[test]
    fn test_garbage_pdf_is_corrupt() {
        let err = extract("broken.pdf", b"this is not a pdf".to_vec()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::CorruptFile {
                format: DocumentFormat::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_docx_is_corrupt() {
        let err = extract("broken.docx", b"PK not really".to_vec()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::CorruptFile {
                format: DocumentFormat::Docx,
                ..
            }
        ));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let bytes = b"1. Payment.\nPay within 30 days.".to_vec();
        let a = extract("a.txt", bytes.clone()).unwrap();
        let b = extract("a.txt", bytes).unwrap();
        assert_eq!(a.text, b.text);
        assert_eq!(a.sha256, b.sha256);
    }
}
