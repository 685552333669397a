//! PDF text extraction

use std::panic::{self, AssertUnwindSafe};

use pdf_extract::extract_text_from_mem;
use shared_types::DocumentFormat;

use crate::ExtractError;

/// Text and page count pulled from a PDF
#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    pub text: String,
    pub page_count: usize,
}

/// PDF extraction interface
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract text from PDF bytes
    ///
    /// # Errors
    /// - `ExtractError::CorruptFile` - the bytes are not a readable PDF, or the
    ///   document is encrypted
    pub fn extract(pdf_bytes: &[u8]) -> Result<ExtractedPdf, ExtractError> {
        let page_count = Self::page_count(pdf_bytes)?;

        // pdf-extract panics on some malformed content streams
        let result = panic::catch_unwind(AssertUnwindSafe(|| extract_text_from_mem(pdf_bytes)));

        let text = match result {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                let error_msg = e.to_string().to_lowercase();
                if error_msg.contains("encrypted") || error_msg.contains("password") {
                    return Err(ExtractError::corrupt(
                        DocumentFormat::Pdf,
                        "password-protected PDF",
                    ));
                }
                return Err(ExtractError::corrupt(DocumentFormat::Pdf, e.to_string()));
            }
            Err(_) => {
                tracing::warn!("pdf-extract panicked while reading content streams");
                return Err(ExtractError::corrupt(
                    DocumentFormat::Pdf,
                    "unreadable content stream",
                ));
            }
        };

        tracing::debug!(page_count, chars = text.len(), "pdf text extracted");
        Ok(ExtractedPdf { text, page_count })
    }

    /// Count pages without extracting text
    pub fn page_count(pdf_bytes: &[u8]) -> Result<usize, ExtractError> {
        let doc = pdf_extract::Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractError::corrupt(DocumentFormat::Pdf, e.to_string()))?;
        if doc.is_encrypted() {
            return Err(ExtractError::corrupt(
                DocumentFormat::Pdf,
                "password-protected PDF",
            ));
        }
        Ok(doc.get_pages().len())
    }
}
