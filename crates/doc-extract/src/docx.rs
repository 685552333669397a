//! DOCX text extraction
//!
//! A DOCX file is a ZIP archive. The body text lives in `word/document.xml`
//! as `<w:t>` runs grouped into `<w:p>` paragraphs. Each paragraph becomes one
//! line of output.

use std::io::{Cursor, Read};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use shared_types::DocumentFormat;

use crate::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

lazy_static! {
    /// Paragraph ends, text runs, tabs and breaks, in document order
    static ref BODY_TOKEN: Regex = Regex::new(
        r"(?s)(?P<pend></w:p>|<w:p/>)|<w:t(?:\s[^>]*)?>(?P<text>[^<]*)</w:t>|(?P<tab><w:tab\b[^>]*/>)|(?P<br><w:(?:br|cr)\b[^>]*/>)"
    )
    .unwrap();

    static ref XML_ENTITY: Regex =
        Regex::new(r"&(?:(amp|lt|gt|quot|apos)|#(\d+)|#x([0-9a-fA-F]+));").unwrap();
}

/// DOCX extraction interface
pub struct DocxExtractor;

impl DocxExtractor {
    /// Extract paragraph text from DOCX bytes, one paragraph per line
    pub fn extract(docx_bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx_bytes))
            .map_err(|e| ExtractError::corrupt(DocumentFormat::Docx, e.to_string()))?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| {
                ExtractError::corrupt(DocumentFormat::Docx, format!("missing {}", DOCUMENT_PART))
            })?
            .read_to_string(&mut xml)
            .map_err(|e| ExtractError::corrupt(DocumentFormat::Docx, e.to_string()))?;

        Ok(Self::text_from_document_xml(&xml))
    }

    /// Convert the WordprocessingML body to plain text
    pub fn text_from_document_xml(xml: &str) -> String {
        let mut out = String::new();

        for caps in BODY_TOKEN.captures_iter(xml) {
            if caps.name("pend").is_some() {
                out.push('\n');
            } else if let Some(text) = caps.name("text") {
                out.push_str(&decode_entities(text.as_str()));
            } else if caps.name("tab").is_some() {
                out.push(' ');
            } else if caps.name("br").is_some() {
                out.push('\n');
            }
        }

        out
    }
}

/// Decode the predefined XML entities and numeric character references
fn decode_entities(text: &str) -> String {
    XML_ENTITY
        .replace_all(text, |caps: &Captures| {
            if let Some(name) = caps.get(1) {
                return match name.as_str() {
                    "amp" => "&",
                    "lt" => "<",
                    "gt" => ">",
                    "quot" => "\"",
                    _ => "'",
                }
                .to_string();
            }
            let code = match (caps.get(2), caps.get(3)) {
                (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                _ => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
