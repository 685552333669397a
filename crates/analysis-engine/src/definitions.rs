//! Defined-term extraction
//!
//! Two forms are recognized:
//! - `"Services" means the work described in Exhibit A.`
//! - `Acme Corp., a Delaware corporation (the "Company")`
//!
//! Straight and curly double quotes are accepted and the term must start with
//! a capital letter.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::DefinedTerm;

use crate::patterns::truncate_chars;

const MAX_DEFINITION_CHARS: usize = 300;

lazy_static! {
    static ref MEANS_DEFINITION: Regex = Regex::new(
        r#"(?m)["“]([A-Z][^"”\n]{0,60})["”][ \t]+(?:shall mean|means|refers to|is defined as|has the meaning)\b[ \t:]*([^\n]*?)(?:[.;](?:\s|$)|$)"#
    )
    .unwrap();

    static ref PARENTHETICAL_DEFINITION: Regex = Regex::new(
        r#"\((?:the[ \t]+|hereinafter(?:[ \t]+(?:referred[ \t]+to[ \t]+as|called))?[ \t]+(?:the[ \t]+)?)?["“]([A-Z][^"”\n]{0,60})["”]\)"#
    )
    .unwrap();

    /// Boundary before a parenthetical definition's subject
    static ref SUBJECT_BOUNDARY: Regex = Regex::new(r"(?:[.;:!?]\s|\)|\n)").unwrap();

    static ref LEADING_CONNECTIVE: Regex =
        Regex::new(r"^(?:[,\s]+)?(?:(?:by and )?between|and|by)\s+").unwrap();
}

/// Extract defined terms, first occurrence wins, ordered by offset
pub fn extract_definitions(text: &str) -> Vec<DefinedTerm> {
    let mut found = Vec::new();

    for caps in MEANS_DEFINITION.captures_iter(text) {
        let (Some(term), Some(definition)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let definition = definition.as_str().trim();
        if definition.is_empty() {
            continue;
        }
        found.push(DefinedTerm {
            term: term.as_str().trim().to_string(),
            definition: truncate_chars(definition, MAX_DEFINITION_CHARS),
            offset: term.start(),
        });
    }

    for caps in PARENTHETICAL_DEFINITION.captures_iter(text) {
        let (Some(whole), Some(term)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let subject = parenthetical_subject(&text[..whole.start()]);
        if subject.is_empty() {
            continue;
        }
        found.push(DefinedTerm {
            term: term.as_str().trim().to_string(),
            definition: truncate_chars(&subject, MAX_DEFINITION_CHARS),
            offset: term.start(),
        });
    }

    found.sort_by_key(|d| d.offset);
    let mut seen = HashSet::new();
    found.retain(|d| seen.insert(d.term.clone()));
    found
}

/// The phrase a parenthetical definition names: text back to the previous
/// sentence break, closing parenthesis or line break
fn parenthetical_subject(before: &str) -> String {
    let start = SUBJECT_BOUNDARY
        .find_iter(before)
        .last()
        .map_or(0, |m| m.end());
    let subject = before[start..].trim();
    let subject = LEADING_CONNECTIVE.replace(subject, "");
    subject.trim().trim_end_matches(',').trim().to_string()
}
