//! Clause segmentation
//!
//! Splits normalized contract text into top-level clauses using three heading
//! families, tried in priority order:
//!
//! 1. Numbered headings: "1. Payment", "2. TERMINATION"
//! 2. Section/Article headings: "Section 4: Fees", "ARTICLE IV"
//! 3. ALL-CAPS lines: "CONFIDENTIALITY"
//!
//! When candidates start at the same offset the longest heading wins, then
//! family priority. Candidates overlapping an accepted heading are dropped.
//! Each clause body is then scanned for sub-clause markers ("2.1", "(a)").
//!
//! Heading and body spans of the top-level clauses tile the input text.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_types::{Clause, DefinedTerm, HeadingKind, Span};

use crate::definitions::extract_definitions;

/// Longest phrase accepted as a heading title
const MAX_TITLE_WORDS: usize = 8;

/// Longest line accepted as an ALL-CAPS heading
const MAX_CAPS_WORDS: usize = 10;

/// Lowercase words allowed inside a Title Case heading
const TITLE_CONNECTORS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "in", "of", "on", "or", "the", "to", "with",
];

lazy_static! {
    /// "1. " at the start of a line
    static ref NUMBERED_LINE: Regex = Regex::new(r"(?m)^(\d{1,3})\.[ \t]+").unwrap();

    /// " 2. " following sentence punctuation on the same line
    static ref NUMBERED_INLINE: Regex =
        Regex::new(r#"[.!?]["'”’)]?[ \t]+(\d{1,3})\.[ \t]+"#).unwrap();

    /// "Section 4", "ARTICLE IV", "Section 2.1"
    static ref SECTION_LINE: Regex =
        Regex::new(r"(?mi)^(section|article)[ \t]+(\d{1,3}(?:\.\d{1,3})*|[ivxlc]{1,7})\b").unwrap();

    /// A whole line of capitals, optional trailing colon
    static ref CAPS_LINE: Regex =
        Regex::new(r"(?m)^[A-Z][A-Z0-9&,.:'’/()\- ]*[A-Z)][ \t]*:?[ \t]*$").unwrap();

    /// "2.1 " / "2.1. " sub-clause marker
    static ref DECIMAL_SUB: Regex = Regex::new(r"(?m)^(\d{1,3}(?:\.\d{1,3})+)\.?[ \t]+").unwrap();

    /// "(a) " / "(iv) " sub-clause marker
    static ref LETTERED_SUB: Regex = Regex::new(r"(?m)^\(([a-z]|[ivx]{1,5})\)[ \t]+").unwrap();
}

/// Clauses and defined terms found in a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub clauses: Vec<Clause>,
    pub definitions: Vec<DefinedTerm>,
}

/// A heading candidate before overlap resolution
#[derive(Debug, Clone)]
struct Heading {
    start: usize,
    end: usize,
    kind: HeadingKind,
    priority: u8,
    number: Option<String>,
    title: Option<String>,
    /// Parsed number for numbered headings
    numeral: Option<u32>,
    /// Numbered heading found mid-line
    inline: bool,
}

/// Clause segmenter
pub struct ClauseSegmenter;

impl ClauseSegmenter {
    /// Segment text into clauses and defined terms. Never fails: text with no
    /// headings becomes a single unlabeled clause.
    pub fn segment(text: &str) -> Segmentation {
        Segmentation {
            clauses: Self::clauses(text),
            definitions: extract_definitions(text),
        }
    }

    /// Top-level clauses and sub-clauses in document order
    pub fn clauses(text: &str) -> Vec<Clause> {
        let headings = Self::resolve(Self::candidates(text));
        let mut clauses = Vec::new();
        let mut ordinal = 0;

        let Some(first) = headings.first() else {
            ordinal += 1;
            clauses.push(Clause {
                ordinal,
                kind: HeadingKind::Unlabeled,
                number: None,
                title: None,
                body: text.trim().to_string(),
                heading_span: Span::new(0, 0),
                body_span: Span::new(0, text.len()),
                parent: None,
            });
            clauses.extend(Self::sub_clauses(text, Span::new(0, text.len()), 1, &mut ordinal));
            return clauses;
        };

        if !text[..first.start].trim().is_empty() {
            ordinal += 1;
            let body_span = Span::new(0, first.start);
            let parent = ordinal;
            clauses.push(Clause {
                ordinal,
                kind: HeadingKind::Preamble,
                number: None,
                title: None,
                body: text[..first.start].trim().to_string(),
                heading_span: Span::new(0, 0),
                body_span,
                parent: None,
            });
            clauses.extend(Self::sub_clauses(text, body_span, parent, &mut ordinal));
        }

        for (i, heading) in headings.iter().enumerate() {
            let body_end = headings.get(i + 1).map_or(text.len(), |next| next.start);
            let body_span = Span::new(heading.end, body_end);

            ordinal += 1;
            let parent = ordinal;
            clauses.push(Clause {
                ordinal,
                kind: heading.kind,
                number: heading.number.clone(),
                title: heading.title.clone(),
                body: text[body_span.start..body_span.end].trim().to_string(),
                heading_span: Span::new(heading.start, heading.end),
                body_span,
                parent: None,
            });
            clauses.extend(Self::sub_clauses(text, body_span, parent, &mut ordinal));
        }

        tracing::debug!(
            headings = headings.len(),
            clauses = clauses.len(),
            "segmented document"
        );
        clauses
    }

    /// Collect heading candidates from every family
    fn candidates(text: &str) -> Vec<Heading> {
        let mut candidates = Vec::new();

        for caps in NUMBERED_LINE.captures_iter(text) {
            if let (Some(m), Some(num)) = (caps.get(0), caps.get(1)) {
                if let Some(heading) = Self::numbered(text, m.start(), m.end(), num.as_str(), false)
                {
                    candidates.push(heading);
                }
            }
        }

        for caps in NUMBERED_INLINE.captures_iter(text) {
            if let (Some(m), Some(num)) = (caps.get(0), caps.get(1)) {
                if let Some(heading) = Self::numbered(text, num.start(), m.end(), num.as_str(), true)
                {
                    candidates.push(heading);
                }
            }
        }

        for caps in SECTION_LINE.captures_iter(text) {
            if let (Some(m), Some(word), Some(num)) = (caps.get(0), caps.get(1), caps.get(2)) {
                let number = format!("{} {}", word.as_str(), num.as_str());
                if let Some(heading) = Self::section(text, m.start(), m.end(), number) {
                    candidates.push(heading);
                }
            }
        }

        for m in CAPS_LINE.find_iter(text) {
            let title = m.as_str().trim_end().trim_end_matches(':').trim_end();
            let letters = title.chars().filter(|c| c.is_alphabetic()).count();
            let words = title.split_whitespace().count();
            if letters >= 3 && words <= MAX_CAPS_WORDS {
                candidates.push(Heading {
                    start: m.start(),
                    end: m.end(),
                    kind: HeadingKind::AllCaps,
                    priority: 2,
                    number: None,
                    title: Some(title.to_string()),
                    numeral: None,
                    inline: false,
                });
            }
        }

        candidates
    }

    /// Build a numbered heading whose marker ends at `marker_end`
    fn numbered(
        text: &str,
        start: usize,
        marker_end: usize,
        number: &str,
        inline: bool,
    ) -> Option<Heading> {
        let rest = &text[marker_end..line_end(text, marker_end)];
        if !rest.chars().next().is_some_and(|c| c.is_uppercase()) {
            return None;
        }

        let (title, consumed) = match split_title(rest) {
            Some((title, consumed)) => (Some(title), consumed),
            None => (None, 0),
        };

        Some(Heading {
            start,
            end: marker_end + consumed,
            kind: HeadingKind::Numbered,
            priority: 0,
            number: Some(number.to_string()),
            title,
            numeral: number.parse().ok(),
            inline,
        })
    }

    /// Build a Section/Article heading. "Section 3 of this Agreement ..." is
    /// a reference, not a heading, and yields `None`.
    fn section(text: &str, start: usize, marker_end: usize, number: String) -> Option<Heading> {
        let line_end = line_end(text, marker_end);
        let after = &text[marker_end..line_end];
        let after_blank = after.trim_start_matches([' ', '\t']);

        let (has_separator, remainder) = match after_blank.chars().next() {
            Some(c @ (':' | '.' | '-' | '–' | '—')) => (
                true,
                after_blank[c.len_utf8()..].trim_start_matches([' ', '\t']),
            ),
            _ => (false, after_blank),
        };
        let remainder_start = line_end - remainder.len();

        let (title, end) = if remainder.trim().is_empty() {
            (None, line_end)
        } else if is_title_like(remainder.trim_end()) {
            (Some(remainder.trim_end().to_string()), line_end)
        } else if let Some((title, consumed)) = split_title(remainder) {
            (Some(title), remainder_start + consumed)
        } else if has_separator {
            (None, remainder_start)
        } else {
            return None;
        };

        Some(Heading {
            start,
            end,
            kind: HeadingKind::Section,
            priority: 1,
            number: Some(number),
            title,
            numeral: None,
            inline: false,
        })
    }

    /// Resolve overlaps: order by offset, longest first, then family
    /// priority, and scan greedily. Mid-line numbered headings are only kept
    /// when they continue the numbering sequence.
    fn resolve(mut candidates: Vec<Heading>) -> Vec<Heading> {
        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.priority.cmp(&b.priority))
        });

        let mut accepted: Vec<Heading> = Vec::new();
        let mut cursor = 0;
        let mut last_numeral: Option<u32> = None;

        for candidate in candidates {
            if candidate.start < cursor {
                continue;
            }
            if candidate.inline
                && (candidate.numeral.is_none()
                    || candidate.numeral != last_numeral.map(|n| n + 1))
            {
                continue;
            }
            if candidate.kind == HeadingKind::Numbered {
                last_numeral = candidate.numeral;
            }
            cursor = candidate.end;
            accepted.push(candidate);
        }

        accepted
    }

    /// Find sub-clauses inside a top-level clause body
    fn sub_clauses(text: &str, body: Span, parent: usize, ordinal: &mut usize) -> Vec<Clause> {
        let slice = &text[body.start..body.end];
        let at_line_start = |abs: usize| abs == 0 || text.as_bytes()[abs - 1] == b'\n';

        let mut markers: Vec<(usize, usize, HeadingKind, String)> = Vec::new();
        for caps in DECIMAL_SUB.captures_iter(slice) {
            if let (Some(m), Some(num)) = (caps.get(0), caps.get(1)) {
                markers.push((m.start(), m.end(), HeadingKind::Decimal, num.as_str().to_string()));
            }
        }
        for m in LETTERED_SUB.find_iter(slice) {
            markers.push((m.start(), m.end(), HeadingKind::Lettered, m.as_str().trim().to_string()));
        }
        markers.retain(|(start, ..)| at_line_start(body.start + start));
        markers.sort_by_key(|(start, ..)| *start);

        let mut subs = Vec::with_capacity(markers.len());
        for (i, (start, marker_end, kind, number)) in markers.iter().enumerate() {
            let end = markers.get(i + 1).map_or(slice.len(), |next| next.0);
            let rest = &slice[*marker_end..line_end(slice, *marker_end)];
            let (title, consumed) = match split_title(rest) {
                Some((title, consumed)) => (Some(title), consumed),
                None => (None, 0),
            };
            let heading_end = marker_end + consumed;

            *ordinal += 1;
            subs.push(Clause {
                ordinal: *ordinal,
                kind: *kind,
                number: Some(number.clone()),
                title,
                body: slice[heading_end..end].trim().to_string(),
                heading_span: Span::new(body.start + start, body.start + heading_end),
                body_span: Span::new(body.start + heading_end, body.start + end),
                parent: Some(parent),
            });
        }
        subs
    }
}

/// Byte offset of the end of the line containing `from`
fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i)
}

/// Split a leading title phrase off the rest of a heading line.
///
/// Returns the title and the bytes consumed, including the terminating
/// `.`/`:` and any blanks after it.
fn split_title(rest: &str) -> Option<(String, usize)> {
    let (candidate, after) = match rest.find(['.', ':']) {
        Some(pos) => (&rest[..pos], pos + 1),
        None => (rest, rest.len()),
    };
    let candidate = candidate.trim();
    if !is_title_like(candidate) {
        return None;
    }
    let tail = &rest[after..];
    let blanks = tail.len() - tail.trim_start_matches([' ', '\t']).len();
    Some((candidate.to_string(), after + blanks))
}

/// Title Case or ALL CAPS phrase of at most `MAX_TITLE_WORDS` words
fn is_title_like(s: &str) -> bool {
    let words: Vec<&str> = s.split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_TITLE_WORDS {
        return false;
    }
    if !words[0].chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }
    words.iter().all(|word| {
        let core = word.trim_matches(|c: char| !c.is_alphanumeric());
        match core.chars().next() {
            Some(c) if c.is_uppercase() || c.is_ascii_digit() => true,
            Some(_) => TITLE_CONNECTORS.contains(&core.to_lowercase().as_str()),
            None => true,
        }
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn contract_line() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("1. Payment. Client pays within 30 days.".to_string()),
            Just("2. Termination. Either party may terminate.".to_string()),
            Just("TERMINATION".to_string()),
            Just("Section 4: Fees".to_string()),
            Just("ARTICLE II".to_string()),
            Just("2.1 Late Fees. A fee applies.".to_string()),
            Just("(a) the first condition".to_string()),
            Just(String::new()),
            "[A-Z][a-z]{1,8}( [a-z]{1,8}){0,6}\\.",
            "[a-z0-9 ,.$%]{1,40}",
            "[1-9]\\. [A-Z][a-z]{2,8}\\. [a-z ]{0,20}",
        ]
    }

    fn contract_text() -> impl Strategy<Value = String> {
        prop::collection::vec(contract_line(), 0..25)
            .prop_map(|lines| lines.join("\n").trim_start().to_string())
    }

    proptest! {
        /// Property: top-level heading and body spans reproduce the text
        #[test]
        fn spans_tile_text(text in contract_text()) {
            let clauses = ClauseSegmenter::clauses(&text);
            let mut rebuilt = String::new();
            for clause in clauses.iter().filter(|c| c.is_top_level()) {
                prop_assert_eq!(clause.heading_span.end, clause.body_span.start);
                rebuilt.push_str(&text[clause.heading_span.start..clause.heading_span.end]);
                rebuilt.push_str(&text[clause.body_span.start..clause.body_span.end]);
            }
            prop_assert_eq!(rebuilt, text);
        }

        /// Property: ordinals are unique and strictly increasing
        #[test]
        fn ordinals_strictly_increase(text in contract_text()) {
            let clauses = ClauseSegmenter::clauses(&text);
            prop_assert!(!clauses.is_empty());
            for pair in clauses.windows(2) {
                prop_assert!(pair[0].ordinal < pair[1].ordinal);
                prop_assert!(pair[0].span().start <= pair[1].span().start);
            }
        }

        /// Property: every sub-clause lies inside an existing top-level parent
        #[test]
        fn sub_clauses_nest_in_parent(text in contract_text()) {
            let clauses = ClauseSegmenter::clauses(&text);
            for sub in clauses.iter().filter(|c| !c.is_top_level()) {
                let parent = clauses
                    .iter()
                    .find(|c| Some(c.ordinal) == sub.parent)
                    .expect("parent exists");
                prop_assert!(parent.is_top_level());
                prop_assert!(sub.span().start >= parent.body_span.start);
                prop_assert!(sub.span().end <= parent.body_span.end);
            }
        }

        /// Property: segmentation is deterministic
        #[test]
        fn segmentation_deterministic(text in contract_text()) {
            prop_assert_eq!(ClauseSegmenter::segment(&text), ClauseSegmenter::segment(&text));
        }
    }
}
