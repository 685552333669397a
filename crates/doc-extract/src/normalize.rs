//! Whitespace normalization shared by every input format
//!
//! Line breaks survive normalization because clause headings are
//! line-anchored. Everything else is collapsed:
//!
//! - CRLF and CR become LF, form feeds (page breaks) become line breaks
//! - runs of spaces and tabs inside a line become one space
//! - each line is trimmed
//! - consecutive blank lines collapse to one, leading and trailing blank
//!   lines are dropped

/// Normalize extracted text
pub fn normalize_text(raw: &str) -> String {
    let unified = raw
        .replace("\r\n", "\n")
        .replace(['\r', '\u{000C}'], "\n");

    let mut out = String::with_capacity(unified.len());
    let mut pending_blank = false;

    for line in unified.split('\n') {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        out.push_str(&collapsed);
        pending_blank = false;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_collapses_whitespace_within_lines() {
        assert_eq!(normalize_text("  a \t b   c  "), "a b c");
    }

    #[test]
    fn test_removes_page_breaks() {
        assert_eq!(
            normalize_text("end of page one\x0cstart of page two"),
            "end of page one\nstart of page two"
        );
    }

    #[test]
    fn test_collapses_blank_runs() {
        assert_eq!(normalize_text("\n\n\na\n\n\n\nb\n\n"), "a\n\nb");
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(normalize_text("a\r\nb\rc"), "a\nb\nc");
    }

    proptest! {
        /// Property: normalization is idempotent
        #[test]
        fn normalize_idempotent(raw in "[a-zA-Z0-9 \t\r\n\x0c.,]{0,200}") {
            let once = normalize_text(&raw);
            prop_assert_eq!(normalize_text(&once), once.clone());
        }

        /// Property: no line has leading/trailing or doubled spaces
        #[test]
        fn normalized_lines_are_clean(raw in "[a-z \t\n]{0,200}") {
            let text = normalize_text(&raw);
            for line in text.lines() {
                prop_assert_eq!(line.trim(), line);
                prop_assert!(!line.contains("  "));
                prop_assert!(!line.contains('\t'));
            }
            prop_assert!(!text.contains("\n\n\n"));
        }

        /// Property: non-whitespace characters are preserved in order
        #[test]
        fn normalize_preserves_words(raw in "[a-z \n]{0,200}") {
            let before: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let after: String = normalize_text(&raw).chars().filter(|c| !c.is_whitespace()).collect();
            prop_assert_eq!(before, after);
        }
    }
}
