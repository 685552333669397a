//! Text helpers shared by the detectors

/// Maximum evidence length in characters, ellipsis included
pub const MAX_EVIDENCE_CHARS: usize = 200;

/// Truncate to at most `max` characters, ending with "..." when cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str("...");
    out
}

/// Byte range of the sentence containing `pos`
///
/// Sentences end at `.`, `!` or `?` followed by whitespace, or at a line
/// break. The range is trimmed of surrounding whitespace.
pub fn sentence_bounds(text: &str, pos: usize) -> (usize, usize) {
    let pos = floor_char_boundary(text, pos.min(text.len()));
    let bytes = text.as_bytes();

    let mut start = pos;
    while start > 0 {
        let prev = bytes[start - 1];
        if prev == b'\n' {
            break;
        }
        if start >= 2
            && bytes[start - 1].is_ascii_whitespace()
            && matches!(bytes[start - 2], b'.' | b'!' | b'?')
        {
            break;
        }
        start -= 1;
    }

    let mut end = pos;
    while end < bytes.len() {
        let b = bytes[end];
        if b == b'\n' {
            break;
        }
        if matches!(b, b'.' | b'!' | b'?')
            && bytes.get(end + 1).map_or(true, |n| n.is_ascii_whitespace())
        {
            end += 1;
            break;
        }
        end += 1;
    }

    let slice = &text[start..end];
    if slice.trim().is_empty() {
        return (pos, pos);
    }
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    (start + leading, end - trailing)
}

/// Sentence around a match, capped at [`MAX_EVIDENCE_CHARS`]
pub fn evidence_at(text: &str, pos: usize) -> String {
    let (start, end) = sentence_bounds(text, pos);
    truncate_chars(&text[start..end], MAX_EVIDENCE_CHARS)
}

/// Whole-word, case-insensitive pattern for a literal keyword
///
/// Internal whitespace in multi-word terms matches any whitespace run.
pub fn keyword_pattern(term: &str) -> String {
    let words: Vec<String> = term.split_whitespace().map(regex::escape).collect();
    format!(r"(?i)\b{}\b", words.join(r"\s+"))
}

fn floor_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}
