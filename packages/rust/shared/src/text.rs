//! Character-counted text helpers.
//!
//! Budgets in this crate are counted in `char`s, not bytes, so multi-byte
//! text (Japanese headlines, emoji) is never split mid-character.

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The first `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Shorten `s` to at most `max_chars` characters, ending with `...` when cut.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";
    if char_len(s) <= max_chars {
        return s.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return truncate_chars(s, max_chars).to_string();
    }
    let head = truncate_chars(s, max_chars - ELLIPSIS.len()).trim_end();
    format!("{head}{ELLIPSIS}")
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let s = "ニュース速報です";
        assert_eq!(truncate_chars(s, 4), "ニュース");
        assert_eq!(truncate_chars(s, 100), s);
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn ellipsis_respects_budget() {
        let s = "a".repeat(300);
        let out = truncate_with_ellipsis(&s, 250);
        assert_eq!(char_len(&out), 250);
        assert!(out.ends_with("..."));

        assert_eq!(truncate_with_ellipsis("short", 250), "short");
        assert_eq!(truncate_with_ellipsis("abcdef", 2), "ab");
    }

    #[test]
    fn collapse_whitespace_normalizes() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
    }
}
