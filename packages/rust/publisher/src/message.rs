//! Outbound message composition.

use newsrelay_shared::text::{char_len, truncate_with_ellipsis};

/// Separator between the short text and the link.
const SEPARATOR: &str = "\n\n";

/// Compose `"{short_text}\n\n{url}"`, shortening the text with an ellipsis so
/// the whole message fits in `limit` characters. The link is never cut; if
/// it alone does not leave room for any text, the message is just the link.
pub fn compose_message(short_text: &str, url: &str, limit: usize) -> String {
    let short_text = short_text.trim();
    let full = format!("{short_text}{SEPARATOR}{url}");
    if char_len(&full) <= limit {
        return full;
    }

    let overhead = char_len(url) + char_len(SEPARATOR);
    match limit.checked_sub(overhead) {
        Some(budget) if budget > 0 => {
            let text = truncate_with_ellipsis(short_text, budget);
            format!("{text}{SEPARATOR}{url}")
        }
        _ => url.to_string(),
    }
}
