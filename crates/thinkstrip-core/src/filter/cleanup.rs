//! End-of-stream cleanup over whatever the incremental scanner left behind.
//!
//! Regex is only used here, on the carry buffer at flush time. The
//! incremental path never runs a regex over unbounded input.

use std::sync::LazyLock;

use regex::Regex;

use super::markers::DelimiterForm;

// ASCII-only case folding, matching the incremental scanner.
static LITERAL_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?i-u:<think).*?(?i-u:</think>)").expect("literal span pattern is valid")
});

static ESCAPED_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?i-u:\\u003cthink).*?(?i-u:\\u003c/think\\u003e)")
        .expect("escaped span pattern is valid")
});

/// Remove every complete tag span of either form from `text`.
pub(crate) fn strip_complete_spans(text: &str) -> String {
    let literal_free = LITERAL_SPAN.replace_all(text, "");
    ESCAPED_SPAN.replace_all(&literal_free, "").into_owned()
}

/// Cut `text` at the earliest open marker that has no matching close marker.
///
/// Returns the number of bytes dropped.
pub(crate) fn drop_unterminated(text: &mut String) -> usize {
    match DelimiterForm::earliest_open(text) {
        Some((start, _)) => {
            let dropped = text.len() - start;
            text.truncate(start);
            dropped
        }
        None => 0,
    }
}
