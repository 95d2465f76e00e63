//! Delimiter forms and case-insensitive marker scanning.

/// How a think-tag pair is encoded in the response text.
///
/// Ollama emits reasoning either as raw markup (plain-text or NDJSON bodies
/// where the model output was not escaped) or with `<` escaped as the JSON
/// sequence `\u003c`. Both encode the same logical delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelimiterForm {
    /// `<think ...>` ... `</think>`
    Literal,
    /// `\u003cthink ...>` ... `\u003c/think\u003e`
    Escaped,
}

impl DelimiterForm {
    /// All forms, in tie-break order.
    pub const ALL: [Self; 2] = [Self::Literal, Self::Escaped];

    /// Open marker prefix. Attributes may follow it before the closing `>`.
    #[must_use]
    pub const fn open(self) -> &'static str {
        match self {
            Self::Literal => "<think",
            Self::Escaped => "\\u003cthink",
        }
    }

    /// Close marker.
    #[must_use]
    pub const fn close(self) -> &'static str {
        match self {
            Self::Literal => "</think>",
            Self::Escaped => "\\u003c/think\\u003e",
        }
    }

    /// Length in bytes of the longest marker over all forms.
    #[must_use]
    pub const fn longest_marker_len() -> usize {
        let mut longest = 0;
        let mut i = 0;
        while i < Self::ALL.len() {
            let form = Self::ALL[i];
            if form.open().len() > longest {
                longest = form.open().len();
            }
            if form.close().len() > longest {
                longest = form.close().len();
            }
            i += 1;
        }
        longest
    }

    /// Find the earliest open marker of any form in `text`.
    ///
    /// When two forms start at the same offset, `Literal` wins.
    #[must_use]
    pub fn earliest_open(text: &str) -> Option<(usize, Self)> {
        Self::ALL
            .iter()
            .filter_map(|&form| find_ignore_ascii_case(text, form.open(), 0).map(|at| (at, form)))
            .min_by_key(|&(at, _)| at)
    }
}

impl std::fmt::Display for DelimiterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal => write!(f, "literal"),
            Self::Escaped => write!(f, "escaped"),
        }
    }
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`
/// in `haystack` at or after `from`.
///
/// `needle` must be ASCII, so every match starts and ends on a char boundary.
pub(crate) fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from > hay.len() || hay.len() - from < needle.len() {
        return None;
    }
    (from..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
