//! Streaming removal of `<think>` reasoning spans.
//!
//! [`ThinkTagFilter`] consumes a response body in arbitrary chunks and returns
//! only text that is provably outside any tag span. Anything that might still
//! turn into a marker stays in an internal carry buffer until more input (or
//! [`ThinkTagFilter::flush`]) decides it.
//!
//! # Example
//!
//! ```
//! use thinkstrip_core::filter::ThinkTagFilter;
//!
//! let mut filter = ThinkTagFilter::new();
//! let mut out = filter.process_chunk("Hello <thi");
//! out.push_str(&filter.process_chunk("nk>reasoning</thin"));
//! out.push_str(&filter.process_chunk("k> world!"));
//! out.push_str(&filter.flush());
//! assert_eq!(out, "Hello  world!");
//! ```

mod cleanup;
mod markers;

use tracing::{debug, trace};

pub use markers::DelimiterForm;
use markers::find_ignore_ascii_case;

/// Minimum number of trailing characters held back while no open marker is
/// in sight. Must exceed [`DelimiterForm::longest_marker_len`].
pub const LOOKBACK_WINDOW: usize = 1024;

const _: () = assert!(LOOKBACK_WINDOW > DelimiterForm::longest_marker_len());

/// An open marker sitting at the start of the carry buffer, still waiting
/// for its close marker.
#[derive(Debug, Clone, Copy)]
struct OpenSpan {
    form: DelimiterForm,
    /// Byte offset in the carry buffer where the close-marker scan resumes.
    close_from: usize,
}

/// Incremental think-tag stripper for one response body.
///
/// Not thread-safe by design: one filter per body, fed sequentially.
#[derive(Debug, Default)]
pub struct ThinkTagFilter {
    carry: String,
    open_span: Option<OpenSpan>,
    removed_spans: usize,
}

impl ThinkTagFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next piece of the body and return the text that is now safe
    /// to emit. The result may be empty.
    pub fn process_chunk(&mut self, text: &str) -> String {
        self.carry.push_str(text);
        let mut output = String::new();

        loop {
            let span = match self.open_span.take() {
                Some(span) => span,
                None => {
                    let Some((start, form)) = DelimiterForm::earliest_open(&self.carry) else {
                        self.release_beyond_lookback(&mut output);
                        break;
                    };
                    output.push_str(&self.carry[..start]);
                    self.carry.drain(..start);
                    OpenSpan {
                        form,
                        close_from: 0,
                    }
                }
            };

            let close = span.form.close();
            match find_ignore_ascii_case(&self.carry, close, span.close_from) {
                Some(at) => {
                    let end = at + close.len();
                    self.record_removal(span.form, end);
                    self.carry.drain(..end);
                }
                None => {
                    // Rescan only the tail that could still hold a split close marker.
                    self.open_span = Some(OpenSpan {
                        form: span.form,
                        close_from: self.carry.len().saturating_sub(close.len() - 1),
                    });
                    break;
                }
            }
        }

        output
    }

    /// Resolve everything still buffered and reset the filter.
    ///
    /// Complete spans are removed, an unterminated span is dropped from its
    /// open marker to the end, and the remaining text is returned.
    pub fn flush(&mut self) -> String {
        self.open_span = None;
        let carry = std::mem::take(&mut self.carry);
        if carry.is_empty() {
            return carry;
        }

        let mut remaining = cleanup::strip_complete_spans(&carry);
        let dropped = cleanup::drop_unterminated(&mut remaining);
        if dropped > 0 {
            debug!(bytes = dropped, "Dropped unterminated think span at end of stream");
        }
        remaining
    }

    /// Number of complete spans removed so far by [`Self::process_chunk`].
    pub const fn removed_spans(&self) -> usize {
        self.removed_spans
    }

    /// Bytes currently held back in the carry buffer.
    pub fn buffered_len(&self) -> usize {
        self.carry.len()
    }

    /// Whether the carry buffer currently starts with an unterminated span.
    pub const fn in_span(&self) -> bool {
        self.open_span.is_some()
    }

    /// Move all but the last [`LOOKBACK_WINDOW`] characters of a marker-free
    /// carry buffer into `output`.
    fn release_beyond_lookback(&mut self, output: &mut String) {
        let Some((keep_from, _)) = self.carry.char_indices().rev().nth(LOOKBACK_WINDOW - 1) else {
            return;
        };
        if keep_from > 0 {
            output.push_str(&self.carry[..keep_from]);
            self.carry.drain(..keep_from);
        }
    }

    fn record_removal(&mut self, form: DelimiterForm, span_len: usize) {
        self.removed_spans += 1;
        debug!(form = %form, bytes = span_len, "Filtered out think span");
        trace!(span = %&self.carry[..span_len], "Removed think span content");
    }
}
