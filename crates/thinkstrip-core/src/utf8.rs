//! UTF-8 decoding for byte chunks that may split a character.

/// Decodes a sequence of byte chunks into text.
///
/// An incomplete multi-byte sequence at the end of a chunk is held back and
/// completed by the next chunk instead of being replaced. Invalid bytes are
/// replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid_len..];
                        }
                        None => {
                            // Truncated sequence at the end: wait for more bytes.
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Decode whatever is still held back. Call once the input has ended.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b"hello"), "hello");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_split_character_is_reassembled() {
        let bytes = "naïve → ok".as_bytes();
        for at in 0..=bytes.len() {
            let mut decoder = Utf8ChunkDecoder::new();
            let mut out = decoder.decode(&bytes[..at]);
            out.push_str(&decoder.decode(&bytes[at..]));
            out.push_str(&decoder.finish());
            assert_eq!(out, "naïve → ok", "split at {at}");
        }
    }

    #[test]
    fn test_four_byte_character_fed_bytewise() {
        let mut decoder = Utf8ChunkDecoder::new();
        let mut out = String::new();
        for byte in "🦀".as_bytes() {
            out.push_str(&decoder.decode(&[*byte]));
        }
        assert_eq!(out, "🦀");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{fffd}b");
    }

    #[test]
    fn test_truncated_tail_is_flushed_lossily() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b"ok\xe2\x86"), "ok");
        assert_eq!(decoder.pending_len(), 2);
        assert_eq!(decoder.finish(), "\u{fffd}");
    }
}
