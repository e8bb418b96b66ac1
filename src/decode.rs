//! Incremental UTF-8 decoding for streamed response bodies.
//!
//! Network fragments can end in the middle of a multi-byte character. The
//! decoder emits the longest valid prefix of each fragment and carries the
//! incomplete tail over to the next call.

/// Stream decoding errors. Not recoverable: the stream is aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid UTF-8 in response stream at byte {offset}")]
    Invalid { offset: usize },
    #[error("Response stream ended inside a multi-byte character ({pending} bytes pending)")]
    Truncated { pending: usize },
}

/// Stateful UTF-8 decoder fed one fragment at a time.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Bytes of an incomplete trailing character (at most 3).
    pending: Vec<u8>,
    /// Bytes already decoded, for error offsets.
    consumed: usize,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next fragment, holding back an incomplete trailing character.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<String, DecodeError> {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(bytes);

        let valid = match std::str::from_utf8(&buf) {
            Ok(_) => buf.len(),
            Err(e) if e.error_len().is_some() => {
                return Err(DecodeError::Invalid {
                    offset: self.consumed + e.valid_up_to(),
                });
            }
            // None means the input ended mid-character: keep the tail for later
            Err(e) => e.valid_up_to(),
        };

        self.pending = buf.split_off(valid);
        let offset = self.consumed;
        self.consumed += valid;

        String::from_utf8(buf).map_err(|e| DecodeError::Invalid {
            offset: offset + e.utf8_error().valid_up_to(),
        })
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Finish the stream. Fails if a character was left incomplete.
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::Truncated {
                pending: self.pending.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii_passthrough() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Hel").unwrap(), "Hel");
        assert_eq!(decoder.decode(b"lo").unwrap(), "lo");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_decode_split_two_byte_char() {
        // "é" is C3 A9
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"caf\xC3").unwrap(), "caf");
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decoder.decode(b"\xA9!").unwrap(), "é!");
        assert_eq!(decoder.pending_len(), 0);
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_decode_arabic_split_byte_by_byte() {
        let text = "مرحبا";
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for byte in text.as_bytes() {
            out.push_str(&decoder.decode(&[*byte]).unwrap());
        }
        assert_eq!(out, text);
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_decode_four_byte_char_across_three_fragments() {
        // U+1F680 is F0 9F 9A 80
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"\xF0").unwrap(), "");
        assert_eq!(decoder.decode(b"\x9F\x9A").unwrap(), "");
        assert_eq!(decoder.decode(b"\x80 go").unwrap(), "\u{1F680} go");
    }

    #[test]
    fn test_decode_empty_fragment() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"").unwrap(), "");
    }

    #[test]
    fn test_decode_invalid_sequence_reports_offset() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"abc").unwrap(), "abc");
        let err = decoder.decode(b"d\xFFe").unwrap_err();
        assert_eq!(err, DecodeError::Invalid { offset: 4 });
    }

    #[test]
    fn test_finish_with_incomplete_char_fails() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"x\xE2\x82").unwrap(), "x");
        assert_eq!(
            decoder.finish(),
            Err(DecodeError::Truncated { pending: 2 })
        );
    }
}
