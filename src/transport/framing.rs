//! Incremental response framing.
//!
//! The editor's wire format has no length prefix and no response delimiter,
//! so the bridge must infer where one reply ends. This module provides
//! [`FrameScanner`], a resumable character-level scanner that tracks JSON
//! nesting depth and string-escape state across chunk boundaries.
//!
//! Each feed of new bytes yields an explicit [`ScanOutcome`] instead of a
//! caught parse error, so "not enough bytes yet" and "malformed reply" are
//! never conflated.
//!
//! # Pong Fast Path
//!
//! The liveness probe's reply is recognized by its serialized prefix (see
//! [`PONG_PREFIX`]) the moment the prefix has arrived, without waiting for
//! the structural scan to balance the envelope.

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::PONG_PREFIX;

// ============================================================================
// ScanOutcome
// ============================================================================

/// Outcome of scanning the accumulated reply buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The buffer does not yet contain one complete message.
    Incomplete,

    /// A complete message ends at byte offset `len` of the buffer.
    Complete {
        /// Length in bytes of the complete message.
        len: usize,
    },
}

impl ScanOutcome {
    /// Returns `true` if a complete message was found.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

// ============================================================================
// FrameScanner
// ============================================================================

/// Resumable scanner that finds the end of one JSON message in a stream.
///
/// The scanner is fed the whole accumulated buffer on each call and resumes
/// from where the previous call stopped, so every byte is examined exactly
/// once regardless of how the peer chunks the reply.
///
/// String contents are opaque to the depth count: quotes, braces, and
/// backslash escapes inside string values are tracked and never terminate
/// a frame early. Multi-byte UTF-8 continuation bytes are all >= 0x80 and
/// cannot collide with the structural ASCII bytes, so scanning bytewise
/// is sound.
#[derive(Debug, Default)]
pub struct FrameScanner {
    /// Current container nesting depth.
    depth: usize,
    /// Inside a string literal.
    in_string: bool,
    /// Previous byte was a backslash inside a string.
    escaped: bool,
    /// A container has been opened (distinguishes depth 0 before and after).
    started: bool,
    /// Bytes already examined.
    scanned: usize,
}

impl FrameScanner {
    /// Creates a scanner positioned at the start of a fresh reply.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the accumulated buffer for a complete message.
    ///
    /// `buffer` must be the entire reply accumulated so far; the scanner
    /// picks up after the bytes it has already examined. Returns
    /// [`ScanOutcome::Complete`] when the outermost container closes.
    pub fn scan(&mut self, buffer: &[u8]) -> ScanOutcome {
        while self.scanned < buffer.len() {
            let byte = buffer[self.scanned];
            self.scanned += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => {
                    self.depth += 1;
                    self.started = true;
                }
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.started && self.depth == 0 {
                        return ScanOutcome::Complete { len: self.scanned };
                    }
                }
                _ => {}
            }
        }

        ScanOutcome::Incomplete
    }

    /// Returns the number of bytes examined so far.
    #[inline]
    #[must_use]
    pub fn scanned(&self) -> usize {
        self.scanned
    }
}

// ============================================================================
// Pong Fast Path
// ============================================================================

/// Returns `true` if the accumulated buffer is a pong reply.
///
/// Leading whitespace is skipped; the reply is recognized as soon as the
/// serialized pong prefix has arrived, even with trailing bytes still in
/// flight.
#[must_use]
pub fn is_pong_reply(buffer: &[u8]) -> bool {
    let trimmed = match std::str::from_utf8(buffer) {
        Ok(text) => text.trim_start(),
        // A partial multi-byte character at the tail cannot affect the
        // ASCII prefix check.
        Err(e) => match std::str::from_utf8(&buffer[..e.valid_up_to()]) {
            Ok(text) => text.trim_start(),
            Err(_) => return false,
        },
    };

    trimmed.starts_with(PONG_PREFIX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn scan_whole(input: &str) -> ScanOutcome {
        FrameScanner::new().scan(input.as_bytes())
    }

    #[test]
    fn test_simple_object_complete() {
        let outcome = scan_whole(r#"{"status":"success","result":{}}"#);
        assert_eq!(outcome, ScanOutcome::Complete { len: 32 });
    }

    #[test]
    fn test_incomplete_object() {
        assert_eq!(scan_whole(r#"{"status":"success","#), ScanOutcome::Incomplete);
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(scan_whole(""), ScanOutcome::Incomplete);
    }

    #[test]
    fn test_nested_objects() {
        let input = r#"{"a":{"b":{"c":[1,2,{"d":3}]}}}"#;
        assert_eq!(
            scan_whole(input),
            ScanOutcome::Complete {
                len: input.len()
            }
        );
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let input = r#"{"content":"if (x) { return; }"}"#;
        assert_eq!(
            scan_whole(input),
            ScanOutcome::Complete {
                len: input.len()
            }
        );
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let input = r#"{"content":"she said \"hi\" and left"}"#;
        assert_eq!(
            scan_whole(input),
            ScanOutcome::Complete {
                len: input.len()
            }
        );
    }

    #[test]
    fn test_escaped_backslash_before_closing_quote() {
        // The backslash escapes itself; the following quote closes the string.
        let input = r#"{"path":"C:\\"}"#;
        assert_eq!(
            scan_whole(input),
            ScanOutcome::Complete {
                len: input.len()
            }
        );
    }

    #[test]
    fn test_unterminated_string_is_incomplete() {
        assert_eq!(scan_whole(r#"{"content":"unclosed"#), ScanOutcome::Incomplete);
    }

    #[test]
    fn test_multibyte_utf8_in_strings() {
        let input = r#"{"name":"立方体 ✓"}"#;
        assert_eq!(
            scan_whole(input),
            ScanOutcome::Complete {
                len: input.len()
            }
        );
    }

    #[test]
    fn test_leading_whitespace_skipped() {
        let input = "  \n{\"status\":\"success\"}";
        assert_eq!(
            scan_whole(input),
            ScanOutcome::Complete {
                len: input.len()
            }
        );
    }

    #[test]
    fn test_trailing_bytes_not_consumed() {
        let input = r#"{"a":1}{"b":2}"#;
        let outcome = scan_whole(input);
        assert_eq!(outcome, ScanOutcome::Complete { len: 7 });
    }

    #[test]
    fn test_resumes_across_chunks() {
        let message = r#"{"status":"success","result":{"message":"done"}}"#.as_bytes();
        let mut scanner = FrameScanner::new();
        let mut buffer = Vec::new();

        // Feed one byte at a time; only the final byte completes the frame.
        for (i, byte) in message.iter().enumerate() {
            buffer.push(*byte);
            let outcome = scanner.scan(&buffer);
            if i + 1 < message.len() {
                assert_eq!(outcome, ScanOutcome::Incomplete, "at byte {i}");
            } else {
                assert_eq!(
                    outcome,
                    ScanOutcome::Complete {
                        len: message.len()
                    }
                );
            }
        }
    }

    #[test]
    fn test_scanned_tracks_progress() {
        let mut scanner = FrameScanner::new();
        scanner.scan(b"{\"a\":");
        assert_eq!(scanner.scanned(), 5);
        scanner.scan(b"{\"a\":1}");
        assert_eq!(scanner.scanned(), 7);
    }

    #[test]
    fn test_pong_reply_recognized() {
        let buffer = br#"{"status":"success","result":{"message":"pong"}}"#;
        assert!(is_pong_reply(buffer));
    }

    #[test]
    fn test_pong_reply_recognized_before_envelope_closes() {
        // Prefix alone is enough; the closing braces are still in flight.
        let buffer = br#"{"status":"success","result":{"message":"pong""#;
        assert!(is_pong_reply(buffer));
    }

    #[test]
    fn test_pong_reply_with_leading_whitespace() {
        let buffer = b"\n  {\"status\":\"success\",\"result\":{\"message\":\"pong\"}}";
        assert!(is_pong_reply(buffer));
    }

    #[test]
    fn test_pong_reply_with_extra_fields() {
        let buffer =
            br#"{"status":"success","result":{"message":"pong","uptime":12}}"#;
        assert!(is_pong_reply(buffer));
    }

    #[test]
    fn test_non_pong_reply_not_matched() {
        let buffer = br#"{"status":"success","result":{"message":"done"}}"#;
        assert!(!is_pong_reply(buffer));
    }

    #[test]
    fn test_short_buffer_not_matched() {
        assert!(!is_pong_reply(br#"{"status":"succ"#));
    }

    proptest! {
        /// Chunking never changes where a frame completes: scanning a valid
        /// message byte-by-byte, in random splits, or all at once finds the
        /// same frame length.
        #[test]
        fn prop_chunking_invariant(
            value in proptest::arbitrary::any::<bool>().prop_flat_map(|nested| {
                if nested {
                    "\\PC{0,40}".prop_map(|s| {
                        serde_json::json!({"status": "success", "result": {"content": s}})
                    }).boxed()
                } else {
                    "\\PC{0,40}".prop_map(|s| {
                        serde_json::json!({"status": "error", "error": s})
                    }).boxed()
                }
            }),
            split_points in proptest::collection::vec(0usize..200, 0..8),
        ) {
            let message = serde_json::to_vec(&value).expect("serialize");

            // Whole-buffer scan.
            let whole = FrameScanner::new().scan(&message);
            prop_assert_eq!(whole, ScanOutcome::Complete { len: message.len() });

            // Chunked scan at arbitrary split points.
            let mut splits: Vec<usize> = split_points
                .into_iter()
                .map(|p| p % message.len().max(1))
                .collect();
            splits.sort_unstable();
            splits.dedup();

            let mut scanner = FrameScanner::new();
            let mut buffer = Vec::new();
            let mut last = 0;
            for split in splits {
                buffer.extend_from_slice(&message[last..split]);
                let outcome = scanner.scan(&buffer);
                if split < message.len() {
                    prop_assert_eq!(outcome, ScanOutcome::Incomplete);
                }
                last = split;
            }
            buffer.extend_from_slice(&message[last..]);
            prop_assert_eq!(
                scanner.scan(&buffer),
                ScanOutcome::Complete { len: message.len() }
            );
        }
    }
}
