//! Stream Codec Module
//!
//! Incremental decoder for the newline-delimited JSON feed. The transport
//! delivers byte chunks with arbitrary boundaries; a logical record is the
//! JSON text between CRLF separators. The feed also sends periodic blank
//! keep-alive lines, which are skipped without being reported.

use serde_json::Value;

/// Record separator used by the feed.
const SEPARATOR: &[u8] = b"\r\n";

// =============================================================================
// Error Type
// =============================================================================

/// A single malformed record segment.
///
/// Isolated to that segment: the decoder drops it and continues with the
/// next separator, so one bad record never corrupts the ones after it.
#[derive(Debug, thiserror::Error)]
#[error("malformed record segment: {source}")]
pub struct DecodeError {
    /// The raw segment text that failed to parse.
    pub segment: String,
    /// The underlying JSON parse error.
    #[source]
    pub source: serde_json::Error,
}

// =============================================================================
// Line Decoder
// =============================================================================

/// Incremental CRLF-delimited JSON decoder.
///
/// Bytes after the last separator stay buffered until the next
/// [`feed`](Self::feed) call, so a record split across any number of
/// chunks is reassembled correctly.
///
/// # Example
///
/// ```rust
/// use firehose_client::infrastructure::firehose::codec::LineDecoder;
///
/// let mut decoder = LineDecoder::new();
/// assert!(decoder.feed(b"{\"text\":").is_empty());
///
/// let records = decoder.feed(b"\"taco\"}\r\n");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].as_ref().unwrap()["text"], "taco");
/// ```
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Create a new decoder with an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append a chunk and decode every complete record it finishes.
    ///
    /// Returns one entry per separator-terminated segment, in stream
    /// order: `Ok` with the parsed JSON value, or `Err` with the malformed
    /// segment. Whitespace-only segments yield nothing.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<Value, DecodeError>> {
        self.buf.extend_from_slice(chunk);

        let mut records = Vec::new();

        while let Some(pos) = find_separator(&self.buf) {
            let rest = self.buf.split_off(pos + SEPARATOR.len());
            let mut segment = std::mem::replace(&mut self.buf, rest);
            segment.truncate(pos);

            let text = String::from_utf8_lossy(&segment);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                // Keep-alive line
                continue;
            }

            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => records.push(Ok(value)),
                Err(source) => records.push(Err(DecodeError {
                    segment: trimmed.to_owned(),
                    source,
                })),
            }
        }

        records
    }

    /// Clear the buffer.
    ///
    /// Called whenever the owning connection is replaced: a new connection
    /// must never see a partial record from the prior one.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Number of bytes currently buffered without a terminating separator.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

fn find_separator(buf: &[u8]) -> Option<usize> {
    buf.windows(SEPARATOR.len()).position(|w| w == SEPARATOR)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_complete_record() {
        let mut decoder = LineDecoder::new();

        let records = decoder.feed(b"{\"text\":\"Taco\"}\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap()["text"], "Taco");
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn record_split_across_two_chunks() {
        let mut decoder = LineDecoder::new();

        assert!(decoder.feed(b"{\"text\":").is_empty());

        let records = decoder.feed(b"\"taco\"}\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap()["text"], "taco");
    }

    #[test]
    fn record_split_byte_by_byte() {
        let mut decoder = LineDecoder::new();
        let data = b"{\"id\":42}\r\n";

        let mut records = Vec::new();
        for byte in data {
            records.extend(decoder.feed(std::slice::from_ref(byte)));
        }

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap()["id"], 42);
    }

    #[test]
    fn separator_split_across_chunks() {
        let mut decoder = LineDecoder::new();

        assert!(decoder.feed(b"{\"a\":1}\r").is_empty());

        let records = decoder.feed(b"\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap()["a"], 1);
    }

    #[test]
    fn multiple_records_in_one_chunk() {
        let mut decoder = LineDecoder::new();

        let records = decoder.feed(b"{\"n\":1}\r\n{\"n\":2}\r\n{\"n\":3}\r\n");
        assert_eq!(records.len(), 3);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.as_ref().unwrap()["n"], i as u64 + 1);
        }
    }

    #[test]
    fn keep_alive_lines_are_skipped() {
        let mut decoder = LineDecoder::new();

        let records = decoder.feed(b"{\"n\":1}\r\n\r\n{\"n\":2}\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].as_ref().unwrap()["n"], 1);
        assert_eq!(records[1].as_ref().unwrap()["n"], 2);
    }

    #[test]
    fn whitespace_only_segment_skipped() {
        let mut decoder = LineDecoder::new();

        let records = decoder.feed(b"  \r\n{\"n\":1}\r\n");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn malformed_segment_reported_and_isolated() {
        let mut decoder = LineDecoder::new();

        let records = decoder.feed(b"{\"ok\":1}\r\nnot json\r\n{\"ok\":2}\r\n");
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].as_ref().unwrap()["ok"], 1);

        let err = records[1].as_ref().unwrap_err();
        assert_eq!(err.segment, "not json");

        assert_eq!(records[2].as_ref().unwrap()["ok"], 2);
    }

    #[test]
    fn tail_stays_buffered() {
        let mut decoder = LineDecoder::new();

        let records = decoder.feed(b"{\"n\":1}\r\n{\"partial\":");
        assert_eq!(records.len(), 1);
        assert!(decoder.buffered() > 0);

        let records = decoder.feed(b"true}\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap()["partial"], true);
    }

    #[test]
    fn reset_discards_partial_record() {
        let mut decoder = LineDecoder::new();

        assert!(decoder.feed(b"{\"partial\":").is_empty());
        decoder.reset();
        assert_eq!(decoder.buffered(), 0);

        // The next connection's bytes decode cleanly
        let records = decoder.feed(b"{\"n\":1}\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap()["n"], 1);
    }

    #[test]
    fn chunk_without_separator_is_a_noop() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.feed(b"{\"never\":\"terminated\"").is_empty());
        assert!(decoder.feed(b" and more").is_empty());
    }
}
