//! Byte-chunk to line reassembly.
//!
//! Process pipes deliver output in arbitrary chunks: a chunk may contain
//! several lines, half a line, or even split a multi-byte character. The
//! splitter buffers the trailing partial line across `push` calls so the
//! decoded line sequence is identical however the stream was chunked.

/// Reassembles newline-delimited lines from a chunked byte stream.
#[derive(Debug, Default)]
pub struct LineSplitter {
    partial: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line completed by it.
    ///
    /// A trailing `\r` is stripped from each line. Bytes after the last
    /// newline stay buffered until a later chunk (or [`finish`](Self::finish))
    /// completes them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.partial.extend_from_slice(&rest[..pos]);
            lines.push(self.take_partial());
            rest = &rest[pos + 1..];
        }

        self.partial.extend_from_slice(rest);
        lines
    }

    /// Flush the buffered partial line at end of stream, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            None
        } else {
            Some(self.take_partial())
        }
    }

    fn take_partial(&mut self) -> String {
        if self.partial.last() == Some(&b'\r') {
            self.partial.pop();
        }
        let line = String::from_utf8_lossy(&self.partial).into_owned();
        self.partial.clear();
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk_multiple_lines() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"one\ntwo\nthree\n");
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"hel").is_empty());
        assert!(splitter.push(b"lo wor").is_empty());
        let lines = splitter.push(b"ld\n");
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn test_chunk_merging_lines() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"a\nb");
        assert_eq!(lines, vec!["a"]);
        let lines = splitter.push(b"\nc\n");
        assert_eq!(lines, vec!["b", "c"]);
    }

    #[test]
    fn test_crlf_stripped() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"windows line\r\n");
        assert_eq!(lines, vec!["windows line"]);
    }

    #[test]
    fn test_finish_flushes_trailing_partial() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"no newline").is_empty());
        assert_eq!(splitter.finish(), Some("no newline".to_string()));
        // A second finish is a no-op
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_multibyte_character_split_mid_chunk() {
        let mut splitter = LineSplitter::new();
        let text = "héllo\n".as_bytes();
        // Split inside the two-byte 'é'
        assert!(splitter.push(&text[..2]).is_empty());
        let lines = splitter.push(&text[2..]);
        assert_eq!(lines, vec!["héllo"]);
    }

    #[test]
    fn test_byte_boundary_invariance() {
        let input = "first\nsecond line\nthird\n".as_bytes();
        let mut whole = LineSplitter::new();
        let expected = whole.push(input);

        for split_at in 0..input.len() {
            let mut splitter = LineSplitter::new();
            let mut lines = splitter.push(&input[..split_at]);
            lines.extend(splitter.push(&input[split_at..]));
            assert_eq!(lines, expected, "split at byte {split_at}");
        }
    }
}
