// src/event/line_buffer.rs

//! Reassembly of newline-delimited text from arbitrary read chunks.

use tracing::warn;

/// Longest line kept, in bytes (excluding the line terminator).
pub const MAX_LINE_LEN: usize = 1024 * 1024;

/// Accumulates raw bytes and hands out complete lines.
///
/// Chunk boundaries coming from the OS pipe are arbitrary: a single JSON
/// object may arrive in several reads, and one read may carry several
/// objects. Only bytes up to a `\n` are ever released; the tail stays buffered
/// until the next chunk or [`LineBuffer::finish`].
///
/// Lines longer than the limit are dropped whole, whatever the chunking.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to contain no `\n`.
    scanned: usize,
    limit: usize,
    /// Inside an oversized line whose start was already thrown away.
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_LEN)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            limit,
            discarding: false,
        }
    }

    /// Append a chunk and return every line it completed, without the
    /// trailing `\n` / `\r\n`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.pending[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            let mut line = &self.pending[start..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }

            if std::mem::take(&mut self.discarding) {
                // Tail of a line that was already reported as oversized.
            } else if line.len() > self.limit {
                warn!(len = line.len(), limit = self.limit, "dropping oversized output line");
            } else {
                lines.push(String::from_utf8_lossy(line).into_owned());
            }

            start = end + 1;
            from = start;
        }

        self.pending.drain(..start);
        self.scanned = self.pending.len();

        // One extra byte for a possible `\r` that would be stripped.
        if self.pending.len() > self.limit + 1 {
            if !self.discarding {
                warn!(limit = self.limit, "dropping oversized output line");
            }
            self.pending.clear();
            self.scanned = 0;
            self.discarding = true;
        }

        lines
    }

    /// Flush whatever is left once the stream hit EOF.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) || rest.is_empty() {
            return None;
        }
        if rest.len() > self.limit {
            warn!(len = rest.len(), limit = self.limit, "dropping oversized output line");
            return None;
        }
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
