//! Pattern buffer with tail-only prompt search.
//!
//! Device output can be large (`show running-config`, `show tech`), while the
//! prompt that terminates it is always at the end. Only the last
//! `search_depth` bytes are searched, so detection cost does not grow with
//! the size of the output.

use regex::bytes::Regex;

/// Default number of trailing bytes searched for a prompt.
pub const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Accumulates PTY output and splits it at prompt matches.
#[derive(Debug)]
pub struct PatternBuffer {
    buffer: Vec<u8>,
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a buffer that searches the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append raw channel data, dropping ANSI escape sequences.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Offset into the buffer where the searched tail begins.
    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }

    /// Remove and return everything up to and including the last match of
    /// `pattern` in the tail.
    ///
    /// Bytes after the match stay buffered for the next read. Returns `None`
    /// and leaves the buffer untouched when the tail does not match.
    pub fn take_through(&mut self, pattern: &Regex) -> Option<Vec<u8>> {
        let start = self.tail_start();
        let end = pattern
            .find_iter(&self.buffer[start..])
            .last()
            .map(|m| start + m.end())?;

        let rest = self.buffer.split_off(end);
        Some(std::mem::replace(&mut self.buffer, rest))
    }

    /// Bytes received but not yet taken.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEPTH)
    }
}
