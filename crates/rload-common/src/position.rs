//! Position types for line/column source locations.
//!
//! Offsets are UTF-8 byte offsets into the source text. Columns are counted
//! in UTF-16 code units, which is what source map consumers expect.

use serde::{Deserialize, Serialize};

/// A zero-based line/column position in a source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Zero-based line index
    pub line: u32,
    /// Zero-based column, in UTF-16 code units
    pub column: u32,
    /// Byte offset that was converted
    pub offset: usize,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        SourcePosition {
            line,
            column,
            offset,
        }
    }
}

/// Precomputed line start offsets for fast offset -> position conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineMap {
    line_starts: Vec<usize>,
}

impl LineMap {
    /// Build a line map for `source`. Only `\n` terminates a line.
    pub fn build(source: &str) -> Self {
        let mut line_starts = Vec::with_capacity(source.len() / 32 + 1);
        line_starts.push(0);
        line_starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|idx| idx + 1));
        LineMap { line_starts }
    }

    /// Number of lines (a trailing newline starts an empty last line).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of the first character of `line`.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Zero-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Convert a byte offset into a line/column position.
    ///
    /// Offsets past the end of `source` are clamped to its length.
    pub fn position(&self, offset: usize, source: &str) -> SourcePosition {
        let offset = offset.min(source.len());
        let line = self.line_of(offset);
        let line_start = self.line_starts[line];
        let column = match source.get(line_start..offset) {
            Some(prefix) => utf16_len(prefix),
            // Not on a char boundary; fall back to the byte distance.
            None => offset - line_start,
        };
        SourcePosition::new(line as u32, column as u32, offset)
    }

    /// Text of `line` without its terminating newline (or `\r\n`).
    pub fn line_text<'a>(&self, line: usize, source: &'a str) -> &'a str {
        let Some(&start) = self.line_starts.get(line) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(source.len(), |&next| next - 1);
        let text = source.get(start..end).unwrap_or("");
        text.strip_suffix('\r').unwrap_or(text)
    }
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}
