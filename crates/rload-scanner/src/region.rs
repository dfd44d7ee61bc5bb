//! Masked regions
//!
//! A masked region is a span of script text that must not take part in
//! naive pattern matching: the inside of a string, a comment, a regex
//! literal, or the literal text of a template string.

use serde::Serialize;

/// What kind of lexical construct a region covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskKind {
    /// `"..."` or `'...'`
    StringLiteral,
    /// `// ...` up to, not including, the newline
    LineComment,
    /// `/* ... */`
    BlockComment,
    /// `/.../` without trailing flags
    Regex,
    /// Template text up to and including a `${`, starting at the opening
    /// backtick or at the `}` that closed the previous substitution
    TemplateChunk,
    /// Template text up to and including the closing backtick
    TemplateEnd,
}

impl MaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            MaskKind::StringLiteral => "string",
            MaskKind::LineComment => "line",
            MaskKind::BlockComment => "block",
            MaskKind::Regex => "regex",
            MaskKind::TemplateChunk => "templateChunk",
            MaskKind::TemplateEnd => "templateEnd",
        }
    }

    /// Comments are erased entirely; other kinds keep their delimiters.
    pub fn is_comment(&self) -> bool {
        matches!(self, MaskKind::LineComment | MaskKind::BlockComment)
    }
}

/// A masked span of a scanned source (byte offsets, `end` exclusive).
///
/// `inner_start..inner_end` is the content between the delimiters. For an
/// unterminated construct at end of input the closing delimiter is absent
/// and `inner_end == end`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedRegion {
    pub kind: MaskKind,
    pub start: usize,
    pub end: usize,
    pub inner_start: usize,
    pub inner_end: usize,
}

impl MaskedRegion {
    pub(crate) fn new(
        kind: MaskKind,
        start: usize,
        end: usize,
        inner_start: usize,
        inner_end: usize,
    ) -> Self {
        let inner_start = inner_start.clamp(start, end);
        let inner_end = inner_end.clamp(inner_start, end);
        MaskedRegion {
            kind,
            start,
            end,
            inner_start,
            inner_end,
        }
    }

    /// The full text of the region, delimiters included.
    pub fn outer_text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }

    /// The text between the delimiters.
    pub fn inner_text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.inner_start..self.inner_end).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` falls inside the region.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether the byte at `offset` is blanked when the region is erased.
    pub fn masks(&self, offset: usize) -> bool {
        if !self.contains(offset) {
            return false;
        }
        self.kind.is_comment() || (self.inner_start <= offset && offset < self.inner_end)
    }

    /// Append the erased form of the region to `out`: same byte length,
    /// same newlines, masked characters replaced by spaces.
    pub(crate) fn erase_into(&self, source: &str, out: &mut String) {
        let Some(outer) = source.get(self.start..self.end) else {
            return;
        };
        for (idx, ch) in outer.char_indices() {
            if ch == '\n' || ch == '\r' || !self.masks(self.start + idx) {
                out.push(ch);
            } else {
                out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
            }
        }
    }
}
