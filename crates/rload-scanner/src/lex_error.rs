//! Scanner errors

use rload_common::LineMap;
use std::fmt;

/// The scanner reached a character with no valid transition.
///
/// This means either the input is not valid script, or it uses a lexical
/// construct the scanner does not handle. The whole scan is aborted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    /// One-based line
    pub line: u32,
    /// Zero-based column, in characters
    pub column: u32,
    /// Byte offset of the offending character
    pub offset: usize,
    pub character: char,
    /// The offending line followed by a caret line under `column`
    pub snippet: String,
}

impl LexError {
    pub(crate) fn unexpected_character(source: &str, offset: usize, character: char) -> Self {
        let line_map = LineMap::build(source);
        let line = line_map.line_of(offset);
        let line_start = line_map.line_start(line).unwrap_or(0);
        let column = source
            .get(line_start..offset)
            .map_or(0, |prefix| prefix.chars().count());
        let line_text = line_map.line_text(line, source);

        let snippet = format!("{line_text}\n{}^", " ".repeat(column));

        LexError {
            line: line as u32 + 1,
            column: column as u32,
            offset,
            character,
            snippet,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unexpected character '{}' ({}:{})\n\n{}",
            self.character, self.line, self.column, self.snippet
        )
    }
}

impl std::error::Error for LexError {}
