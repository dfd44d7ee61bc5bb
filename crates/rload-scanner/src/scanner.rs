//! Masked-region scanner
//!
//! A character-driven state machine that walks a script once and records
//! every span that is not plain code. It does not tokenize or parse; it only
//! tracks enough lexical context to know whether a character sits inside a
//! string, comment, regex literal or template string.
//!
//! The one judgment call is what a `/` means in code position. It may start
//! a regex literal or be the division operator; `slash_starts_regex` decides
//! from the text that precedes it.

use crate::lex_error::LexError;
use crate::region::{MaskKind, MaskedRegion};

/// Lexical mode of the scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// Plain code
    Base,
    /// Just saw a `/` in code; the next character decides what it was
    Slash,
    Regex,
    /// Inside `[...]` of a regex literal, where `/` does not terminate
    RegexCharacterClass,
    /// Inside a string delimited by the given quote
    StringLiteral(char),
    TemplateLiteral,
    /// Just saw a `$` inside a template string
    TemplateDollar,
    LineComment,
    BlockComment,
    /// Just saw a `*` inside a block comment
    BlockCommentEnding,
    /// The character after a backslash; always returns to `escaped_from`
    Escaped,
}

/// Result of feeding one character to the current state.
enum Transition {
    /// Move to the state; the character is consumed.
    Next(ScanState),
    /// Move to the state and feed it the same character again.
    Reprocess(ScanState),
}

const REGEX_KEYWORDS: &[&str] = &[
    "case",
    "default",
    "delete",
    "do",
    "else",
    "in",
    "instanceof",
    "new",
    "return",
    "throw",
    "typeof",
    "void",
];

/// Last characters of the punctuators after which a `/` starts a regex.
/// Every multi-character operator (`>>>=`, `&&`, `!==`, ...) ends in one
/// of these.
const REGEX_PUNCTUATOR_ENDINGS: &[u8] = b"{([;,<>=!+-*%&|^~?:/";

/// Scanner state for one pass over a source string.
pub struct MaskScanner<'a> {
    source: &'a str,
    state: ScanState,
    escaped_from: ScanState,
    /// Where `}` resumes: `Base` for blocks, `TemplateLiteral` for `${`
    stack: Vec<ScanState>,
    /// Start offset of the construct being scanned
    start: usize,
    regex_enabled: bool,
    /// Set right after `++`/`--`, so a following `/` is division
    prefix_increment_or_decrement: bool,
    prev_char: Option<char>,
    regions: Vec<MaskedRegion>,
}

impl<'a> MaskScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        MaskScanner {
            source,
            state: ScanState::Base,
            escaped_from: ScanState::Base,
            stack: Vec::new(),
            start: 0,
            regex_enabled: true,
            prefix_increment_or_decrement: false,
            prev_char: None,
            regions: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Regions found so far, in ascending `start` order.
    pub fn regions(&self) -> &[MaskedRegion] {
        &self.regions
    }

    /// Feed the character at byte offset `index` to the state machine.
    pub fn step(&mut self, ch: char, index: usize) -> Result<(), LexError> {
        loop {
            match self.transition(ch, index)? {
                Transition::Next(state) => {
                    self.state = state;
                    break;
                }
                Transition::Reprocess(state) => self.state = state,
            }
        }
        self.prev_char = Some(ch);
        Ok(())
    }

    /// Close any construct left open at end of input and return the regions.
    ///
    /// An unterminated string, comment, regex or template extends to the end
    /// of the source.
    pub fn finish(mut self) -> Vec<MaskedRegion> {
        let end = self.source.len();
        let state = match self.state {
            ScanState::Escaped => self.escaped_from,
            state => state,
        };
        let kind = match state {
            ScanState::StringLiteral(_) => Some((MaskKind::StringLiteral, 1)),
            ScanState::Regex | ScanState::RegexCharacterClass => Some((MaskKind::Regex, 1)),
            ScanState::TemplateLiteral | ScanState::TemplateDollar => {
                Some((MaskKind::TemplateEnd, 1))
            }
            ScanState::LineComment => Some((MaskKind::LineComment, 2)),
            ScanState::BlockComment | ScanState::BlockCommentEnding => {
                Some((MaskKind::BlockComment, 2))
            }
            ScanState::Base | ScanState::Slash | ScanState::Escaped => None,
        };
        if let Some((kind, opener)) = kind {
            self.push_region(kind, end, self.start + opener, end);
        }
        self.regions
    }

    fn transition(&mut self, ch: char, index: usize) -> Result<Transition, LexError> {
        use ScanState::*;
        use Transition::{Next, Reprocess};

        let next = match self.state {
            Base => return self.base(ch, index),

            Slash => match ch {
                '/' => Next(LineComment),
                '*' => Next(BlockComment),
                '[' if self.regex_enabled => Next(RegexCharacterClass),
                _ if self.regex_enabled && !self.prefix_increment_or_decrement => Reprocess(Regex),
                _ => Reprocess(Base),
            },

            Regex => match ch {
                '[' => Next(RegexCharacterClass),
                '\\' => self.escape(Regex),
                '/' => {
                    self.push_region(MaskKind::Regex, index + 1, self.start + 1, index);
                    Next(Base)
                }
                _ => Next(Regex),
            },

            RegexCharacterClass => match ch {
                ']' => Next(Regex),
                '\\' => self.escape(RegexCharacterClass),
                _ => Next(RegexCharacterClass),
            },

            StringLiteral(quote) => match ch {
                '\\' => self.escape(StringLiteral(quote)),
                _ if ch == quote => {
                    self.push_region(MaskKind::StringLiteral, index + 1, self.start + 1, index);
                    Next(Base)
                }
                _ => Next(StringLiteral(quote)),
            },

            Escaped => Next(self.escaped_from),

            TemplateLiteral => match ch {
                '$' => Next(TemplateDollar),
                '\\' => self.escape(TemplateLiteral),
                '`' => {
                    self.push_region(MaskKind::TemplateEnd, index + 1, self.start + 1, index);
                    Next(Base)
                }
                _ => Next(TemplateLiteral),
            },

            TemplateDollar => match ch {
                '{' => {
                    // Inner text stops before the `$`.
                    self.push_region(
                        MaskKind::TemplateChunk,
                        index + 1,
                        self.start + 1,
                        index.saturating_sub(1),
                    );
                    self.stack.push(TemplateLiteral);
                    Next(Base)
                }
                _ => Reprocess(TemplateLiteral),
            },

            LineComment => match ch {
                '\n' => {
                    self.push_region(MaskKind::LineComment, index, self.start + 2, index);
                    Next(Base)
                }
                _ => Next(LineComment),
            },

            BlockComment => match ch {
                '*' => Next(BlockCommentEnding),
                _ => Next(BlockComment),
            },

            BlockCommentEnding => match ch {
                '/' => {
                    self.push_region(
                        MaskKind::BlockComment,
                        index + 1,
                        self.start + 2,
                        index.saturating_sub(1),
                    );
                    Next(Base)
                }
                _ => Reprocess(BlockComment),
            },
        };

        Ok(next)
    }

    fn base(&mut self, ch: char, index: usize) -> Result<Transition, LexError> {
        use ScanState::*;
        use Transition::Next;

        match ch {
            '/' => {
                self.regex_enabled = slash_starts_regex(&self.source[..index], &self.regions);
                self.start = index;
                Ok(Next(Slash))
            }
            '"' | '\'' => {
                self.start = index;
                Ok(Next(StringLiteral(ch)))
            }
            '`' => {
                self.start = index;
                Ok(Next(TemplateLiteral))
            }
            '{' => {
                self.stack.push(Base);
                Ok(Next(Base))
            }
            '}' => {
                self.start = index;
                match self.stack.pop() {
                    Some(state) => Ok(Next(state)),
                    None => Err(LexError::unexpected_character(self.source, index, ch)),
                }
            }
            _ => {
                if !(self.prefix_increment_or_decrement && !is_word_char(ch)) {
                    self.prefix_increment_or_decrement = matches!(
                        (self.prev_char, ch),
                        (Some('+'), '+') | (Some('-'), '-')
                    );
                }
                Ok(Next(Base))
            }
        }
    }

    fn escape(&mut self, from: ScanState) -> Transition {
        self.escaped_from = from;
        Transition::Next(ScanState::Escaped)
    }

    fn push_region(&mut self, kind: MaskKind, end: usize, inner_start: usize, inner_end: usize) {
        let region = MaskedRegion::new(kind, self.start, end, inner_start, inner_end);
        tracing::trace!(
            kind = kind.name(),
            start = region.start,
            end = region.end,
            "masked region"
        );
        self.regions.push(region);
    }
}

/// Scan `source` and return its masked regions in ascending `start` order.
pub fn scan(source: &str) -> Result<Vec<MaskedRegion>, LexError> {
    let mut scanner = MaskScanner::new(source);
    for (index, ch) in source.char_indices() {
        scanner.step(ch, index)?;
    }
    Ok(scanner.finish())
}

/// Decide whether a `/` following `prefix` starts a regex literal.
///
/// `regions` are the masked regions already found in `prefix`; they are used
/// to ignore parentheses inside strings and comments when looking for the
/// `(` that matches a closing `)`.
///
/// - After a keyword such as `return` or `typeof`: regex.
/// - After a punctuator, an opening bracket, or at the start: regex.
/// - After `)`: regex only if the parenthesized group is the condition of
///   an `if` or `while`; otherwise division.
/// - After `}`, `++`, `--` or anything else: division.
pub fn slash_starts_regex(prefix: &str, regions: &[MaskedRegion]) -> bool {
    let trimmed = trim_trailing_trivia(prefix, regions);

    if REGEX_KEYWORDS
        .iter()
        .any(|keyword| ends_with_word(trimmed, keyword))
    {
        return true;
    }

    match trimmed.as_bytes().last() {
        None => true,
        Some(last) if REGEX_PUNCTUATOR_ENDINGS.contains(last) => true,
        Some(b')') => !token_closes_expression(trimmed, regions),
        Some(_) => false,
    }
}

/// Strip trailing whitespace and any comments that end the prefix.
fn trim_trailing_trivia<'s>(prefix: &'s str, regions: &[MaskedRegion]) -> &'s str {
    let mut trimmed = prefix.trim_end();
    let mut remaining = regions;
    while let Some((last, rest)) = remaining.split_last() {
        if !(last.kind.is_comment() && last.end == trimmed.len()) {
            break;
        }
        trimmed = prefix[..last.start].trim_end();
        remaining = rest;
    }
    trimmed
}

/// Whether the `)` ending `trimmed` closes an expression (so a following `/`
/// divides) rather than an `if (...)` / `while (...)` condition.
fn token_closes_expression(trimmed: &str, regions: &[MaskedRegion]) -> bool {
    let bytes = trimmed.as_bytes();
    let mut depth = 0i64;
    let mut index = bytes.len();
    let mut cursor = regions.partition_point(|r| r.start < bytes.len());

    let open = loop {
        if index == 0 {
            // Unbalanced; nothing to compare against.
            return true;
        }
        index -= 1;

        // Walk the regions backwards alongside `index`.
        while cursor > 0 && regions[cursor - 1].start > index {
            cursor -= 1;
        }
        if cursor > 0 && regions[cursor - 1].masks(index) {
            continue;
        }

        match bytes[index] {
            b')' => depth += 1,
            b'(' => {
                depth -= 1;
                if depth == 0 {
                    break index;
                }
            }
            _ => {}
        }
    };

    let before = trimmed[..open].trim_end();
    !(ends_with_word(before, "if") || ends_with_word(before, "while"))
}

/// `text` ends with `word`, and `word` is neither the tail of a longer
/// identifier nor a property name (`obj.in`).
fn ends_with_word(text: &str, word: &str) -> bool {
    let Some(head) = text.strip_suffix(word) else {
        return false;
    };
    if head.chars().next_back().is_some_and(is_identifier_char) {
        return false;
    }
    let head = head.trim_end();
    !head.ends_with('.') || head.ends_with("...")
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
