//! Script scanner and token-aware matcher for rload.
//!
//! This crate provides the lexical pieces of the loader:
//! - `MaskedRegion` / `MaskKind` - Spans of a script that are not code
//!   (strings, comments, regex literals, template chunks)
//! - `MaskScanner` - Single-pass state machine producing those regions
//! - `match_outside_masked` / `erase_masked` - Pattern matching that only
//!   sees real code

pub mod region;
pub use region::{MaskKind, MaskedRegion};

pub mod scanner;
pub use scanner::{MaskScanner, ScanState, scan, slash_starts_regex};

pub mod lex_error;
pub use lex_error::LexError;

pub mod matcher;
pub use matcher::{erase_masked, erase_regions, match_outside_masked, replace_outside_masked};

#[cfg(test)]
#[path = "tests/scanner_tests.rs"]
mod scanner_tests;
#[cfg(test)]
#[path = "tests/matcher_tests.rs"]
mod matcher_tests;
