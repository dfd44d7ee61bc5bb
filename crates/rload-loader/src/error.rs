//! Loader errors

use rload_scanner::LexError;
use std::fmt;
use thiserror::Error;

/// A position in the original component file, used to report where a script
/// failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorLocation {
    /// One-based line
    pub line: u32,
    /// Zero-based column
    pub column: u32,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Why a component failed to load.
///
/// Errors are `Clone` so that every waiter on a shared in-flight load
/// receives the same failure.
#[derive(Clone, Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("error parsing component: {message}")]
    Parse { message: String },

    #[error("You can only have one <script> tag per component file")]
    MultipleScriptBlocks,

    #[error(
        "Component definition includes imports (e.g. <link rel=\"ractive\" href=\"{href}\">) but no import loader was supplied"
    )]
    MissingDependencyLoader { href: String },

    #[error(
        "Could not find dependency \"{name}\". It should be exposed as Loader.modules{qualified} or globals{qualified}"
    )]
    UnresolvedModule { name: String, qualified: String },

    #[error("error evaluating script in {url}{}: {message}", located(.location))]
    ScriptEvaluation {
        url: String,
        message: String,
        location: Option<ErrorLocation>,
    },

    #[error("circular import: {}", .chain.join(" -> "))]
    CircularImport { chain: Vec<String> },
}

impl LoadError {
    /// The error raised when `require(name)` finds nothing.
    pub fn unresolved_module(name: &str) -> Self {
        let qualified = if is_identifier(name) {
            format!(".{name}")
        } else {
            format!("[\"{name}\"]")
        };
        LoadError::UnresolvedModule {
            name: name.to_string(),
            qualified,
        }
    }
}

fn located(location: &Option<ErrorLocation>) -> String {
    location.map_or_else(String::new, |location| format!(" ({location})"))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_' || ch == '$')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}
