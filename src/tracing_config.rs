//! Log output for `rload` commands.
//!
//! What the member crates emit, by level:
//!
//! - `warn`: a template compiled for another format version, non-object
//!   `component.exports`, and source map options still using `padding`
//! - `debug`: each component fetch, the definition parsed from it, and
//!   the synthesized component, plus cycle refusals in the load cache
//! - `trace`: load cache hits, misses and evictions, where each `require`
//!   was resolved from, and every masked region the scanner records
//!
//! `RLOAD_LOG` takes an `EnvFilter` directive (`RUST_LOG` is read when it
//! is unset). Without either variable no subscriber is installed. Output
//! goes to stderr; `RLOAD_LOG_FORMAT` picks `text` (the default), `tree`
//! (indented by span through `tracing-tree`) or `json` (one object per
//! event).
//!
//! ```bash
//! # Which imports were fetched, and in what order
//! RLOAD_LOG=rload_loader=debug RLOAD_LOG_FORMAT=tree rload deps app/main.html
//!
//! # Why a `/` was read as a regex
//! RLOAD_LOG=rload_scanner=trace rload scan widget.js
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a `RLOAD_LOG_FORMAT` value. Unknown values fall back to text.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("RLOAD_LOG_FORMAT").unwrap_or_default())
    }
}

/// Build an `EnvFilter` from `RLOAD_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("RLOAD_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `RLOAD_LOG` nor `RUST_LOG` is set. All output
/// goes to stderr so it never mixes with command output on stdout.
pub fn init_tracing() {
    let has_rload_log = std::env::var("RLOAD_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_rload_log && !has_rust_log {
        return;
    }

    let filter = build_filter();

    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
