//! rload: single-file component loading.
//!
//! The root package re-exports the workspace crates and carries the native
//! CLI:
//! - `rload_common` - Line maps, the VLQ codec and source map generation
//! - `rload_scanner` - Masked-region scanning and token-aware matching
//! - `rload_loader` - Component parsing and the async dependency loader

pub use rload_common as common;
pub use rload_loader as loader;
pub use rload_scanner as scanner;

pub use rload_common::{LineMap, SourceMap, SourceMapOptions, SourcePosition, generate_source_map};
pub use rload_loader::{
    Component, ComponentDefinition, FsFetch, LoadError, Loader, LoaderBuilder, LoaderSettings,
};
pub use rload_scanner::{LexError, MaskKind, MaskedRegion, erase_masked, match_outside_masked, scan};

// Tracing configuration (text / tree / JSON output for debugging)
pub mod tracing_config;

// Native CLI
#[cfg(feature = "cli")]
pub mod cli;
