//! Common types and utilities for rload.
//!
//! This crate provides the foundational pieces shared by the scanner and the
//! loader:
//! - Line/column positions (`LineMap`, `SourcePosition`)
//! - The base64 VLQ codec (`source_map::vlq`)
//! - Source map generation for component scripts (`SourceMap`,
//!   `generate_source_map`)

// Position types for line/column source locations
pub mod position;
pub use position::{LineMap, SourcePosition};

// Source Map generation
pub mod source_map;
pub use source_map::{
    Mapping, ScriptDefinition, SourceMap, SourceMapOptions, decode_mappings, generate_source_map,
};

#[cfg(test)]
#[path = "tests/position_tests.rs"]
mod position_tests;
#[cfg(test)]
#[path = "tests/source_map_tests.rs"]
mod source_map_tests;
