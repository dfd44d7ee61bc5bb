//! Source Map Generation
//!
//! Builds version 3 source maps that point the evaluated script of a
//! component back at the component file it was extracted from.
//!
//! Two granularities are supported:
//! - **hires** (default): one mapping segment per generated character, so
//!   every column of the script maps to its exact original line/column.
//! - **coarse**: one segment per line, preserving only line granularity.
//!
//! Generated code usually carries some wrapper lines before the script
//! (module boilerplate, a function header). Those are accounted for with
//! `SourceMapOptions::offset`, which prepends empty mapping groups.

use crate::position::{SourcePosition, utf16_len};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Prefix of a base64 JSON data URI, as understood by debuggers.
pub const DATA_URI_PREFIX: &str = "data:application/json;charset=utf-8;base64,";

/// Base64 VLQ codec used by the `mappings` field.
pub mod vlq {
    const BASE64_CHARS: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    const VLQ_BASE_SHIFT: u32 = 5;
    const VLQ_BASE_MASK: u64 = (1 << VLQ_BASE_SHIFT) - 1;
    const VLQ_CONTINUATION_BIT: u64 = 1 << VLQ_BASE_SHIFT;

    /// Encode a signed integer as a base64 VLQ string.
    pub fn encode(value: i64) -> String {
        let mut out = String::with_capacity(4);
        encode_into(value, &mut out);
        out
    }

    /// Encode a sequence of integers, concatenated without separators.
    ///
    /// This is how a single segment such as
    /// `[generated_column, source_index, original_line, original_column]`
    /// is written.
    pub fn encode_all(values: &[i64]) -> String {
        let mut out = String::with_capacity(values.len() * 2);
        for &value in values {
            encode_into(value, &mut out);
        }
        out
    }

    /// Append the VLQ encoding of `value` to `out`.
    pub fn encode_into(value: i64, out: &mut String) {
        // Sign goes in the least significant bit.
        let mut vlq = if value < 0 {
            (value.unsigned_abs() << 1) | 1
        } else {
            (value as u64) << 1
        };

        loop {
            let mut digit = vlq & VLQ_BASE_MASK;
            vlq >>= VLQ_BASE_SHIFT;
            if vlq > 0 {
                digit |= VLQ_CONTINUATION_BIT;
            }
            out.push(BASE64_CHARS[digit as usize] as char);
            if vlq == 0 {
                break;
            }
        }
    }

    /// Decode one VLQ value from the start of `input`.
    ///
    /// Returns the value and the number of bytes consumed, or `None` when
    /// the input is empty, truncated, or contains a non-alphabet character.
    pub fn decode(input: &str) -> Option<(i64, usize)> {
        let mut result: u64 = 0;
        let mut shift = 0u32;

        for (consumed, byte) in input.bytes().enumerate() {
            let digit = u64::from(base64_value(byte)?);
            if shift >= 64 {
                return None;
            }
            result |= (digit & VLQ_BASE_MASK) << shift;

            if digit & VLQ_CONTINUATION_BIT == 0 {
                let magnitude = (result >> 1) as i64;
                let value = if result & 1 == 1 {
                    -magnitude
                } else {
                    magnitude
                };
                return Some((value, consumed + 1));
            }
            shift += VLQ_BASE_SHIFT;
        }

        None
    }

    fn base64_value(byte: u8) -> Option<u8> {
        match byte {
            b'A'..=b'Z' => Some(byte - b'A'),
            b'a'..=b'z' => Some(byte - b'a' + 26),
            b'0'..=b'9' => Some(byte - b'0' + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }
}

/// A version 3 source map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    pub file: Option<String>,
    pub sources: Vec<Option<String>>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Serialize to compact JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Serialize to a `data:` URI carrying the base64-encoded JSON.
    pub fn to_url(&self) -> String {
        format!("{DATA_URI_PREFIX}{}", STANDARD.encode(self.to_json()))
    }

    /// A copy of this map with `lines` extra generated lines before the
    /// mapped code.
    pub fn with_leading_lines(&self, lines: usize) -> SourceMap {
        let mut shifted = self.clone();
        shifted.mappings.insert_str(0, &";".repeat(lines));
        shifted
    }

    /// Look up the original position of a generated line/column.
    ///
    /// Returns the zero-based `(line, column)` of the closest segment at or
    /// before `generated_column` on `generated_line`.
    pub fn original_position_for(
        &self,
        generated_line: u32,
        generated_column: u32,
    ) -> Option<(u32, u32)> {
        decode_mappings(&self.mappings)?
            .into_iter()
            .rev()
            .find(|m| m.generated_line == generated_line && m.generated_column <= generated_column)
            .and_then(|m| Some((m.original_line?, m.original_column?)))
    }
}

impl fmt::Display for SourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// A decoded mapping segment with absolute positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_index: Option<u32>,
    pub original_line: Option<u32>,
    pub original_column: Option<u32>,
    pub name_index: Option<u32>,
}

/// Decode a `mappings` string into absolute positions.
///
/// Returns `None` on malformed input (bad VLQ data, a segment with two or
/// three fields, or positions that become negative).
pub fn decode_mappings(mappings: &str) -> Option<Vec<Mapping>> {
    let mut decoded = Vec::new();
    let mut source_index = 0i64;
    let mut original_line = 0i64;
    let mut original_column = 0i64;
    let mut name_index = 0i64;

    for (line, group) in mappings.split(';').enumerate() {
        let mut generated_column = 0i64;

        for segment in group.split(',').filter(|s| !s.is_empty()) {
            let mut fields = [0i64; 5];
            let mut count = 0;
            let mut rest = segment;
            while !rest.is_empty() {
                if count == fields.len() {
                    return None;
                }
                let (value, consumed) = vlq::decode(rest)?;
                fields[count] = value;
                count += 1;
                rest = &rest[consumed..];
            }

            generated_column += fields[0];
            let mut mapping = Mapping {
                generated_line: line as u32,
                generated_column: u32::try_from(generated_column).ok()?,
                source_index: None,
                original_line: None,
                original_column: None,
                name_index: None,
            };

            match count {
                1 => {}
                4 | 5 => {
                    source_index += fields[1];
                    original_line += fields[2];
                    original_column += fields[3];
                    mapping.source_index = Some(u32::try_from(source_index).ok()?);
                    mapping.original_line = Some(u32::try_from(original_line).ok()?);
                    mapping.original_column = Some(u32::try_from(original_column).ok()?);
                    if count == 5 {
                        name_index += fields[4];
                        mapping.name_index = Some(u32::try_from(name_index).ok()?);
                    }
                }
                _ => return None,
            }

            decoded.push(mapping);
        }
    }

    Some(decoded)
}

/// The parts of a parsed component definition a source map is built from.
pub trait ScriptDefinition {
    /// Full text of the original component file.
    fn original_source(&self) -> &str;
    /// The embedded script text.
    fn script(&self) -> &str;
    /// Position of the first script character in the original file, or
    /// `None` when the component has no script.
    fn script_start(&self) -> Option<SourcePosition>;
}

/// Options for `generate_source_map`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceMapOptions {
    /// Name of the original source file
    pub source: Option<String>,
    /// Name of the generated file
    pub file: Option<String>,
    /// Number of generated lines that precede the script
    pub offset: Option<usize>,
    /// Deprecated alias for `offset`; honored with a one-time warning
    pub padding: Option<usize>,
    /// One segment per character when true, one per line otherwise
    pub hires: bool,
}

impl Default for SourceMapOptions {
    fn default() -> Self {
        SourceMapOptions {
            source: None,
            file: None,
            offset: None,
            padding: None,
            hires: true,
        }
    }
}

static PADDING_WARNED: AtomicBool = AtomicBool::new(false);

impl SourceMapOptions {
    /// The effective line offset, resolving the deprecated `padding` alias.
    pub fn line_offset(&self) -> usize {
        if let Some(padding) = self.padding {
            if !PADDING_WARNED.swap(true, Ordering::Relaxed) {
                tracing::warn!("options.padding is deprecated, use options.offset instead");
            }
            return padding;
        }
        self.offset.unwrap_or(0)
    }
}

/// Generate a source map between an original component file and its script.
pub fn generate_source_map(
    definition: &impl ScriptDefinition,
    options: &SourceMapOptions,
) -> SourceMap {
    let mut mappings = String::new();
    let offset = options.line_offset();

    if let Some(start) = definition.script_start() {
        mappings.push_str(&";".repeat(offset));
        if options.hires {
            encode_hires(definition.script(), start, &mut mappings);
        } else {
            encode_coarse(definition.script(), start, &mut mappings);
        }
    }

    SourceMap {
        version: 3,
        file: options.file.clone(),
        sources: vec![options.source.clone()],
        sources_content: vec![definition.original_source().to_string()],
        names: Vec::new(),
        mappings,
    }
}

/// One segment per character. The decoder keeps the original column across
/// lines, so each line's first segment carries the delta from wherever the
/// previous line left it back to that line's first column.
fn encode_hires(script: &str, start: SourcePosition, out: &mut String) {
    let mut original_column = 0i64;

    for (index, line) in script.split('\n').enumerate() {
        if index > 0 {
            out.push(';');
        }

        let (line_delta, line_column) = if index == 0 {
            (i64::from(start.line), i64::from(start.column))
        } else {
            (1, 0)
        };
        vlq::encode_into(0, out);
        vlq::encode_into(0, out);
        vlq::encode_into(line_delta, out);
        vlq::encode_into(line_column - original_column, out);
        original_column = line_column;

        // [1, 0, 0, 1]: next generated column, next original column
        for _ in 1..utf16_len(line) {
            out.push_str(",CAAC");
            original_column += 1;
        }
    }
}

/// One segment per line.
fn encode_coarse(script: &str, start: SourcePosition, out: &mut String) {
    for (index, _) in script.split('\n').enumerate() {
        match index {
            // First mapping points at the code right after the opening tag.
            0 => out.push_str(&vlq::encode_all(&[
                0,
                0,
                i64::from(start.line),
                i64::from(start.column),
            ])),
            // Undo the horizontal offset of the first line.
            1 => {
                out.push(';');
                out.push_str(&vlq::encode_all(&[0, 0, 1, -i64::from(start.column)]));
            }
            // [0, 0, 1, 0]
            _ => out.push_str(";AACA"),
        }
    }
}
