//! Tests for source_map.rs

use crate::position::{LineMap, SourcePosition};
use crate::source_map::*;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

struct TestDefinition {
    source: String,
    script: String,
    script_start: Option<SourcePosition>,
}

impl TestDefinition {
    /// Treat everything between `<script>` and `</script>` as the script.
    fn from_component(source: &str) -> Self {
        let Some(open) = source.find("<script>") else {
            return TestDefinition {
                source: source.to_string(),
                script: String::new(),
                script_start: None,
            };
        };
        let start = open + "<script>".len();
        let end = start + source[start..].find("</script").expect("closing tag");
        let line_map = LineMap::build(source);
        TestDefinition {
            source: source.to_string(),
            script: source[start..end].to_string(),
            script_start: Some(line_map.position(start, source)),
        }
    }
}

impl ScriptDefinition for TestDefinition {
    fn original_source(&self) -> &str {
        &self.source
    }

    fn script(&self) -> &str {
        &self.script
    }

    fn script_start(&self) -> Option<SourcePosition> {
        self.script_start
    }
}

const COMPONENT: &str = "<p>hi</p>\n<script>var a = 1;\nfoo();\n</script>";

fn char_at(text: &str, line: u32, column: u32) -> Option<char> {
    text.split('\n')
        .nth(line as usize)
        .and_then(|l| l.chars().nth(column as usize))
}

#[test]
fn test_vlq_encode_positive() {
    assert_eq!(vlq::encode(0), "A");
    assert_eq!(vlq::encode(1), "C");
    assert_eq!(vlq::encode(15), "e");
    assert_eq!(vlq::encode(16), "gB");
}

#[test]
fn test_vlq_encode_negative() {
    assert_eq!(vlq::encode(-1), "D");
    assert_eq!(vlq::encode(-15), "f");
    assert_eq!(vlq::encode(-17), "jB");
}

#[test]
fn test_vlq_encode_segment() {
    let segment = vlq::encode_all(&[0, 0, 1, 0]);
    assert_eq!(segment, "AACA");

    let mut rest = segment.as_str();
    let mut values = Vec::new();
    while !rest.is_empty() {
        let (value, consumed) = vlq::decode(rest).expect("valid vlq");
        values.push(value);
        rest = &rest[consumed..];
    }
    assert_eq!(values, vec![0, 0, 1, 0]);
}

#[test]
fn test_vlq_decode() {
    for value in [-100_000, -100, -1, 0, 1, 100, 1000, i64::from(i32::MAX)] {
        let encoded = vlq::encode(value);
        let (decoded, consumed) = vlq::decode(&encoded).unwrap();
        assert_eq!(decoded, value, "Failed for value {}", value);
        assert_eq!(consumed, encoded.len());
    }
}

#[test]
fn test_vlq_decode_rejects_garbage() {
    assert_eq!(vlq::decode(""), None);
    assert_eq!(vlq::decode("*"), None);
    // Continuation bit set on the last digit
    assert_eq!(vlq::decode("g"), None);
}

#[test]
fn test_hires_first_line_points_at_script_start() {
    let definition = TestDefinition::from_component(COMPONENT);
    let map = generate_source_map(&definition, &SourceMapOptions::default());

    let first_line = map.mappings.split(';').next().unwrap();
    assert!(first_line.starts_with("AACQ"), "mappings: {}", map.mappings);
    assert_eq!(first_line.matches(",CAAC").count(), "var a = 1;".len() - 1);

    let second_line = map.mappings.split(';').nth(1).unwrap();
    assert!(second_line.starts_with("AACjB"), "mappings: {}", map.mappings);
}

#[test]
fn test_hires_maps_every_character_back() {
    let definition = TestDefinition::from_component(COMPONENT);
    let map = generate_source_map(&definition, &SourceMapOptions::default());
    let decoded = decode_mappings(&map.mappings).expect("decodable mappings");

    let script_chars = definition.script.chars().filter(|c| *c != '\n').count();
    // Every non-empty line maps each character; the trailing empty line maps
    // its (virtual) first column.
    assert_eq!(decoded.len(), script_chars + 1);

    for mapping in &decoded {
        let generated = char_at(
            &definition.script,
            mapping.generated_line,
            mapping.generated_column,
        );
        let original = char_at(
            COMPONENT,
            mapping.original_line.unwrap(),
            mapping.original_column.unwrap(),
        );
        if generated.is_some() {
            assert_eq!(generated, original, "mapping {:?}", mapping);
        }
    }
}

#[test]
fn test_coarse_mappings() {
    let definition = TestDefinition::from_component(COMPONENT);
    let options = SourceMapOptions {
        hires: false,
        ..Default::default()
    };
    let map = generate_source_map(&definition, &options);
    assert_eq!(map.mappings, "AACQ;AACR;AACA");

    let decoded = decode_mappings(&map.mappings).unwrap();
    assert_eq!(decoded[1].original_line, Some(2));
    assert_eq!(decoded[1].original_column, Some(0));
    assert_eq!(decoded[2].original_line, Some(3));
    assert_eq!(decoded[2].original_column, Some(0));
}

#[test]
fn test_offset_prepends_empty_groups() {
    let definition = TestDefinition::from_component(COMPONENT);
    let options = SourceMapOptions {
        offset: Some(3),
        hires: false,
        ..Default::default()
    };
    let map = generate_source_map(&definition, &options);
    assert_eq!(map.mappings, ";;;AACQ;AACR;AACA");
}

#[test]
fn test_padding_is_an_alias_for_offset() {
    let definition = TestDefinition::from_component(COMPONENT);
    let options = SourceMapOptions {
        padding: Some(2),
        hires: false,
        ..Default::default()
    };
    assert_eq!(options.line_offset(), 2);
    let map = generate_source_map(&definition, &options);
    assert!(map.mappings.starts_with(";;AACQ"));
}

#[test]
fn test_no_script_only_populates_metadata() {
    let definition = TestDefinition::from_component("<p>static</p>");
    let options = SourceMapOptions {
        source: Some("static.html".to_string()),
        offset: Some(4),
        ..Default::default()
    };
    let map = generate_source_map(&definition, &options);
    assert_eq!(map.mappings, "");
    assert_eq!(map.sources, vec![Some("static.html".to_string())]);
    assert_eq!(map.sources_content, vec!["<p>static</p>".to_string()]);
}

#[test]
fn test_source_map_json_shape() {
    let definition = TestDefinition::from_component(COMPONENT);
    let options = SourceMapOptions {
        source: Some("widget.html".to_string()),
        file: Some("widget.js".to_string()),
        ..Default::default()
    };
    let map = generate_source_map(&definition, &options);
    let json: Value = serde_json::from_str(&map.to_json()).expect("parse source map");

    assert_eq!(json["version"], 3);
    assert_eq!(json["file"], "widget.js");
    assert_eq!(json["sources"][0], "widget.html");
    assert_eq!(json["sourcesContent"][0], COMPONENT);
    assert_eq!(json["names"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["mappings"], map.mappings.as_str());
    assert_eq!(map.to_string(), map.to_json());
}

#[test]
fn test_source_map_without_names_serializes_nulls() {
    let definition = TestDefinition::from_component(COMPONENT);
    let map = generate_source_map(&definition, &SourceMapOptions::default());
    let json: Value = serde_json::from_str(&map.to_json()).unwrap();
    assert!(json["file"].is_null());
    assert!(json["sources"][0].is_null());
}

#[test]
fn test_to_url_is_base64_json() {
    let definition = TestDefinition::from_component(COMPONENT);
    let map = generate_source_map(&definition, &SourceMapOptions::default());
    let url = map.to_url();

    let payload = url
        .strip_prefix("data:application/json;charset=utf-8;base64,")
        .expect("data uri prefix");
    let bytes = STANDARD.decode(payload).expect("standard base64");
    let parsed: SourceMap = serde_json::from_slice(&bytes).expect("json payload");
    assert_eq!(parsed, map);
}

#[test]
fn test_original_position_for_wrapped_script() {
    let definition = TestDefinition::from_component(COMPONENT);
    let map = generate_source_map(&definition, &SourceMapOptions::default()).with_leading_lines(1);

    // Generated line 2 is `foo();`; column 3 is the `(`.
    assert_eq!(map.original_position_for(2, 3), Some((2, 3)));
    // Generated line 1 column 4 is `a` in `var a = 1;`, original column 12.
    assert_eq!(map.original_position_for(1, 4), Some((1, 12)));
    // The wrapper line maps to nothing.
    assert_eq!(map.original_position_for(0, 0), None);
}

#[test]
fn test_decode_mappings_rejects_partial_segments() {
    assert!(decode_mappings("AA").is_none());
    assert!(decode_mappings("AAA").is_none());
    assert_eq!(decode_mappings(";;").map(|m| m.len()), Some(0));
}
