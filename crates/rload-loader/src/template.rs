//! Template collaborator
//!
//! The loader does not parse markup itself. A `TemplateParser` turns raw
//! component text into a tree of `TemplateNode`s carrying element tags,
//! attributes and source positions, plus the format version of the tree.
//!
//! `FlatTemplateParser` is a minimal parser for hosts without a templating
//! engine. It recognises `<link>`, `<script>` and `<style>` elements and keeps
//! everything else as text.

use indexmap::IndexMap;
use rload_common::{LineMap, SourcePosition};
use serde::Serialize;
use thiserror::Error;

/// Template format version the loader understands.
pub const TEMPLATE_VERSION: u32 = 4;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateNode {
    Text(String),
    Element(Element),
}

impl TemplateNode {
    /// Whitespace-only text.
    pub fn is_blank(&self) -> bool {
        matches!(self, TemplateNode::Text(text) if text.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Lowercased tag name
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<TemplateNode>,
    /// Position of the `<` that opens the element
    pub position: Option<SourcePosition>,
}

impl Element {
    pub fn new(tag: impl Into<String>, position: Option<SourcePosition>) -> Self {
        Element {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            position,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(&self.children, &mut text);
        text
    }
}

fn collect_text(nodes: &[TemplateNode], out: &mut String) {
    for node in nodes {
        match node {
            TemplateNode::Text(text) => out.push_str(text),
            TemplateNode::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// A parsed template: the version tag and the top-level nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTemplate {
    pub version: u32,
    pub nodes: Vec<TemplateNode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} (offset {offset})")]
pub struct TemplateError {
    pub message: String,
    pub offset: usize,
}

impl TemplateError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        TemplateError {
            message: message.into(),
            offset,
        }
    }
}

/// Turns raw component text into a template tree.
pub trait TemplateParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<ParsedTemplate, TemplateError>;
}

const RECOGNIZED_TAGS: &[&str] = &["link", "script", "style"];

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Parser that only understands the elements a component file is split on.
///
/// Every recognised element is reported at the top level, whatever markup
/// surrounds it. HTML comments are kept as text, so elements inside them are
/// ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatTemplateParser;

impl TemplateParser for FlatTemplateParser {
    fn parse(&self, source: &str) -> Result<ParsedTemplate, TemplateError> {
        let line_map = LineMap::build(source);
        let mut nodes = Vec::new();
        let mut text_start = 0;
        let mut pos = 0;

        while let Some(found) = source[pos..].find('<') {
            let open = pos + found;
            let rest = &source[open..];

            if rest.starts_with("<!--") {
                pos = rest.find("-->").map_or(source.len(), |end| open + end + 3);
                continue;
            }

            let Some(tag) = recognized_tag(&rest[1..]) else {
                pos = open + 1;
                continue;
            };

            let opening = parse_opening_tag(source, open + 1 + tag.len())?;
            push_text(&mut nodes, &source[text_start..open]);

            let mut element = Element::new(tag, Some(line_map.position(open, source)));
            element.attributes = opening.attributes;
            let mut end = opening.end;

            if RAW_TEXT_TAGS.contains(&tag) && !opening.self_closing {
                let close = find_ascii_case_insensitive(source, opening.end, &format!("</{tag}"))
                    .ok_or_else(|| TemplateError::new(format!("Unclosed <{tag}> element"), open))?;
                let content = &source[opening.end..close];
                if !content.is_empty() {
                    element.children.push(TemplateNode::Text(content.to_string()));
                }
                end = source[close..]
                    .find('>')
                    .map_or(source.len(), |idx| close + idx + 1);
            }

            nodes.push(TemplateNode::Element(element));
            text_start = end;
            pos = end;
        }

        push_text(&mut nodes, &source[text_start..]);

        Ok(ParsedTemplate {
            version: TEMPLATE_VERSION,
            nodes,
        })
    }
}

struct OpeningTag {
    attributes: IndexMap<String, String>,
    /// Offset just past the closing `>`
    end: usize,
    self_closing: bool,
}

fn recognized_tag(after_lt: &str) -> Option<&'static str> {
    let name_len = after_lt
        .bytes()
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    let name = &after_lt[..name_len];
    let terminated = after_lt[name_len..]
        .bytes()
        .next()
        .is_none_or(|b| b.is_ascii_whitespace() || b == b'>' || b == b'/');
    if !terminated {
        return None;
    }
    RECOGNIZED_TAGS
        .iter()
        .copied()
        .find(|tag| tag.eq_ignore_ascii_case(name))
}

fn parse_opening_tag(source: &str, start: usize) -> Result<OpeningTag, TemplateError> {
    let bytes = source.as_bytes();
    let mut attributes = IndexMap::new();
    let mut i = start;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            None => return Err(TemplateError::new("Unclosed tag", start)),
            Some(b'>') => {
                return Ok(OpeningTag {
                    attributes,
                    end: i + 1,
                    self_closing: false,
                });
            }
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                return Ok(OpeningTag {
                    attributes,
                    end: i + 2,
                    self_closing: true,
                });
            }
            _ => {}
        }

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !b"=>/".contains(&bytes[i]) {
            i += 1;
        }
        if i == name_start {
            // Stray `=` or `/`
            i += 1;
            continue;
        }
        let name = source[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = "";
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let value_start = i + 1;
                    let value_end = source[value_start..]
                        .find(quote as char)
                        .map(|idx| value_start + idx)
                        .ok_or_else(|| TemplateError::new("Unterminated attribute value", i))?;
                    value = &source[value_start..value_end];
                    i = value_end + 1;
                }
                _ => {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = &source[value_start..i];
                }
            }
        }

        attributes.insert(name, value.to_string());
    }
}

fn find_ascii_case_insensitive(source: &str, from: usize, needle: &str) -> Option<usize> {
    source[from..]
        .to_ascii_lowercase()
        .find(needle)
        .map(|idx| from + idx)
}

fn push_text(nodes: &mut Vec<TemplateNode>, text: &str) {
    if !text.is_empty() {
        nodes.push(TemplateNode::Text(text.to_string()));
    }
}
