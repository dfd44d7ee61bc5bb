//! Component definitions
//!
//! A component file is markup with optional top-level `<link rel="ractive">`
//! imports, at most one `<script>` block and any number of `<style>` blocks.
//! `ComponentDefinition::parse` splits those out of the template and finds
//! the `require(...)` calls of the script.

use crate::error::LoadError;
use crate::path::get_name;
use crate::template::{Element, ParsedTemplate, TEMPLATE_VERSION, TemplateNode, TemplateParser};
use once_cell::sync::Lazy;
use regex::Regex;
use rload_common::{LineMap, ScriptDefinition, SourcePosition};
use rload_scanner::match_outside_masked;
use tracing::{debug, warn};

/// `require("name")` or `require('name')`; group 1 or 2 is the name.
pub static REQUIRE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"require\s*\(\s*(?:"([^"]+)"|'([^']+)')\s*\)"#).expect("valid require pattern")
});

/// A sub-component declared with `<link rel="ractive" href="...">`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub name: String,
    pub href: String,
}

#[derive(Clone, Debug)]
pub struct ComponentDefinition {
    /// The full original text
    pub source: String,
    /// Template with imports, script and styles removed
    pub template: ParsedTemplate,
    /// Text of all style blocks, joined with a space
    pub css: String,
    /// Script text exactly as it appears in `source`; empty if none
    pub script: String,
    /// Position of the first script character
    pub script_start: Option<SourcePosition>,
    /// Position of the `<` of `</script`
    pub script_end: Option<SourcePosition>,
    pub imports: Vec<Import>,
    /// `require` targets outside strings and comments, first-seen order
    pub modules: Vec<String>,
}

enum Extracted {
    Link(Element),
    Script(Element),
    Style(Element),
    Kept(TemplateNode),
}

fn classify(node: TemplateNode) -> Extracted {
    let TemplateNode::Element(element) = node else {
        return Extracted::Kept(node);
    };
    let type_attr = element.attr("type");
    match element.tag.as_str() {
        "link" if element.attr("rel") == Some("ractive") => Extracted::Link(element),
        "script" if matches!(type_attr, None | Some("text/javascript")) => {
            Extracted::Script(element)
        }
        "style" if matches!(type_attr, None | Some("text/css")) => Extracted::Style(element),
        _ => Extracted::Kept(TemplateNode::Element(element)),
    }
}

impl ComponentDefinition {
    pub fn parse(source: &str, parser: &dyn TemplateParser) -> Result<Self, LoadError> {
        let mut template = parser.parse(source).map_err(|err| LoadError::Parse {
            message: err.to_string(),
        })?;

        if template.version != TEMPLATE_VERSION {
            warn!(
                expected = TEMPLATE_VERSION,
                got = template.version,
                "Mismatched template version; the build process and runtime should use the same template format"
            );
        }

        let mut links = Vec::new();
        let mut styles = Vec::new();
        let mut script_element = None;
        let mut kept = Vec::with_capacity(template.nodes.len());

        for node in std::mem::take(&mut template.nodes) {
            match classify(node) {
                Extracted::Link(element) => links.push(element),
                Extracted::Script(element) => {
                    if script_element.is_some() {
                        return Err(LoadError::MultipleScriptBlocks);
                    }
                    script_element = Some(element);
                }
                Extracted::Style(element) => styles.push(element),
                Extracted::Kept(node) => kept.push(node),
            }
        }

        // Drop whitespace left behind by the removed elements.
        let leading = kept.iter().take_while(|node| node.is_blank()).count();
        kept.drain(..leading);
        while kept.last().is_some_and(TemplateNode::is_blank) {
            kept.pop();
        }
        template.nodes = kept;

        let imports = links
            .iter()
            .map(import_from_link)
            .collect::<Result<Vec<_>, _>>()?;

        let css = styles
            .iter()
            .map(Element::text_content)
            .collect::<Vec<_>>()
            .join(" ");

        let mut definition = ComponentDefinition {
            source: source.to_string(),
            template,
            css,
            script: String::new(),
            script_start: None,
            script_end: None,
            imports,
            modules: Vec::new(),
        };

        if let Some(element) = script_element {
            definition.extract_script(&element)?;
        }

        debug!(
            imports = definition.imports.len(),
            modules = definition.modules.len(),
            has_script = definition.has_script(),
            "parsed component definition"
        );

        Ok(definition)
    }

    pub fn has_script(&self) -> bool {
        !self.script.is_empty()
    }

    fn extract_script(&mut self, element: &Element) -> Result<(), LoadError> {
        let source = self.source.as_str();

        let (start, end) = match element.position {
            Some(position) => {
                let start = source
                    .get(position.offset..)
                    .and_then(|rest| rest.find('>'))
                    .map_or(source.len(), |idx| position.offset + idx + 1);
                let end = source[start..]
                    .to_ascii_lowercase()
                    .find("</script")
                    .map_or(source.len(), |idx| start + idx);
                (start, end)
            }
            // Without a position the script can still run, just unmapped.
            None => {
                self.script = element.text_content();
                self.modules = find_requires(&self.script)?;
                return Ok(());
            }
        };

        if start >= end {
            return Ok(());
        }

        let line_map = LineMap::build(source);
        self.script = source[start..end].to_string();
        self.script_start = Some(line_map.position(start, source));
        self.script_end = Some(line_map.position(end, source));
        self.modules = find_requires(&self.script)?;
        Ok(())
    }
}

fn import_from_link(link: &Element) -> Result<Import, LoadError> {
    let parse_error = || LoadError::Parse {
        message: "Error parsing link tag".to_string(),
    };
    let href = link.attr("href").ok_or_else(parse_error)?;
    let name = link
        .attr("name")
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| get_name(href));
    if name.is_empty() {
        return Err(parse_error());
    }
    Ok(Import {
        name: name.to_string(),
        href: href.to_string(),
    })
}

/// Names passed to `require` in real code, deduplicated in first-seen order.
pub fn find_requires(script: &str) -> Result<Vec<String>, LoadError> {
    let mut modules: Vec<String> = Vec::new();
    match_outside_masked(script, &REQUIRE_PATTERN, true, |captures, _, _| {
        if let Some(name) = captures.get(1).or_else(|| captures.get(2)) {
            if !modules.iter().any(|m| m == name.as_str()) {
                modules.push(name.as_str().to_string());
            }
        }
    })?;
    Ok(modules)
}

impl ScriptDefinition for ComponentDefinition {
    fn original_source(&self) -> &str {
        &self.source
    }

    fn script(&self) -> &str {
        &self.script
    }

    fn script_start(&self) -> Option<SourcePosition> {
        if self.has_script() {
            self.script_start
        } else {
            None
        }
    }
}
