//! Command execution for the `rload` binary.
//!
//! Every command returns its stdout text so it can be checked without
//! spawning the binary.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

use rload_common::{SourceMapOptions, generate_source_map};
use rload_loader::{
    Component, ComponentDefinition, FlatTemplateParser, FsFetch, LoadError, Loader, find_requires,
};
use rload_scanner::{erase_masked, scan};

use super::args::{CliArgs, Command};
use super::config::{ProjectConfig, find_config};

pub async fn run(args: &CliArgs, cwd: &Path) -> Result<String> {
    let config = find_config(cwd, args.config.as_deref())?;

    match &args.command {
        Command::Scan { file, json } => {
            let source = read_source(cwd, file)?;
            scan_source(&source, *json)
                .with_context(|| format!("failed to scan {}", file.display()))
        }
        Command::Erase { file } => {
            let source = read_source(cwd, file)?;
            erase_masked(&source).with_context(|| format!("failed to scan {}", file.display()))
        }
        Command::Requires { file } => {
            let source = read_source(cwd, file)?;
            let modules = find_requires(&source)
                .with_context(|| format!("failed to scan {}", file.display()))?;
            Ok(lines(&modules))
        }
        Command::Sourcemap {
            component,
            coarse,
            offset,
            url,
        } => {
            let source = read_source(cwd, component)?;
            let options = SourceMapOptions {
                source: Some(component.display().to_string()),
                offset: Some(offset.unwrap_or_else(|| config.offset())),
                hires: config.hires() && !coarse,
                ..SourceMapOptions::default()
            };
            source_map_for(&source, &options, *url)
                .with_context(|| format!("failed to map {}", component.display()))
        }
        Command::Deps {
            component,
            base_url,
            no_cache,
        } => {
            let mut config = config;
            if let Some(base_url) = base_url {
                config.base_url = Some(base_url.clone());
            }
            if *no_cache {
                config.cache = Some(false);
            }
            let loader = build_loader(&config, cwd);
            let root = loader
                .load(component)
                .await
                .with_context(|| format!("failed to load {component}"))?;
            Ok(render_tree(&root))
        }
    }
}

fn read_source(cwd: &Path, file: &Path) -> Result<String> {
    let path = cwd.join(file);
    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
}

fn lines(items: &[String]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(item);
        out.push('\n');
    }
    out
}

/// One line per masked region: `start..end kind text`, or a JSON array.
pub fn scan_source(source: &str, json: bool) -> Result<String> {
    let regions = scan(source)?;
    debug!(count = regions.len(), "scanned");

    if json {
        let mut out = serde_json::to_string_pretty(&regions)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    for region in &regions {
        writeln!(
            out,
            "{}..{} {} {:?}",
            region.start,
            region.end,
            region.kind.name(),
            region.outer_text(source)
        )?;
    }
    Ok(out)
}

/// The source map of a component's script, as JSON or a data URI.
pub fn source_map_for(
    source: &str,
    options: &SourceMapOptions,
    as_url: bool,
) -> Result<String, LoadError> {
    let definition = ComponentDefinition::parse(source, &FlatTemplateParser)?;
    let map = generate_source_map(&definition, options);
    let mut out = if as_url { map.to_url() } else { map.to_json() };
    out.push('\n');
    Ok(out)
}

pub fn build_loader(config: &ProjectConfig, cwd: &Path) -> Loader {
    let mut builder = Loader::builder()
        .fetch(FsFetch::with_root(cwd))
        .settings(config.loader_settings())
        .hires(config.hires());
    for (name, value) in &config.modules {
        builder = builder.module(name.clone(), value.clone());
    }
    for (name, value) in &config.globals {
        builder = builder.global(name.clone(), value.clone());
    }
    builder.build()
}

/// The import tree of a loaded component, one component per line.
pub fn render_tree(root: &Component) -> String {
    let mut out = String::new();
    out.push_str(&root.url);
    out.push('\n');
    render_children(root, "", &mut out);
    out
}

fn render_children(component: &Component, prefix: &str, out: &mut String) {
    let count = component.components.len();
    for (index, (name, child)) in component.components.iter().enumerate() {
        let last = index + 1 == count;
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(name);
        out.push_str(": ");
        out.push_str(&child.url);
        out.push('\n');
        render_children(child, &format!("{prefix}{indent}"), out);
    }
}
