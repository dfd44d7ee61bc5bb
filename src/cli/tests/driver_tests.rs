use clap::Parser;
use rload_common::source_map::DATA_URI_PREFIX;
use rload_loader::{LoadError, Loader};
use rload_scanner::LexError;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

use super::args::CliArgs;
use super::config::ProjectConfig;
use super::driver::{build_loader, render_tree, run, scan_source, source_map_for};
use rload_common::SourceMapOptions;

fn write_file(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create test dir");
    }
    std::fs::write(path, contents).expect("failed to write test file");
}

async fn run_in(dir: &Path, argv: &[&str]) -> anyhow::Result<String> {
    let mut full = vec!["rload"];
    full.extend_from_slice(argv);
    let args = CliArgs::try_parse_from(full).expect("args should parse");
    run(&args, dir).await
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "app/main.html",
        "<link rel='ractive' href='./parts/header.html'>\n\
         <link rel='ractive' href='shared/footer.html' name='footer'>\n\
         <header/><footer/>\n",
    );
    write_file(
        dir.path(),
        "app/parts/header.html",
        "<link rel='ractive' href='../../shared/icon.html'>\n<h1><icon/></h1>\n",
    );
    write_file(dir.path(), "shared/footer.html", "<footer></footer>\n");
    write_file(dir.path(), "shared/icon.html", "<i></i>\n");
    write_file(
        dir.path(),
        "widget.js",
        "var _ = require('lodash'); // require('nope')\nvar re = /require\\('x'\\)/;\n",
    );
    write_file(
        dir.path(),
        "widget.html",
        "<p>{{n}}</p>\n<script>\nvar n = 1;\n</script>\n",
    );
    dir
}

#[test]
fn scan_lists_regions() {
    let output = scan_source("var s = \"a\"; // c", false).unwrap();
    assert_eq!(output, "8..11 string \"\\\"a\\\"\"\n13..17 line \"// c\"\n");
}

#[test]
fn scan_json_uses_camel_case() {
    let output = scan_source("'a'", true).unwrap();
    let regions: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(regions[0]["kind"], "stringLiteral");
    assert_eq!(regions[0]["innerStart"], 1);
    assert_eq!(regions[0]["innerEnd"], 2);
}

#[tokio::test]
async fn erase_blanks_masked_text() {
    let dir = project();
    let output = run_in(dir.path(), &["erase", "widget.js"]).await.unwrap();
    assert_eq!(output.len(), std::fs::read_to_string(dir.path().join("widget.js")).unwrap().len());
    assert!(output.starts_with("var _ = require('      ');"));
    assert!(!output.contains("nope"));
}

#[tokio::test]
async fn requires_ignores_comments_and_regexes() {
    let dir = project();
    let output = run_in(dir.path(), &["requires", "widget.js"]).await.unwrap();
    assert_eq!(output, "lodash\n");
}

#[tokio::test]
async fn scan_failure_keeps_lex_error() {
    let dir = project();
    write_file(dir.path(), "broken.js", "a }\n");
    let err = run_in(dir.path(), &["scan", "broken.js"]).await.unwrap_err();
    assert_eq!(err.to_string(), "failed to scan broken.js");
    let lex = err.downcast_ref::<LexError>().expect("lex error");
    assert_eq!((lex.line, lex.column), (1, 2));
}

#[tokio::test]
async fn missing_file_is_reported() {
    let dir = project();
    let err = run_in(dir.path(), &["erase", "nope.js"]).await.unwrap_err();
    assert!(err.to_string().starts_with("failed to read"), "{err}");
}

#[tokio::test]
async fn sourcemap_prints_json() {
    let dir = project();
    let output = run_in(dir.path(), &["sourcemap", "widget.html", "--offset", "2"])
        .await
        .unwrap();
    let map: Value = serde_json::from_str(output.trim_end()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["sources"][0], "widget.html");
    assert!(map["mappings"].as_str().unwrap().starts_with(";;"));
}

#[tokio::test]
async fn sourcemap_prints_data_uri() {
    let dir = project();
    let output = run_in(dir.path(), &["sourcemap", "widget.html", "--url", "--coarse"])
        .await
        .unwrap();
    assert!(output.starts_with(DATA_URI_PREFIX));
}

#[test]
fn source_map_for_component_without_script_has_no_mappings() {
    let output = source_map_for("<p></p>", &SourceMapOptions::default(), false).unwrap();
    let map: Value = serde_json::from_str(output.trim_end()).unwrap();
    assert_eq!(map["mappings"], "");
}

#[test]
fn source_map_for_rejects_two_scripts() {
    let err = source_map_for(
        "<script>a()</script><script>b()</script>",
        &SourceMapOptions::default(),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::MultipleScriptBlocks));
}

#[tokio::test]
async fn deps_prints_import_tree() {
    let dir = project();
    let output = run_in(dir.path(), &["deps", "app/main.html"]).await.unwrap();
    assert_eq!(
        output,
        "app/main.html\n\
         ├── header: app/parts/header.html\n\
         │   └── icon: shared/icon.html\n\
         └── footer: shared/footer.html\n"
    );
}

#[tokio::test]
async fn deps_base_url_flag_overrides_config() {
    let dir = project();
    write_file(dir.path(), "rload.json", r#"{ "baseUrl": "shared/" }"#);
    let output = run_in(dir.path(), &["deps", "parts/header.html", "--baseUrl", "app/"])
        .await
        .unwrap();
    assert!(output.starts_with("app/parts/header.html\n"), "{output}");
}

#[tokio::test]
async fn deps_failure_names_component() {
    let dir = project();
    let err = run_in(dir.path(), &["deps", "absent.html"]).await.unwrap_err();
    assert_eq!(err.to_string(), "failed to load absent.html");
    assert!(matches!(
        err.downcast_ref::<LoadError>(),
        Some(LoadError::Fetch { .. })
    ));
}

#[tokio::test]
async fn build_loader_applies_config() {
    let dir = project();
    let config = ProjectConfig {
        cache: Some(false),
        base_url: Some("shared/".to_string()),
        ..ProjectConfig::default()
    };
    let loader: Loader = build_loader(&config, dir.path());
    assert!(!loader.settings().cache);

    let icon = loader.load("icon.html").await.unwrap();
    assert_eq!(icon.url, "shared/icon.html");
    assert_eq!(render_tree(&icon), "shared/icon.html\n");
}
