use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use rload_loader::LoaderSettings;

/// Name of the project file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "rload.json";

/// Contents of `rload.json`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub cache: Option<bool>,
    #[serde(default)]
    pub hires: Option<bool>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// Values handed to `require(name)` ahead of globals
    #[serde(default)]
    pub modules: IndexMap<String, Value>,
    #[serde(default)]
    pub globals: IndexMap<String, Value>,
}

impl ProjectConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or("")
    }

    pub fn cache(&self) -> bool {
        self.cache.unwrap_or(true)
    }

    pub fn hires(&self) -> bool {
        self.hires.unwrap_or(true)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            cache: self.cache(),
            base_url: self.base_url().to_string(),
        }
    }
}

pub fn parse_config(text: &str) -> Result<ProjectConfig> {
    serde_json::from_str(text).context("failed to parse project file")
}

pub fn load_config(path: &Path) -> Result<ProjectConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid project file {}", path.display()))
}

/// Load the explicit project file, or `rload.json` in `cwd` when it exists.
///
/// An explicit path that does not exist is an error; a missing default file
/// yields the default configuration.
pub fn find_config(cwd: &Path, explicit: Option<&Path>) -> Result<ProjectConfig> {
    if let Some(path) = explicit {
        let path = cwd.join(path);
        if !path.is_file() {
            bail!("project file {} does not exist", path.display());
        }
        return load_config(&path);
    }

    let default_path = cwd.join(CONFIG_FILE_NAME);
    if default_path.is_file() {
        load_config(&default_path)
    } else {
        Ok(ProjectConfig::default())
    }
}
