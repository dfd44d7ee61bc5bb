//! Built components and the runtime registry

use crate::template::ParsedTemplate;
use indexmap::IndexMap;
use rload_common::SourceMap;
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Properties a script attached to its exports object.
pub type Exports = serde_json::Map<String, Value>;

/// A fully built component: template, styles, resolved sub-components and
/// whatever options its script exported.
#[derive(Clone, Debug)]
pub struct Component {
    /// Resolved URL the component was loaded from; empty for `make` without
    /// a URL
    pub url: String,
    pub template: ParsedTemplate,
    pub css: String,
    /// Imported sub-components by name, in declaration order
    pub components: IndexMap<String, Arc<Component>>,
    pub options: Exports,
    /// Map from the evaluated script back to the component file
    pub source_map: Option<SourceMap>,
}

impl Component {
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn component(&self, name: &str) -> Option<&Arc<Component>> {
        self.components.get(name)
    }
}

/// The component runtime handed to scripts, holding globally registered
/// components.
#[derive(Debug, Default)]
pub struct Runtime {
    components: RwLock<IndexMap<String, Arc<Component>>>,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime::default()
    }

    pub fn register(&self, name: impl Into<String>, component: Arc<Component>) {
        match self.components.write() {
            Ok(mut components) => components.insert(name.into(), component),
            Err(e) => e.into_inner().insert(name.into(), component),
        };
    }

    pub fn component(&self, name: &str) -> Option<Arc<Component>> {
        match self.components.read() {
            Ok(components) => components.get(name).cloned(),
            Err(e) => e.into_inner().get(name).cloned(),
        }
    }

    pub fn component_names(&self) -> Vec<String> {
        match self.components.read() {
            Ok(components) => components.keys().cloned().collect(),
            Err(e) => e.into_inner().keys().cloned().collect(),
        }
    }
}
