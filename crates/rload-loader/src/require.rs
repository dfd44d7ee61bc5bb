//! Module lookup for `require` calls made by component scripts
//!
//! A name is looked up, in order, among:
//! 1. values a `ModuleLoader` resolved for the current load,
//! 2. the registry's named modules,
//! 3. the registry's globals,
//! 4. the host's own import mechanism, if one was supplied.

use crate::error::LoadError;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::trace;

/// What a script's `require` binding calls.
pub trait Require: Send + Sync {
    fn require(&self, name: &str) -> Result<Value, LoadError>;
}

/// Host-provided dynamic import, consulted last.
pub trait HostImport: Send + Sync {
    fn import(&self, name: &str) -> Option<Value>;
}

/// Named values available to every script a loader evaluates.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<FxHashMap<String, Value>>,
    globals: RwLock<FxHashMap<String, Value>>,
    host: Option<Arc<dyn HostImport>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    pub fn with_host_import(host: Arc<dyn HostImport>) -> Self {
        ModuleRegistry {
            host: Some(host),
            ..ModuleRegistry::default()
        }
    }

    pub fn register_module(&self, name: impl Into<String>, value: Value) {
        insert(&self.modules, name.into(), value);
    }

    pub fn register_global(&self, name: impl Into<String>, value: Value) {
        insert(&self.globals, name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Result<Value, LoadError> {
        if let Some(value) = get(&self.modules, name) {
            trace!(name, "module from registry");
            return Ok(value);
        }
        if let Some(value) = get(&self.globals, name) {
            trace!(name, "module from globals");
            return Ok(value);
        }
        if let Some(value) = self.host.as_ref().and_then(|host| host.import(name)) {
            trace!(name, "module from host import");
            return Ok(value);
        }
        Err(LoadError::unresolved_module(name))
    }
}

impl Require for ModuleRegistry {
    fn require(&self, name: &str) -> Result<Value, LoadError> {
        self.lookup(name)
    }
}

/// The lookup chain for one load: preloaded modules, then the registry.
pub struct ModuleLookup<'a> {
    preloaded: &'a FxHashMap<String, Value>,
    registry: &'a ModuleRegistry,
}

impl<'a> ModuleLookup<'a> {
    pub fn new(preloaded: &'a FxHashMap<String, Value>, registry: &'a ModuleRegistry) -> Self {
        ModuleLookup {
            preloaded,
            registry,
        }
    }
}

impl Require for ModuleLookup<'_> {
    fn require(&self, name: &str) -> Result<Value, LoadError> {
        match self.preloaded.get(name) {
            Some(value) => Ok(value.clone()),
            None => self.registry.lookup(name),
        }
    }
}

fn insert(map: &RwLock<FxHashMap<String, Value>>, name: String, value: Value) {
    match map.write() {
        Ok(mut map) => map.insert(name, value),
        Err(e) => e.into_inner().insert(name, value),
    };
}

fn get(map: &RwLock<FxHashMap<String, Value>>, name: &str) -> Option<Value> {
    match map.read() {
        Ok(map) => map.get(name).cloned(),
        Err(e) => e.into_inner().get(name).cloned(),
    }
}
