//! Component synthesis
//!
//! `make` turns a parsed definition into a `Component`: it requests every
//! import and module dependency at once, waits for all of them to settle,
//! then evaluates the script and merges its exports.

use crate::component::{Component, Exports, Runtime};
use crate::definition::ComponentDefinition;
use crate::error::{ErrorLocation, LoadError};
use crate::eval::{ComponentExports, EvalError, EvalScope, ScriptEvaluator, ScriptRequest};
use crate::require::{ModuleLookup, ModuleRegistry};
use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use rload_common::{SourceMap, SourceMapOptions, generate_source_map};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Loads a sub-component declared by an import.
#[async_trait]
pub trait ImportLoader: Send + Sync {
    /// `parent_url` is the URL of the importing component.
    async fn load_import(
        &self,
        name: &str,
        href: &str,
        parent_url: &str,
    ) -> Result<Arc<Component>, LoadError>;
}

/// Resolves a `require`d module ahead of evaluation.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load_module(&self, name: &str, parent_url: &str) -> Result<Value, LoadError>;
}

/// Collaborators and context for one `make` call.
pub struct MakeConfig<'a> {
    /// URL of the component file, used to resolve relative imports and to
    /// label the source map
    pub url: &'a str,
    pub import_loader: Option<&'a dyn ImportLoader>,
    pub module_loader: Option<&'a dyn ModuleLoader>,
    pub evaluator: &'a dyn ScriptEvaluator,
    pub registry: &'a ModuleRegistry,
    pub runtime: &'a Runtime,
    pub hires: bool,
}

/// Build a component from its definition.
///
/// The returned future never completes on its first poll, even when there
/// is nothing to wait for.
pub async fn make(
    definition: ComponentDefinition,
    config: MakeConfig<'_>,
) -> Result<Component, LoadError> {
    if let Some(first) = definition.imports.first() {
        if config.import_loader.is_none() {
            return Err(LoadError::MissingDependencyLoader {
                href: first.href.clone(),
            });
        }
    }

    let module_count = if config.module_loader.is_some() {
        definition.modules.len()
    } else {
        0
    };
    let remaining = definition.imports.len() + module_count;
    debug!(
        url = config.url,
        imports = definition.imports.len(),
        modules = module_count,
        "resolving dependencies"
    );

    let mut components = IndexMap::new();
    let mut preloaded = FxHashMap::default();

    if remaining == 0 {
        tokio::task::yield_now().await;
    } else {
        let url = config.url;
        let import_loader = config.import_loader;
        let imports = join_all(definition.imports.iter().map(|import| async move {
            match import_loader {
                Some(loader) => loader.load_import(&import.name, &import.href, url).await,
                None => Err(LoadError::MissingDependencyLoader {
                    href: import.href.clone(),
                }),
            }
        }));
        let modules = join_all(config.module_loader.into_iter().flat_map(|loader| {
            definition
                .modules
                .iter()
                .map(move |name| loader.load_module(name, url))
        }));
        let (imports, modules) = futures::join!(imports, modules);

        for (import, component) in definition.imports.iter().zip(imports) {
            components.insert(import.name.clone(), component?);
        }
        for (name, value) in definition.modules.iter().zip(modules) {
            preloaded.insert(name.clone(), value?);
        }
    }

    synthesize(definition, components, &preloaded, &config)
}

fn synthesize(
    definition: ComponentDefinition,
    components: IndexMap<String, Arc<Component>>,
    preloaded: &FxHashMap<String, Value>,
    config: &MakeConfig<'_>,
) -> Result<Component, LoadError> {
    debug!(url = config.url, "synthesizing component");

    let mut options = Exports::new();
    let mut source_map = None;

    if definition.has_script() {
        let map = generate_source_map(
            &definition,
            &SourceMapOptions {
                source: Some(config.url.to_string()),
                hires: config.hires,
                ..SourceMapOptions::default()
            },
        );
        let request = ScriptRequest::new(config.url, &definition.script, Some(&map));

        let mut carrier = ComponentExports::default();
        let lookup = ModuleLookup::new(preloaded, config.registry);
        let scope = EvalScope {
            component: &mut carrier,
            require: &lookup,
            runtime: config.runtime,
        };

        if let Err(err) = config.evaluator.evaluate(&request, scope) {
            return Err(evaluation_failure(config.url, &request, err));
        }

        match carrier.exports {
            Some(Value::Object(exports)) => options.extend(exports),
            Some(other) => warn!(url = config.url, exports = %other, "ignoring non-object exports"),
            None => {}
        }
        source_map = Some(map);
    }

    Ok(Component {
        url: config.url.to_string(),
        template: definition.template,
        css: definition.css,
        components,
        options,
        source_map,
    })
}

fn evaluation_failure(url: &str, request: &ScriptRequest, err: EvalError) -> LoadError {
    let location = err
        .position()
        .and_then(|position| locate(request.source_map.as_ref()?, position.line, position.column));
    match err {
        EvalError::Require(err) => err,
        err => LoadError::ScriptEvaluation {
            url: url.to_string(),
            message: err.to_string(),
            location,
        },
    }
}

fn locate(map: &SourceMap, line: u32, column: u32) -> Option<ErrorLocation> {
    let (line, column) = map.original_position_for(line, column)?;
    Some(ErrorLocation {
        line: line + 1,
        column,
    })
}
