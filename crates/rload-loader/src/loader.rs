//! The component loader
//!
//! Resolves identifiers to URLs, fetches and parses component files, loads
//! their imports recursively and builds them with `make`. Loads of the same
//! URL are shared through the `LoadCache` while caching is enabled.

use crate::cache::{LoadCache, LoadResult};
use crate::component::{Component, Runtime};
use crate::definition::ComponentDefinition;
use crate::error::LoadError;
use crate::eval::{InertEvaluator, ScriptEvaluator};
use crate::fetch::{Fetch, FsFetch};
use crate::make::{ImportLoader, MakeConfig, ModuleLoader, make};
use crate::path::{get_name, resolve_import};
use crate::require::{HostImport, ModuleRegistry};
use crate::template::{FlatTemplateParser, TemplateNode, TemplateParser};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

/// The two loader-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderSettings {
    /// Share loads of the same URL
    pub cache: bool,
    /// Base for identifiers that are not `./` or `../` relative
    pub base_url: String,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        LoaderSettings {
            cache: true,
            base_url: String::new(),
        }
    }
}

struct LoaderInner {
    fetch: Arc<dyn Fetch>,
    parser: Arc<dyn TemplateParser>,
    evaluator: Arc<dyn ScriptEvaluator>,
    module_loader: Option<Arc<dyn ModuleLoader>>,
    registry: ModuleRegistry,
    runtime: Runtime,
    cache: LoadCache,
    settings: RwLock<LoaderSettings>,
    hires: bool,
}

/// Loads components and their dependency graphs.
///
/// Cloning is cheap; clones share the cache, registry and settings.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

pub struct LoaderBuilder {
    fetch: Option<Arc<dyn Fetch>>,
    parser: Option<Arc<dyn TemplateParser>>,
    evaluator: Option<Arc<dyn ScriptEvaluator>>,
    module_loader: Option<Arc<dyn ModuleLoader>>,
    host_import: Option<Arc<dyn HostImport>>,
    modules: Vec<(String, Value)>,
    globals: Vec<(String, Value)>,
    settings: LoaderSettings,
    hires: bool,
}

impl Default for LoaderBuilder {
    fn default() -> Self {
        LoaderBuilder {
            fetch: None,
            parser: None,
            evaluator: None,
            module_loader: None,
            host_import: None,
            modules: Vec::new(),
            globals: Vec::new(),
            settings: LoaderSettings::default(),
            hires: true,
        }
    }
}

impl LoaderBuilder {
    pub fn fetch(mut self, fetch: impl Fetch + 'static) -> Self {
        self.fetch = Some(Arc::new(fetch));
        self
    }

    pub fn template_parser(mut self, parser: impl TemplateParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn evaluator(mut self, evaluator: impl ScriptEvaluator + 'static) -> Self {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    pub fn module_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.module_loader = Some(Arc::new(loader));
        self
    }

    pub fn host_import(mut self, host: impl HostImport + 'static) -> Self {
        self.host_import = Some(Arc::new(host));
        self
    }

    pub fn module(mut self, name: impl Into<String>, value: Value) -> Self {
        self.modules.push((name.into(), value));
        self
    }

    pub fn global(mut self, name: impl Into<String>, value: Value) -> Self {
        self.globals.push((name.into(), value));
        self
    }

    pub fn settings(mut self, settings: LoaderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        self.settings.cache = enabled;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    /// Per-character source maps (the default) or one mapping per line.
    pub fn hires(mut self, hires: bool) -> Self {
        self.hires = hires;
        self
    }

    pub fn build(self) -> Loader {
        let registry = match self.host_import {
            Some(host) => ModuleRegistry::with_host_import(host),
            None => ModuleRegistry::new(),
        };
        for (name, value) in self.modules {
            registry.register_module(name, value);
        }
        for (name, value) in self.globals {
            registry.register_global(name, value);
        }

        Loader {
            inner: Arc::new(LoaderInner {
                fetch: self.fetch.unwrap_or_else(|| Arc::new(FsFetch::new())),
                parser: self.parser.unwrap_or_else(|| Arc::new(FlatTemplateParser)),
                evaluator: self.evaluator.unwrap_or_else(|| Arc::new(InertEvaluator)),
                module_loader: self.module_loader,
                registry,
                runtime: Runtime::new(),
                cache: LoadCache::new(),
                settings: RwLock::new(self.settings),
                hires: self.hires,
            }),
        }
    }
}

impl Loader {
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::default()
    }

    /// Load one component. Relative identifiers resolve against the base URL.
    pub async fn load(&self, identifier: &str) -> LoadResult {
        let settings = self.settings();
        load_single(
            &self.inner,
            identifier,
            &settings.base_url,
            &settings.base_url,
            settings.cache,
            ImportChain::default(),
        )
        .await
    }

    /// Load several components concurrently, keyed by name.
    ///
    /// Fails with the first error any of them produces.
    pub async fn load_many<I, N, P>(
        &self,
        entries: I,
    ) -> Result<IndexMap<String, Arc<Component>>, LoadError>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<str>,
    {
        let settings = self.settings();
        let (names, loads): (Vec<String>, Vec<_>) = entries
            .into_iter()
            .map(|(name, path)| {
                let load = load_single(
                    &self.inner,
                    path.as_ref(),
                    &settings.base_url,
                    &settings.base_url,
                    settings.cache,
                    ImportChain::default(),
                );
                (name.into(), load)
            })
            .unzip();

        let components = try_join_all(loads).await?;
        Ok(names.into_iter().zip(components).collect())
    }

    /// Load every component a host document declares with
    /// `<link rel="ractive" href="...">` and register each with the runtime
    /// under its `name` attribute, or its file name.
    pub async fn load_from_document(
        &self,
        document: &str,
    ) -> Result<IndexMap<String, Arc<Component>>, LoadError> {
        let parsed = self
            .inner
            .parser
            .parse(document)
            .map_err(|err| LoadError::Parse {
                message: err.to_string(),
            })?;

        let mut links = Vec::new();
        collect_component_links(&parsed.nodes, &mut links);
        debug!(count = links.len(), "components declared in document");

        let settings = self.settings();
        let loads = links.iter().map(|(_, href)| {
            load_single(
                &self.inner,
                href,
                "",
                &settings.base_url,
                settings.cache,
                ImportChain::default(),
            )
        });
        let components = try_join_all(loads).await?;

        let mut registered = IndexMap::new();
        for ((name, _), component) in links.into_iter().zip(components) {
            self.inner.runtime.register(name.clone(), component.clone());
            registered.insert(name, component);
        }
        Ok(registered)
    }

    /// Load `identifier` on the current Tokio runtime and hand the result to
    /// `callback` from the spawned task. The callback never runs before this
    /// method returns.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn load_with_callback<F>(
        &self,
        identifier: impl Into<String>,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(LoadResult) + Send + 'static,
    {
        let loader = self.clone();
        let identifier = identifier.into();
        tokio::spawn(async move {
            let result = loader.load(&identifier).await;
            callback(result);
        })
    }

    pub fn settings(&self) -> LoaderSettings {
        match self.inner.settings.read() {
            Ok(settings) => settings.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }

    /// Turn caching on or off. Turning it off drops every cached load.
    pub fn set_cache_enabled(&self, enabled: bool) {
        match self.inner.settings.write() {
            Ok(mut settings) => settings.cache = enabled,
            Err(e) => e.into_inner().cache = enabled,
        }
        if !enabled {
            self.inner.cache.clear();
        }
    }

    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        match self.inner.settings.write() {
            Ok(mut settings) => settings.base_url = base_url,
            Err(e) => e.into_inner().base_url = base_url,
        }
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    pub fn cache(&self) -> &LoadCache {
        &self.inner.cache
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.inner.registry
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }
}

/// URLs being built on the way to the current import.
#[derive(Clone, Debug, Default)]
struct ImportChain(Arc<Vec<String>>);

impl ImportChain {
    fn contains(&self, url: &str) -> bool {
        self.0.iter().any(|u| u == url)
    }

    fn with(&self, url: &str) -> ImportChain {
        let mut chain = Vec::with_capacity(self.0.len() + 1);
        chain.extend(self.0.iter().cloned());
        chain.push(url.to_string());
        ImportChain(Arc::new(chain))
    }

    /// The cycle closed by importing `url` again.
    fn cycle(&self, url: &str) -> Vec<String> {
        let start = self.0.iter().position(|u| u == url).unwrap_or(0);
        let mut cycle = self.0[start..].to_vec();
        cycle.push(url.to_string());
        cycle
    }
}

fn load_single(
    inner: &Arc<LoaderInner>,
    path: &str,
    parent_url: &str,
    base_url: &str,
    cache: bool,
    chain: ImportChain,
) -> BoxFuture<'static, LoadResult> {
    let url = resolve_import(path, parent_url, base_url);

    if chain.contains(&url) {
        let error = LoadError::CircularImport {
            chain: chain.cycle(&url),
        };
        return futures::future::ready(Err(error)).boxed();
    }

    if !cache {
        return build(inner.clone(), url, base_url.to_string(), cache, chain).boxed();
    }

    let ancestors = chain.clone();
    let load = inner.cache.get_or_start(&url, &ancestors.0, |generation| {
        let inner = inner.clone();
        let url = url.clone();
        let base_url = base_url.to_string();
        async move {
            let result = build(inner.clone(), url.clone(), base_url, cache, chain).await;
            if result.is_err() {
                inner.cache.evict(&url, generation);
            }
            result
        }
        .boxed()
    });
    match load {
        Ok(load) => load.boxed(),
        Err(cycle) => {
            debug!(url = %url, "import waits on its own importer");
            futures::future::ready(Err(LoadError::CircularImport { chain: cycle })).boxed()
        }
    }
}

async fn build(
    inner: Arc<LoaderInner>,
    url: String,
    base_url: String,
    cache: bool,
    chain: ImportChain,
) -> LoadResult {
    debug!(url = %url, "fetching component");
    let source = inner
        .fetch
        .fetch(&url)
        .await
        .map_err(|err| LoadError::Fetch {
            url: url.clone(),
            message: err.to_string(),
        })?;

    let definition = ComponentDefinition::parse(&source, inner.parser.as_ref())?;

    let imports = ChainedImportLoader {
        inner: inner.clone(),
        base_url,
        cache,
        chain: chain.with(&url),
    };
    let component = make(
        definition,
        MakeConfig {
            url: &url,
            import_loader: Some(&imports),
            module_loader: inner.module_loader.as_deref(),
            evaluator: inner.evaluator.as_ref(),
            registry: &inner.registry,
            runtime: &inner.runtime,
            hires: inner.hires,
        },
    )
    .await?;

    debug!(url = %url, "component ready");
    Ok(Arc::new(component))
}

/// Import loader used for components the loader builds: imports resolve
/// against the importing file or the base URL and go through the same cache.
struct ChainedImportLoader {
    inner: Arc<LoaderInner>,
    base_url: String,
    cache: bool,
    chain: ImportChain,
}

#[async_trait]
impl ImportLoader for ChainedImportLoader {
    async fn load_import(
        &self,
        _name: &str,
        href: &str,
        parent_url: &str,
    ) -> Result<Arc<Component>, LoadError> {
        load_single(
            &self.inner,
            href,
            parent_url,
            &self.base_url,
            self.cache,
            self.chain.clone(),
        )
        .await
    }
}

fn collect_component_links(nodes: &[TemplateNode], links: &mut Vec<(String, String)>) {
    for node in nodes {
        let TemplateNode::Element(element) = node else {
            continue;
        };
        if element.tag == "link" && element.attr("rel") == Some("ractive") {
            if let Some(href) = element.attr("href") {
                let name = element
                    .attr("name")
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| get_name(href));
                links.push((name.to_string(), href.to_string()));
            }
        }
        collect_component_links(&element.children, links);
    }
}
