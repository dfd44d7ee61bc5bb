//! Async component loader for rload.
//!
//! This crate turns component files into built components:
//! - `template` - The template collaborator (`TemplateParser`) and a flat
//!   default parser
//! - `definition` - Splitting a component file into template, imports,
//!   styles and script, and finding `require` calls in real code
//! - `make` - Resolving dependencies and synthesizing a `Component`
//! - `loader` - URL resolution, fetching and the single-flight `LoadCache`
//!
//! Script execution and retrieval are collaborators too (`ScriptEvaluator`,
//! `Fetch`), so the loader itself never runs script text.

pub mod cache;
pub use cache::{LoadCache, LoadResult, SharedLoad};

pub mod component;
pub use component::{Component, Exports, Runtime};

pub mod definition;
pub use definition::{ComponentDefinition, Import, REQUIRE_PATTERN, find_requires};

pub mod error;
pub use error::{ErrorLocation, LoadError};

pub mod eval;
pub use eval::{
    ComponentExports, EvalError, EvalScope, GeneratedPosition, InertEvaluator, ScriptEvaluator,
    ScriptRequest,
};

pub mod fetch;
pub use fetch::{Fetch, FetchError, FsFetch};

pub mod loader;
pub use loader::{Loader, LoaderBuilder, LoaderSettings};

pub mod make;
pub use make::{ImportLoader, MakeConfig, ModuleLoader, make};

pub mod path;
pub use path::{get_name, resolve, resolve_import};

pub mod require;
pub use require::{HostImport, ModuleLookup, ModuleRegistry, Require};

pub mod template;
pub use template::{
    Element, FlatTemplateParser, ParsedTemplate, TEMPLATE_VERSION, TemplateError, TemplateNode,
    TemplateParser,
};

#[cfg(test)]
#[path = "tests/test_support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod cache_tests;
#[cfg(test)]
#[path = "tests/template_tests.rs"]
mod template_tests;
#[cfg(test)]
#[path = "tests/definition_tests.rs"]
mod definition_tests;
#[cfg(test)]
#[path = "tests/path_tests.rs"]
mod path_tests;
#[cfg(test)]
#[path = "tests/make_tests.rs"]
mod make_tests;
#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod loader_tests;
