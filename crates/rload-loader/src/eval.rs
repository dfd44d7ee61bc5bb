//! Script evaluation seam
//!
//! The loader never runs script text itself. It wraps the script of a
//! component in a function taking `component`, `require` and `Ractive`,
//! annotates it with an inline source map (or a `sourceURL` label), and hands
//! it to a `ScriptEvaluator` together with the values for those three
//! parameters.

use crate::component::Runtime;
use crate::error::LoadError;
use crate::require::Require;
use rload_common::SourceMap;
use serde_json::Value;
use thiserror::Error;

/// Parameters of the function a script is wrapped in.
pub const WRAPPER_PARAMETERS: [&str; 3] = ["component", "require", "Ractive"];

/// A script ready to evaluate.
#[derive(Clone, Debug)]
pub struct ScriptRequest {
    /// Resolved URL of the component file
    pub url: String,
    /// The script as written in the component file
    pub script: String,
    /// The wrapped and annotated code
    pub code: String,
    /// Map for `code`, already shifted past the wrapper's first line
    pub source_map: Option<SourceMap>,
}

impl ScriptRequest {
    pub fn new(url: &str, script: &str, source_map: Option<&SourceMap>) -> Self {
        let source_map = source_map.map(|map| map.with_leading_lines(1));

        let mut code = format!(
            "(function ({}) {{\n{script}\n}})",
            WRAPPER_PARAMETERS.join(", ")
        );
        match &source_map {
            Some(map) => {
                code.push_str("\n//# sourceMappingURL=");
                code.push_str(&map.to_url());
            }
            None if !url.is_empty() => {
                code.push_str("\n//# sourceURL=");
                code.push_str(url);
            }
            None => {}
        }

        ScriptRequest {
            url: url.to_string(),
            script: script.to_string(),
            code,
            source_map,
        }
    }
}

/// The `component` argument: a script publishes its options by assigning
/// `component.exports`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentExports {
    pub exports: Option<Value>,
}

/// Bindings for the wrapper function's parameters.
pub struct EvalScope<'a> {
    pub component: &'a mut ComponentExports,
    pub require: &'a dyn Require,
    pub runtime: &'a Runtime,
}

/// Zero-based line and column in `ScriptRequest::code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratedPosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, Error)]
pub enum EvalError {
    #[error("SyntaxError: {message}")]
    Syntax {
        message: String,
        position: Option<GeneratedPosition>,
    },

    #[error("{message}")]
    Runtime {
        message: String,
        position: Option<GeneratedPosition>,
    },

    /// A `require` call failed.
    #[error(transparent)]
    Require(#[from] LoadError),
}

impl EvalError {
    pub fn position(&self) -> Option<GeneratedPosition> {
        match self {
            EvalError::Syntax { position, .. } | EvalError::Runtime { position, .. } => *position,
            EvalError::Require(_) => None,
        }
    }
}

/// Evaluates wrapped component scripts in an isolated scope.
pub trait ScriptEvaluator: Send + Sync {
    fn evaluate(&self, request: &ScriptRequest, scope: EvalScope<'_>) -> Result<(), EvalError>;
}

/// Evaluator that runs nothing and exports nothing.
///
/// Lets a loader resolve and inspect component graphs without a script
/// engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct InertEvaluator;

impl ScriptEvaluator for InertEvaluator {
    fn evaluate(&self, request: &ScriptRequest, _scope: EvalScope<'_>) -> Result<(), EvalError> {
        tracing::trace!(url = %request.url, "skipping script evaluation");
        Ok(())
    }
}
