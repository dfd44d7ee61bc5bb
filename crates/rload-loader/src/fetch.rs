//! Source retrieval

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Retrieves the raw text of a component by URL.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches from the local filesystem, treating URLs as paths.
#[derive(Clone, Debug, Default)]
pub struct FsFetch {
    root: Option<PathBuf>,
}

impl FsFetch {
    pub fn new() -> Self {
        FsFetch::default()
    }

    /// Resolve every URL under `root`; a leading `/` is relative to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        FsFetch {
            root: Some(root.into()),
        }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(url.trim_start_matches('/')),
            None => PathBuf::from(url),
        }
    }
}

#[async_trait]
impl Fetch for FsFetch {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let path = self.path_for(url);
        trace!(url, path = %path.display(), "reading component");
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(path.display().to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}
