//! Raw asset fetching.
//!
//! [`AssetSource`] is the one place bytes come from. [`DirSource`] serves
//! web-style absolute URLs (`/assets/...`) out of a directory on disk,
//! [`MemorySource`] serves bundled or test assets from memory.

use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("asset '{0}' not found")]
    NotFound(String),
    #[error("failed to read '{url}': {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait AssetSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Serves URLs relative to a root directory. Leading slashes are ignored and
/// URLs escaping the root are treated as missing.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = self
            .resolve(url)
            .ok_or_else(|| FetchError::NotFound(url.to_string()))?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(url.to_string()),
            _ => FetchError::Io {
                url: url.to_string(),
                source: e,
            },
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: FxHashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(url.into(), bytes);
    }

    pub fn with(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
