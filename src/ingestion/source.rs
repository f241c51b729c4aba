//! Byte providers: the transport collaborator trait and local, already-resident sources.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{IngestionError, IngestionResult};

/// Supplies the raw bytes behind a locator.
///
/// Implementations own whatever client they need; the returned future must not borrow `self`.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, locator: &str) -> BoxFuture<'static, IngestionResult<Vec<u8>>>;
}

/// Resolves locators as file-system paths, optionally relative to a root directory.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locators against `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(locator),
            None => PathBuf::from(locator),
        }
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, locator: &str) -> BoxFuture<'static, IngestionResult<Vec<u8>>> {
        let result = fs::read(self.resolve(locator)).map_err(IngestionError::from);
        future::ready(result).boxed()
    }
}

/// Serves bytes registered up front; unknown locators fail with a transport error.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `locator`.
    pub fn with(mut self, locator: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(locator.into(), bytes.into());
        self
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, locator: &str) -> BoxFuture<'static, IngestionResult<Vec<u8>>> {
        let result = self
            .entries
            .get(locator)
            .cloned()
            .ok_or_else(|| IngestionError::Transport {
                locator: locator.to_string(),
                message: "not found".to_string(),
            });
        future::ready(result).boxed()
    }
}

/// An already-resident source: a file name plus its content.
///
/// The name only drives format detection; it is never opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file into memory, using its file name as the source name.
    pub fn from_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}
