//! Local persistence for the history cache.
//!
//! The history store only ever needs one serialized value, so the port is a
//! single-slot blob: read it back at startup, overwrite it after a mutation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub trait BlobStore: Send + Sync {
  /// The stored value, or `None` if nothing has been written yet.
  fn read(&self) -> Result<Option<String>>;
  fn write(&self, value: &str) -> Result<()>;
}

/// Stores the blob as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
  path: PathBuf,
}

impl FileStore {
  pub fn new(dir: &Path, key: &str) -> Self {
    Self { path: dir.join(format!("{}.json", key)) }
  }
}

impl BlobStore for FileStore {
  fn read(&self) -> Result<Option<String>> {
    match std::fs::read_to_string(&self.path) {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
    }
  }

  fn write(&self, value: &str) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&self.path, value).with_context(|| format!("Failed to write {}", self.path.display()))
  }
}

#[cfg(test)]
pub use memory::MemoryStore;
