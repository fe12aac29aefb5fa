//! Uniquely named transient working directories
//!
//! Each clone lives in `<parent>/<uuid-v4>` and is removed when the guard is
//! dropped, so concurrent work items never share a path.

use crate::core::error::RailResult;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug)]
pub struct WorkDir {
  path: PathBuf,
}

impl WorkDir {
  /// Reserve a fresh directory name under `parent` (the directory itself is
  /// left for `git clone` to create)
  pub fn reserve(parent: &Path) -> RailResult<Self> {
    std::fs::create_dir_all(parent)?;
    let path = parent.join(Uuid::new_v4().to_string());
    Ok(Self { path })
  }

  /// Create a fresh empty directory under `parent`
  pub fn create(parent: &Path) -> RailResult<Self> {
    let dir = Self::reserve(parent)?;
    std::fs::create_dir(&dir.path)?;
    Ok(dir)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for WorkDir {
  fn drop(&mut self) {
    if self.path.exists()
      && let Err(e) = std::fs::remove_dir_all(&self.path)
    {
      tracing::warn!("could not remove {}: {}", self.path.display(), e);
    }
  }
}
