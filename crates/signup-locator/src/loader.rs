//! User catalog loading from TOML files.
//!
//! A user catalog is either a single TOML file or a directory of them; every
//! document is layered over the builtin catalog in path order.

use crate::{
    catalog::CatalogFile,
    error::{CatalogError, Result},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Loader for user catalog files.
pub struct CatalogLoader {
    /// File or directory holding catalog documents
    path: PathBuf,
}

impl CatalogLoader {
    /// Create a new loader for the given file or directory.
    ///
    /// # Errors
    /// Returns error if the path doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Err(CatalogError::PathNotFound {
                path: path.display().to_string(),
            });
        }

        Ok(Self { path })
    }

    /// Load every catalog document under the path.
    ///
    /// A single file must parse. Inside a directory, documents that fail to
    /// parse are logged as warnings and skipped.
    ///
    /// # Errors
    /// Returns error if the path can't be read, or a single file is invalid.
    pub fn load_all(&self) -> Result<Vec<CatalogFile>> {
        if self.path.is_file() {
            let file = Self::load_from_path(&self.path)?;
            debug!(path = %self.path.display(), roles = file.lists.len(), "loaded catalog file");
            return Ok(vec![file]);
        }

        let mut files = Vec::new();
        Self::walk_and_load_recursive(&self.path, &mut files)?;

        info!(
            count = files.len(),
            dir = %self.path.display(),
            "loaded catalog files"
        );

        Ok(files)
    }

    /// Recursively walk directory and load all TOML files in name order.
    fn walk_and_load_recursive(dir: &Path, files: &mut Vec<CatalogFile>) -> Result<()> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                Self::walk_and_load_recursive(&path, files)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                match Self::load_from_path(&path) {
                    Ok(file) => files.push(file),
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "skipping invalid catalog file"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Load a catalog document from a specific file path.
    fn load_from_path(path: &Path) -> Result<CatalogFile> {
        let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::LoadError {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        CatalogFile::parse(&contents, &path.display().to_string())
    }
}
