//! Game source resolution.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FenalyzerError, Result};

/// Resolve a game source path.
///
/// The path is used as given when it exists. Otherwise it is tried once
/// more under `base_dir`; if neither exists the error names the path as the
/// caller supplied it.
pub fn resolve_source(path: &Path, base_dir: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let fallback = base_dir.join(path);
    if fallback.exists() {
        debug!(
            requested = %path.display(),
            resolved = %fallback.display(),
            "resolved game source under base directory"
        );
        return Ok(fallback);
    }

    Err(FenalyzerError::InputNotFound {
        path: path.to_path_buf(),
    })
}
