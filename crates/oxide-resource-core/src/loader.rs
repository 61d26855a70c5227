//! Loading resource descriptions from disk.
//!
//! The convention is one JSON document per resource inside a directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ResourceError, Result};
use crate::raw::RawResource;

/// Parses a single resource document.
pub fn load_str(source: &str, path: impl Into<PathBuf>) -> Result<RawResource> {
    serde_json::from_str(source).map_err(|source| ResourceError::Parse {
        path: path.into(),
        source,
    })
}

/// Reads one resource document from a file.
pub fn load_file(path: &Path) -> Result<RawResource> {
    let source = fs::read_to_string(path).map_err(|source| ResourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded resource file");
    load_str(&source, path)
}

/// Reads every `*.json` file in `dir`, sorted by file name.
pub fn load_dir(dir: &Path) -> Result<Vec<RawResource>> {
    let io_err = |source| ResourceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let resources = paths
        .iter()
        .map(|path| load_file(path))
        .collect::<Result<Vec<_>>>()?;

    info!(
        dir = %dir.display(),
        resources = resources.len(),
        "Loaded resource directory"
    );
    Ok(resources)
}
