use std::path::{Path, PathBuf};

use thiserror::Error;

const APP_DIR: &str = "SittingDetector";

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("model {name} not found in {searched:?}")]
    NotCached { name: String, searched: Vec<PathBuf> },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Resolve a detector model file.
///
/// Resolution order:
/// 1. Explicit path (must exist)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory, if given
pub fn resolve(
    explicit: Option<&Path>,
    name: &str,
    bundled_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::NotFound(path.to_path_buf()))
        };
    }

    let mut searched = vec![model_cache_dir()?];
    searched.extend(bundled_dir.map(Path::to_path_buf));
    find_in(name, &searched).ok_or_else(|| ModelResolveError::NotCached {
        name: name.to_string(),
        searched,
    })
}

fn find_in(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().map(|d| d.join(name)).find(|p| p.exists())
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/SittingDetector/models/`
/// - Linux: `$XDG_CACHE_HOME/SittingDetector/models/` or `~/.cache/SittingDetector/models/`
/// - Windows: `%LOCALAPPDATA%/SittingDetector/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(APP_DIR).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

/// Per-user data directory holding the request history and generated reports.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR))
}
