use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("model {name} is not cached and has no download URL; pass its path explicitly")]
    Unavailable { name: String },
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// A model artifact known by file name, optionally downloadable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub url: Option<&'static str>,
}

/// Resolve a model file, preferring an explicitly configured path.
///
/// Resolution order:
/// 1. Explicit path (must exist)
/// 2. User cache directory
/// 3. Download from the model's URL into the cache
pub fn resolve(
    explicit: Option<&Path>,
    spec: ModelSpec,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return existing(path);
    }
    resolve_in(&model_cache_dir()?, spec, progress)
}

/// Same as [`resolve`] without an explicit path, against a given cache.
pub fn resolve_in(
    cache_dir: &Path,
    spec: ModelSpec,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(spec.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    let url = spec.url.ok_or_else(|| ModelResolveError::Unavailable {
        name: spec.name.to_string(),
    })?;
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {url}", spec.name);
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

fn existing(path: &Path) -> Result<PathBuf, ModelResolveError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(ModelResolveError::NotFound(path.to_path_buf()))
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/DepthFace/models/`
/// - Linux: `$XDG_CACHE_HOME/DepthFace/models/` or `~/.cache/DepthFace/models/`
/// - Windows: `%LOCALAPPDATA%/DepthFace/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("DepthFace").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("DepthFace").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(|e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    })?;

    let bytes = match response.bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            drop(file);
            let _ = fs::remove_file(&temp_path);
            return Err(ModelResolveError::Download {
                url: url.to_string(),
                source: e,
            });
        }
    };

    let chunk_size = 1024 * 1024;
    for chunk in bytes.chunks(chunk_size) {
        file.write_all(chunk)
            .map_err(|e| ModelResolveError::Write {
                path: temp_path.clone(),
                source: e,
            })?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    })?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const OFFLINE: ModelSpec = ModelSpec {
        name: "landmarks.onnx",
        url: None,
    };

    #[test]
    fn test_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.onnx");
        fs::write(&path, b"model").unwrap();

        let resolved = resolve(Some(&path), OFFLINE, None).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_missing_explicit_path_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.onnx");
        let err = resolve(Some(&path), OFFLINE, None).unwrap_err();
        assert!(matches!(err, ModelResolveError::NotFound(p) if p == path));
    }

    #[test]
    fn test_explicit_directory_is_not_a_model() {
        let tmp = TempDir::new().unwrap();
        let err = resolve(Some(tmp.path()), OFFLINE, None).unwrap_err();
        assert!(matches!(err, ModelResolveError::NotFound(_)));
    }

    #[test]
    fn test_resolve_in_finds_cached_file() {
        let tmp = TempDir::new().unwrap();
        let cached = tmp.path().join(OFFLINE.name);
        fs::write(&cached, b"cached").unwrap();

        assert_eq!(resolve_in(tmp.path(), OFFLINE, None).unwrap(), cached);
    }

    #[test]
    fn test_resolve_in_without_url_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_in(tmp.path(), OFFLINE, None).unwrap_err();
        assert!(matches!(err, ModelResolveError::Unavailable { ref name } if name == "landmarks.onnx"));
        assert!(err.to_string().contains("pass its path explicitly"));
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("DepthFace"));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let _ = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
