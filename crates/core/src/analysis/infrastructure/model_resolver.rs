use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("could not determine model cache directory")]
    NoCacheDir,
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
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 when the server sent no Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolves a model file by name: user cache, then an optional bundled
/// directory, then a download into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = model_cache_dir()?;
    let cached = cache_dir.join(name);
    if cached.exists() {
        return Ok(cached);
    }

    if let Some(dir) = bundled_dir {
        let bundled = dir.join(name);
        if bundled.exists() {
            return Ok(bundled);
        }
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(url, &cached, progress)?;
    Ok(cached)
}

/// Platform cache directory for downloaded models.
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("moodcam").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let map_download = |e: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    };
    let response = reqwest::blocking::get(url).map_err(map_download)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(map_download)?;

    // Write to a .part file, then rename, so a failed download never
    // leaves a truncated model in the cache.
    let temp = dest.with_extension("part");
    let map_write = |path: &Path| {
        let path = path.to_path_buf();
        move |e: std::io::Error| ModelResolveError::Write { path, source: e }
    };

    let mut file = fs::File::create(&temp).map_err(map_write(&temp))?;
    let mut written: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(map_write(&temp))?;
        written += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(written, total);
        }
    }
    file.flush().map_err(map_write(&temp))?;
    drop(file);

    fs::rename(&temp, dest).map_err(map_write(dest))?;
    Ok(())
}
