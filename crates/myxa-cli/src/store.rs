//! Loading and saving the working package and the index.
//!
//! Both files are the JSON encodings of the core model. Writes go through
//! a temp file in the destination directory followed by a rename, so a
//! crash mid-write never leaves a torn file behind.

use anyhow::{bail, Context, Result};
use myxa_core::{Index, Package, DEFAULT_INDEX_NAME};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The working package file in the current directory.
pub const PACKAGE_FILE: &str = "package.json";

/// Environment variable naming the index file path.
pub const INDEX_ENV: &str = "MYXA_INDEX";

/// Path of the working package file.
#[must_use]
pub fn package_path() -> PathBuf {
    PathBuf::from(PACKAGE_FILE)
}

/// Path of the index file: `$MYXA_INDEX`, or a shared temp-dir fallback.
#[must_use]
pub fn index_path() -> PathBuf {
    match env::var(INDEX_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => env::temp_dir().join("myxa").join("index.json"),
    }
}

/// Load the working package.
pub fn load_package(path: &Path) -> Result<Package> {
    if !path.exists() {
        bail!("no {PACKAGE_FILE} found in the current directory; run `myxa init` first");
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Save the working package.
pub fn save_package(package: &Package, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(package)?;
    write_atomic(path, &content)
}

/// Load the index, or a fresh empty one when the file does not exist yet.
pub fn load_index(path: &Path) -> Result<Index> {
    tracing::debug!(path = %path.display(), "loading index");
    if !path.exists() {
        return Ok(Index::new(DEFAULT_INDEX_NAME));
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Save the index.
pub fn save_index(index: &Index, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(index)?;
    write_atomic(path, &content)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    file.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
