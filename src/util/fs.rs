//! Filesystem utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use walkdir::WalkDir;

/// Resolve `.` and `..` components lexically, without touching the
/// filesystem. Used to key manifest paths referenced as `../Lib`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Canonicalize a path, falling back to lexical normalization when the
/// path cannot be resolved.
pub fn canonicalize_or_normalize(path: &Path) -> PathBuf {
    path.canonicalize()
        .unwrap_or_else(|_| normalize_path(path))
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Resolve source patterns relative to a base directory into a sorted,
/// deduplicated file list.
///
/// A pattern containing glob metacharacters is expanded with glob; a plain
/// entry naming a directory is walked recursively; a plain entry naming a
/// file is taken as-is. Missing plain entries resolve to nothing.
pub fn source_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full = base.join(pattern);

        if pattern.contains(['*', '?', '[']) {
            let pattern_str = full.to_string_lossy();
            for entry in glob(&pattern_str)
                .with_context(|| format!("invalid source pattern: {pattern}"))?
            {
                match entry {
                    Ok(path) if path.is_file() => results.push(path),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("glob error: {}", e);
                    }
                }
            }
        } else if full.is_dir() {
            for entry in WalkDir::new(&full).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("failed to walk directory: {}", full.display()))?;
                if entry.file_type().is_file() {
                    results.push(entry.into_path());
                }
            }
        } else if full.is_file() {
            results.push(full);
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}
