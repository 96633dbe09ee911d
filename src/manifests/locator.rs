//! Locating manifest files on disk.

use std::path::{Path, PathBuf};

use glob::glob;
use miette::Diagnostic;
use thiserror::Error;

use crate::manifests::evaluator::{
    EvaluationError, PACKAGE_MANIFEST, PROJECT_MANIFEST, WORKSPACE_MANIFEST,
};
use crate::util::fs::normalize_path;

/// File name of the tool configuration.
pub const CONFIG_FILE: &str = "Gantry.toml";

/// No workspace or project manifest exists at or above the requested path.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("no workspace or project manifest found at or above `{}`", .path.display())]
#[diagnostic(
    code(gantry::manifests::missing_root),
    help("Create a Workspace.toml or Project.toml at the root of your project")
)]
pub struct MissingRootManifest {
    /// The requested path
    pub path: PathBuf,
}

/// The kind of manifest a resolution run is rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootManifestKind {
    /// Rooted at a workspace manifest
    Workspace,

    /// Rooted at a bare project manifest
    Project,

    /// Rooted at a package manifest only (package-only checkout)
    Package,
}

/// The directory a resolution run is rooted at, and what was found there.
#[derive(Debug, Clone)]
pub struct RootManifest {
    /// Root directory
    pub path: PathBuf,

    /// What kind of manifest roots the run
    pub kind: RootManifestKind,
}

/// Locates manifest files for the resolution engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestFilesLocator;

impl ManifestFilesLocator {
    /// Create a new locator.
    pub fn new() -> Self {
        ManifestFilesLocator
    }

    /// Find the root manifest at or above the given path.
    ///
    /// Per directory, a workspace manifest wins over a project manifest,
    /// which wins over a bare package manifest.
    pub fn locate_root(&self, path: &Path) -> Result<RootManifest, MissingRootManifest> {
        for dir in path.ancestors() {
            let kind = if dir.join(WORKSPACE_MANIFEST).is_file() {
                Some(RootManifestKind::Workspace)
            } else if dir.join(PROJECT_MANIFEST).is_file() {
                Some(RootManifestKind::Project)
            } else if dir.join(PACKAGE_MANIFEST).is_file() {
                Some(RootManifestKind::Package)
            } else {
                None
            };

            if let Some(kind) = kind {
                return Ok(RootManifest {
                    path: dir.to_path_buf(),
                    kind,
                });
            }
        }

        Err(MissingRootManifest {
            path: path.to_path_buf(),
        })
    }

    /// Find the package manifest of a root directory, if any.
    pub fn locate_package_manifest(&self, root: &Path) -> Option<PathBuf> {
        let path = root.join(PACKAGE_MANIFEST);
        path.is_file().then_some(path)
    }

    /// Find the tool configuration of a root directory, if any.
    pub fn locate_config(&self, root: &Path) -> Option<PathBuf> {
        let path = root.join(CONFIG_FILE);
        path.is_file().then_some(path)
    }

    /// Expand workspace project patterns into the sorted list of project
    /// directories that contain a project manifest.
    pub fn expand_project_patterns(
        &self,
        root: &Path,
        patterns: &[String],
    ) -> Result<Vec<PathBuf>, EvaluationError> {
        let mut dirs = Vec::new();

        for pattern in patterns {
            if pattern.contains(['*', '?', '[']) {
                let full = root.join(pattern);
                let entries =
                    glob(&full.to_string_lossy()).map_err(|e| EvaluationError::Pattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?;
                for entry in entries {
                    match entry {
                        Ok(dir) if dir.join(PROJECT_MANIFEST).is_file() => dirs.push(dir),
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!("glob error: {}", e);
                        }
                    }
                }
            } else {
                let dir = normalize_path(&root.join(pattern));
                if dir.join(PROJECT_MANIFEST).is_file() {
                    dirs.push(dir);
                }
            }
        }

        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }
}
