//! External package resolution boundary.
//!
//! Resolution itself belongs to the external package manager; the engine
//! consumes its output through the `PackageResolving` trait. The default
//! implementation reads the JSON lockfile the package manager emits next
//! to the package manifest.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use thiserror::Error;

use crate::core::settings::PackageSettings;
use crate::core::target::ProductKind;

/// File name of the emitted external dependency lockfile.
pub const LOCKFILE_NAME: &str = "gantry.lock.json";

/// Error resolving the external package graph.
#[derive(Debug, Error)]
pub enum PackageResolveError {
    #[error("external dependency lockfile not found at `{}`; run the package manager first", .path.display())]
    LockfileMissing { path: PathBuf },

    #[error("failed to read lockfile `{}`: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to parse lockfile `{}`: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// A target of an externally resolved package.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExternalTarget {
    /// Target name
    pub name: String,

    /// Product kind; test targets are marked `unit_tests`
    #[serde(default)]
    pub product: ProductKind,

    /// Source patterns relative to the package checkout
    #[serde(default)]
    pub sources: Vec<String>,

    /// Names of targets or products this target depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// A product vended by an externally resolved package.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExternalProduct {
    /// Product name
    pub name: String,

    /// Targets composing the product
    pub targets: Vec<String>,
}

/// One externally resolved package.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExternalPackage {
    /// Package name
    pub name: String,

    /// Resolved version
    pub version: Version,

    /// Checkout directory, relative to the package manifest directory
    pub path: PathBuf,

    /// Whether this is a local (path-based) package
    #[serde(default)]
    pub local: bool,

    /// Vended products
    #[serde(default)]
    pub products: Vec<RawExternalProduct>,

    /// Prebuilt products with no backing targets
    #[serde(default)]
    pub artifacts: Vec<String>,

    /// Targets of the package
    #[serde(default)]
    pub targets: Vec<RawExternalTarget>,
}

/// The raw, package-manager-shaped external dependency graph.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExternalDependenciesGraph {
    /// Toolchain version the lockfile was produced with
    #[serde(default)]
    pub toolchain_version: Option<Version>,

    /// Resolved packages
    #[serde(default)]
    pub packages: Vec<RawExternalPackage>,
}

/// Resolves a package manifest into the raw external dependency graph.
pub trait PackageResolving: Send + Sync {
    /// Resolve the package at the given directory with the given settings.
    fn resolve(
        &self,
        package_path: &Path,
        settings: &PackageSettings,
    ) -> Result<RawExternalDependenciesGraph, PackageResolveError>;
}

/// The default resolver: parses the package manager's emitted lockfile.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockfilePackageResolver;

impl LockfilePackageResolver {
    /// Create a lockfile resolver.
    pub fn new() -> Self {
        LockfilePackageResolver
    }
}

impl PackageResolving for LockfilePackageResolver {
    fn resolve(
        &self,
        package_path: &Path,
        settings: &PackageSettings,
    ) -> Result<RawExternalDependenciesGraph, PackageResolveError> {
        let path = package_path.join(LOCKFILE_NAME);
        if !path.is_file() {
            return Err(PackageResolveError::LockfileMissing { path });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| PackageResolveError::Read {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let graph: RawExternalDependenciesGraph =
            serde_json::from_str(&content).map_err(|e| PackageResolveError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        if let Some(locked) = &graph.toolchain_version {
            if locked > &settings.toolchain_version {
                tracing::warn!(
                    locked = %locked,
                    declared = %settings.toolchain_version,
                    "lockfile was produced with a newer toolchain than declared"
                );
            }
        }

        tracing::debug!(packages = graph.packages.len(), "resolved external packages");
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn settings() -> PackageSettings {
        PackageSettings {
            product_types: BTreeMap::new(),
            product_destinations: BTreeMap::new(),
            base_settings: BTreeMap::new(),
            target_settings: BTreeMap::new(),
            project_options: BTreeMap::new(),
            include_local_package_test_targets: false,
            toolchain_version: Version::new(1, 0, 0),
        }
    }

    #[test]
    fn test_missing_lockfile() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            LockfilePackageResolver::new().resolve(tmp.path(), &settings()),
            Err(PackageResolveError::LockfileMissing { .. })
        ));
    }

    #[test]
    fn test_parses_lockfile() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(LOCKFILE_NAME),
            r#"{
                "toolchain_version": "1.0.0",
                "packages": [
                    {
                        "name": "Stream",
                        "version": "4.1.0",
                        "path": "checkouts/Stream",
                        "products": [{ "name": "Stream", "targets": ["StreamCore"] }],
                        "targets": [
                            { "name": "StreamCore", "product": "static_library", "sources": ["Sources"] }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        let graph = LockfilePackageResolver::new()
            .resolve(tmp.path(), &settings())
            .unwrap();
        assert_eq!(graph.packages.len(), 1);
        assert_eq!(graph.packages[0].name, "Stream");
        assert_eq!(graph.packages[0].targets[0].product, ProductKind::StaticLibrary);
    }
}
