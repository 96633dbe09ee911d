//! Raw manifest schema and the manifest set.
//!
//! Manifests are declarative descriptions evaluated by an external evaluator
//! into the closed tagged union below. They are immutable once loaded and
//! opaque to the engine except for the dependency references they expose.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::core::target::ProductKind;

/// A raw manifest value as returned by the evaluator.
///
/// The engine never handles untyped evaluator output; every manifest file
/// evaluates to exactly one of these variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RawManifest {
    Workspace(WorkspaceManifest),
    Project(ProjectManifest),
    Plugin(PluginManifest),
    Package(PackageManifest),
}

impl RawManifest {
    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RawManifest::Workspace(_) => "workspace",
            RawManifest::Project(_) => "project",
            RawManifest::Plugin(_) => "plugin",
            RawManifest::Package(_) => "package",
        }
    }
}

/// Declarative description of a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceManifest {
    /// Workspace name
    pub name: String,

    /// Glob patterns selecting the directories of member projects,
    /// relative to the workspace directory
    #[serde(default)]
    pub projects: Vec<String>,

    /// Workspace-level schemes
    #[serde(default)]
    pub schemes: Vec<SchemeManifest>,
}

/// Declarative description of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Project name
    pub name: String,

    /// Project options
    #[serde(default)]
    pub options: ProjectOptionsManifest,

    /// Plugin helpers this manifest relies on; evaluation fails when a
    /// referenced helper is not provided by a registered plugin
    #[serde(default)]
    pub uses: Vec<String>,

    /// Declared targets, in declaration order
    #[serde(default)]
    pub targets: Vec<TargetManifest>,

    /// Project schemes
    #[serde(default)]
    pub schemes: Vec<SchemeManifest>,
}

impl ProjectManifest {
    /// Check whether any target declares an external dependency.
    pub fn contains_external_dependencies(&self) -> bool {
        self.targets
            .iter()
            .any(|t| t.dependencies.iter().any(DependencyManifest::is_external))
    }

    /// Get a declared target by name.
    pub fn target(&self, name: &str) -> Option<&TargetManifest> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// Project options as declared in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectOptionsManifest {
    /// Generate schemes automatically for each target
    #[serde(default = "default_true")]
    pub automatic_schemes: bool,

    /// Development region identifier
    #[serde(default)]
    pub development_region: Option<String>,
}

impl Default for ProjectOptionsManifest {
    fn default() -> Self {
        ProjectOptionsManifest {
            automatic_schemes: true,
            development_region: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A target as declared in a project manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetManifest {
    /// Target name
    pub name: String,

    /// Product kind
    #[serde(default)]
    pub product: ProductKind,

    /// Product name override; defaults to the target name
    #[serde(default)]
    pub product_name: Option<String>,

    /// Destinations (platform tags)
    #[serde(default)]
    pub destinations: Vec<String>,

    /// Source file patterns (globs), relative to the project directory
    #[serde(default)]
    pub sources: Vec<String>,

    /// Build settings
    #[serde(default)]
    pub settings: BTreeMap<String, String>,

    /// Declared dependencies
    #[serde(default)]
    pub dependencies: Vec<DependencyManifest>,

    /// Host target for test bundles
    #[serde(default)]
    pub test_host: Option<String>,
}

/// A declared dependency reference.
///
/// `Project` must stay the first variant: untagged deserialization tries
/// variants in order, and a `{ project, target }` table would otherwise
/// match `Target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyManifest {
    /// A target of another project: `{ project = "../Lib", target = "Lib" }`
    Project {
        /// Path of the referenced project directory, relative to the
        /// declaring project
        project: PathBuf,
        /// Target name inside the referenced project
        target: String,
    },

    /// A target of the same project: `{ target = "Lib" }`
    Target {
        /// Target name
        target: String,
    },

    /// An externally resolved product: `{ external = "Stream" }`
    External {
        /// Product name
        external: String,
    },
}

impl DependencyManifest {
    /// Check if this reference points outside the local manifest set.
    pub fn is_external(&self) -> bool {
        matches!(self, DependencyManifest::External { .. })
    }
}

/// A scheme declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeManifest {
    /// Scheme name
    pub name: String,

    /// Targets built by this scheme
    #[serde(default)]
    pub build_targets: Vec<String>,

    /// Test targets run by this scheme
    #[serde(default)]
    pub test_targets: Vec<String>,
}

/// Declarative description of a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: Option<String>,

    /// Manifest helpers this plugin contributes
    #[serde(default)]
    pub helpers: Vec<String>,
}

/// Declarative description of the external package surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name
    pub name: String,

    /// Declared external-toolchain version
    pub toolchain_version: Version,

    /// Product kind overrides for externally resolved products
    #[serde(default)]
    pub product_types: BTreeMap<String, ProductKind>,

    /// Destination overrides for externally resolved products
    #[serde(default)]
    pub product_destinations: BTreeMap<String, Vec<String>>,

    /// Base build settings applied to every external target
    #[serde(default)]
    pub base_settings: BTreeMap<String, String>,

    /// Per-target build setting overrides
    #[serde(default)]
    pub target_settings: BTreeMap<String, BTreeMap<String, String>>,

    /// Project options per generated external project
    #[serde(default)]
    pub project_options: BTreeMap<String, ProjectOptionsManifest>,

    /// Include test targets of local packages in the generated surface
    #[serde(default)]
    pub include_local_package_test_targets: bool,

    /// Declared external packages
    #[serde(default)]
    pub dependencies: Vec<PackageDependency>,
}

/// One declared external package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDependency {
    /// Package name
    pub name: String,

    /// Version requirement
    pub version: VersionReq,
}

/// The aggregate of one workspace manifest and every project manifest
/// reachable from it.
///
/// Built incrementally during discovery; the load cache guarantees each
/// referenced path is present exactly once. The sorted map fixes the
/// declaration order used by every downstream traversal.
#[derive(Debug, Clone)]
pub struct ManifestSet {
    /// Workspace root directory
    pub path: PathBuf,

    /// The workspace manifest (possibly synthesized from a bare project)
    pub workspace: WorkspaceManifest,

    /// Project manifests keyed by project directory
    pub projects: BTreeMap<PathBuf, ProjectManifest>,
}

impl ManifestSet {
    /// Check whether any project declares external dependencies.
    pub fn contains_external_dependencies(&self) -> bool {
        self.projects
            .values()
            .any(ProjectManifest::contains_external_dependencies)
    }

    /// Splice externally synthesized project manifests into the set.
    ///
    /// Never replaces an existing local manifest at the same path.
    pub fn merge_external_projects(&mut self, projects: &BTreeMap<PathBuf, ProjectManifest>) {
        for (path, manifest) in projects {
            if self.projects.contains_key(path) {
                tracing::debug!(
                    path = %path.display(),
                    "local manifest already present, skipping external project"
                );
                continue;
            }
            self.projects.insert(path.clone(), manifest.clone());
        }
    }

    /// Get a project manifest by directory.
    pub fn project(&self, path: &Path) -> Option<&ProjectManifest> {
        self.projects.get(path)
    }
}
