//! The normalized external dependency graph.
//!
//! Raw package-manager output is normalized into synthesized project
//! manifests (spliced into the manifest set) plus a product table the model
//! converter uses to resolve external references.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::manifest::{
    DependencyManifest, ProjectManifest, ProjectOptionsManifest, TargetManifest,
};
use crate::core::settings::PackageSettings;
use crate::external::resolver::RawExternalDependenciesGraph;
use crate::util::fs::normalize_path;

/// Externally resolved packages, normalized for the engine.
#[derive(Debug, Clone, Default)]
pub struct ExternalDependenciesGraph {
    /// Synthesized project manifests keyed by checkout directory
    pub projects: BTreeMap<PathBuf, ProjectManifest>,

    /// Product name to the dependency edges it resolves to
    pub dependencies: BTreeMap<String, Vec<DependencyManifest>>,
}

impl ExternalDependenciesGraph {
    /// The empty graph, used when no package manifest exists.
    pub fn none() -> Self {
        ExternalDependenciesGraph::default()
    }

    /// Check if this is the empty graph.
    pub fn is_none(&self) -> bool {
        self.projects.is_empty() && self.dependencies.is_empty()
    }

    /// Normalize a raw graph resolved for the package directory.
    ///
    /// Test targets are kept only for local packages, and only when the
    /// settings include local package test targets. Product type,
    /// destination, and build-setting overrides from the settings apply to
    /// every synthesized target.
    pub fn from_raw(
        raw: RawExternalDependenciesGraph,
        package_dir: &Path,
        settings: &PackageSettings,
    ) -> Self {
        let mut graph = ExternalDependenciesGraph::default();

        for package in &raw.packages {
            let project_dir = normalize_path(&package_dir.join(&package.path));
            let local_target_names: Vec<&str> =
                package.targets.iter().map(|t| t.name.as_str()).collect();

            for product in &package.products {
                let edges = product
                    .targets
                    .iter()
                    .map(|target| DependencyManifest::Project {
                        project: project_dir.clone(),
                        target: target.clone(),
                    })
                    .collect();
                if graph.dependencies.insert(product.name.clone(), edges).is_some() {
                    tracing::warn!(
                        product = %product.name,
                        package = %package.name,
                        "duplicate external product, keeping the last definition"
                    );
                }
            }

            // Prebuilt artifacts resolve to external-product leaf edges.
            for artifact in &package.artifacts {
                graph.dependencies.insert(
                    artifact.clone(),
                    vec![DependencyManifest::External {
                        external: artifact.clone(),
                    }],
                );
            }

            let targets = package
                .targets
                .iter()
                .filter(|target| {
                    !target.product.is_tests()
                        || (package.local && settings.include_local_package_test_targets)
                })
                .map(|target| {
                    let product = settings
                        .product_types
                        .get(&target.name)
                        .copied()
                        .unwrap_or(target.product);
                    TargetManifest {
                        name: target.name.clone(),
                        product,
                        product_name: None,
                        destinations: settings
                            .product_destinations
                            .get(&target.name)
                            .cloned()
                            .unwrap_or_default(),
                        sources: target.sources.clone(),
                        settings: settings.settings_for_target(&target.name),
                        dependencies: target
                            .dependencies
                            .iter()
                            .map(|name| {
                                if local_target_names.contains(&name.as_str()) {
                                    DependencyManifest::Target {
                                        target: name.clone(),
                                    }
                                } else {
                                    DependencyManifest::External {
                                        external: name.clone(),
                                    }
                                }
                            })
                            .collect(),
                        test_host: None,
                    }
                })
                .collect();

            let options = settings
                .project_options
                .get(&package.name)
                .map(ProjectOptionsManifest::from)
                .unwrap_or_default();

            graph.projects.insert(
                project_dir,
                ProjectManifest {
                    name: package.name.clone(),
                    options,
                    uses: Vec::new(),
                    targets,
                    schemes: Vec::new(),
                },
            );
        }

        graph
    }
}
