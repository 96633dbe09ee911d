//! Manifest to model conversion.
//!
//! Turns raw project manifests into the resolved Project/Target model.
//! Conversion of distinct projects is independent, so the fan-out runs on
//! the rayon pool; results recombine keyed by path, never by completion
//! order.

use std::path::Path;

use miette::Diagnostic;
use rayon::prelude::*;
use thiserror::Error;

use crate::core::dependency::TargetDependency;
use crate::core::manifest::{
    DependencyManifest, ManifestSet, ProjectManifest, SchemeManifest, TargetManifest,
    WorkspaceManifest,
};
use crate::core::project::{Project, ProjectOptions};
use crate::core::target::Target;
use crate::core::workspace::{Scheme, Workspace};
use crate::external::graph::ExternalDependenciesGraph;
use crate::util::fs::{normalize_path, source_files};

/// A dependency reference that does not resolve to any known target or
/// external product.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("target `{target}` in project `{project}` references unknown dependency `{reference}`")]
#[diagnostic(
    code(gantry::convert::unresolved_dependency),
    help("Declare the product in Package.toml or fix the reference")
)]
pub struct UnresolvedDependency {
    /// Name of the declaring project
    pub project: String,

    /// Name of the declaring target
    pub target: String,

    /// The unresolved reference
    pub reference: String,
}

/// Error converting a manifest to the model.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Unresolved(#[from] UnresolvedDependency),

    #[error("failed to resolve sources of target `{target}` in project `{project}`: {message}")]
    Sources {
        project: String,
        target: String,
        message: String,
    },
}

/// Converts raw manifests into the resolved model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestModelConverter;

impl ManifestModelConverter {
    /// Create a converter.
    pub fn new() -> Self {
        ManifestModelConverter
    }

    /// Convert the workspace manifest.
    pub fn convert_workspace(&self, set: &ManifestSet) -> Workspace {
        Workspace {
            path: set.path.clone(),
            name: set.workspace.name.clone(),
            project_paths: set.projects.keys().cloned().collect(),
            schemes: set.workspace.schemes.iter().map(convert_scheme).collect(),
        }
    }

    /// Convert every project of the manifest set concurrently.
    ///
    /// Output order follows the manifest set, independent of scheduling.
    pub fn convert_projects(
        &self,
        set: &ManifestSet,
        external: &ExternalDependenciesGraph,
    ) -> Result<Vec<Project>, ConvertError> {
        // Indexed fan-out over the sorted entries keeps the output order
        // that of the manifest set regardless of scheduling.
        let entries: Vec<_> = set.projects.iter().collect();
        entries
            .into_par_iter()
            .map(|(path, manifest)| {
                self.convert_project(
                    path,
                    manifest,
                    external,
                    external.projects.contains_key(path),
                )
            })
            .collect()
    }

    /// Convert a single project manifest.
    pub fn convert_project(
        &self,
        path: &Path,
        manifest: &ProjectManifest,
        external: &ExternalDependenciesGraph,
        is_external: bool,
    ) -> Result<Project, ConvertError> {
        let targets = manifest
            .targets
            .iter()
            .map(|target| self.convert_target(path, manifest, target, external))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Project {
            path: path.to_path_buf(),
            name: manifest.name.clone(),
            options: ProjectOptions::from(manifest.options.clone()),
            targets,
            is_external,
        })
    }

    fn convert_target(
        &self,
        project_path: &Path,
        project: &ProjectManifest,
        manifest: &TargetManifest,
        external: &ExternalDependenciesGraph,
    ) -> Result<Target, ConvertError> {
        let sources =
            source_files(project_path, &manifest.sources).map_err(|e| ConvertError::Sources {
                project: project.name.clone(),
                target: manifest.name.clone(),
                message: e.to_string(),
            })?;

        let mut dependencies = Vec::new();
        for dependency in &manifest.dependencies {
            self.convert_dependency(
                project_path,
                &project.name,
                &manifest.name,
                dependency,
                external,
                &mut dependencies,
            )?;
        }

        Ok(Target {
            name: manifest.name.clone(),
            product: manifest.product,
            product_name: manifest
                .product_name
                .clone()
                .unwrap_or_else(|| manifest.name.clone()),
            destinations: manifest.destinations.clone(),
            sources,
            settings: manifest.settings.clone(),
            dependencies,
            test_host: manifest.test_host.clone(),
        })
    }

    fn convert_dependency(
        &self,
        project_path: &Path,
        project_name: &str,
        target_name: &str,
        dependency: &DependencyManifest,
        external: &ExternalDependenciesGraph,
        out: &mut Vec<TargetDependency>,
    ) -> Result<(), UnresolvedDependency> {
        match dependency {
            DependencyManifest::Target { target } => {
                out.push(TargetDependency::target(target.clone()));
            }
            DependencyManifest::Project { project, target } => {
                out.push(TargetDependency::project(
                    target.clone(),
                    normalize_path(&project_path.join(project)),
                ));
            }
            DependencyManifest::External { external: name } => {
                let Some(edges) = external.dependencies.get(name) else {
                    return Err(UnresolvedDependency {
                        project: project_name.to_string(),
                        target: target_name.to_string(),
                        reference: name.clone(),
                    });
                };
                // One level of table expansion only; an External entry in
                // the table is a prebuilt leaf, not a further reference.
                for edge in edges {
                    match edge {
                        DependencyManifest::Target { target } => {
                            out.push(TargetDependency::target(target.clone()));
                        }
                        DependencyManifest::Project { project, target } => {
                            out.push(TargetDependency::project(
                                target.clone(),
                                normalize_path(&project_path.join(project)),
                            ));
                        }
                        DependencyManifest::External { external } => {
                            out.push(TargetDependency::external_product(external.clone()));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn convert_scheme(manifest: &SchemeManifest) -> Scheme {
    Scheme {
        name: manifest.name.clone(),
        build_targets: manifest.build_targets.clone(),
        test_targets: manifest.test_targets.clone(),
    }
}

/// Convert the workspace manifest alone, for callers without a full set.
pub fn convert_workspace_manifest(manifest: &WorkspaceManifest, path: &Path) -> Workspace {
    Workspace {
        path: path.to_path_buf(),
        name: manifest.name.clone(),
        project_paths: Vec::new(),
        schemes: manifest.schemes.iter().map(convert_scheme).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::ProjectOptionsManifest;
    use crate::core::target::ProductKind;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn project_manifest(name: &str, targets: Vec<TargetManifest>) -> ProjectManifest {
        ProjectManifest {
            name: name.to_string(),
            options: ProjectOptionsManifest::default(),
            uses: Vec::new(),
            targets,
            schemes: Vec::new(),
        }
    }

    fn target_manifest(name: &str, dependencies: Vec<DependencyManifest>) -> TargetManifest {
        TargetManifest {
            name: name.to_string(),
            product: ProductKind::Framework,
            product_name: None,
            destinations: Vec::new(),
            sources: Vec::new(),
            settings: BTreeMap::new(),
            dependencies,
            test_host: None,
        }
    }

    #[test]
    fn test_cross_project_reference_normalizes_path() {
        let manifest = project_manifest(
            "App",
            vec![target_manifest(
                "App",
                vec![DependencyManifest::Project {
                    project: "../Lib".into(),
                    target: "Lib".into(),
                }],
            )],
        );

        let project = ManifestModelConverter::new()
            .convert_project(
                Path::new("/ws/App"),
                &manifest,
                &ExternalDependenciesGraph::none(),
                false,
            )
            .unwrap();

        assert_eq!(
            project.targets[0].dependencies,
            vec![TargetDependency::project("Lib", "/ws/Lib")]
        );
    }

    #[test]
    fn test_external_reference_resolves_through_table() {
        let mut external = ExternalDependenciesGraph::none();
        external.dependencies.insert(
            "Stream".into(),
            vec![
                DependencyManifest::Project {
                    project: "/ws/.checkouts/Stream".into(),
                    target: "StreamCore".into(),
                },
                DependencyManifest::External {
                    external: "StreamBinary".into(),
                },
            ],
        );

        let manifest = project_manifest(
            "App",
            vec![target_manifest(
                "App",
                vec![DependencyManifest::External {
                    external: "Stream".into(),
                }],
            )],
        );

        let project = ManifestModelConverter::new()
            .convert_project(Path::new("/ws/App"), &manifest, &external, false)
            .unwrap();

        assert_eq!(
            project.targets[0].dependencies,
            vec![
                TargetDependency::project("StreamCore", "/ws/.checkouts/Stream"),
                TargetDependency::external_product("StreamBinary"),
            ]
        );
    }

    #[test]
    fn test_undeclared_external_reference_fails() {
        let manifest = project_manifest(
            "App",
            vec![target_manifest(
                "App",
                vec![DependencyManifest::External {
                    external: "Unknown".into(),
                }],
            )],
        );

        let err = ManifestModelConverter::new()
            .convert_project(
                Path::new("/ws/App"),
                &manifest,
                &ExternalDependenciesGraph::none(),
                false,
            )
            .unwrap_err();

        match err {
            ConvertError::Unresolved(unresolved) => {
                assert_eq!(unresolved.target, "App");
                assert_eq!(unresolved.reference, "Unknown");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parallel_conversion_is_keyed_by_path() {
        let mut projects = BTreeMap::new();
        for name in ["Alpha", "Beta", "Gamma", "Delta"] {
            projects.insert(
                PathBuf::from(format!("/ws/{name}")),
                project_manifest(name, vec![target_manifest(name, Vec::new())]),
            );
        }
        let set = ManifestSet {
            path: "/ws".into(),
            workspace: WorkspaceManifest {
                name: "ws".into(),
                projects: Vec::new(),
                schemes: Vec::new(),
            },
            projects,
        };

        let converted = ManifestModelConverter::new()
            .convert_projects(&set, &ExternalDependenciesGraph::none())
            .unwrap();

        let names: Vec<&str> = converted.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Delta", "Gamma"]);
    }
}
