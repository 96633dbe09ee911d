//! Recursive manifest discovery.
//!
//! Starting from the workspace's declared projects, chases every
//! cross-project dependency reference until the manifest set is closed.
//! A bare project root synthesizes a one-project workspace; a package-only
//! root synthesizes an empty one.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use crate::core::manifest::{DependencyManifest, ManifestSet, WorkspaceManifest};
use crate::manifests::evaluator::{EvaluationError, PROJECT_MANIFEST, WORKSPACE_MANIFEST};
use crate::manifests::loader::CachedManifestLoader;
use crate::manifests::locator::{ManifestFilesLocator, RootManifest, RootManifestKind};
use crate::util::fs::normalize_path;

/// Loads every manifest reachable from a root.
pub struct RecursiveManifestLoader {
    loader: Arc<CachedManifestLoader>,
    locator: ManifestFilesLocator,
}

impl RecursiveManifestLoader {
    /// Create a recursive loader.
    pub fn new(loader: Arc<CachedManifestLoader>) -> Self {
        RecursiveManifestLoader {
            loader,
            locator: ManifestFilesLocator::new(),
        }
    }

    /// Load the complete manifest set rooted at the given root manifest.
    pub fn load_workspace(&self, root: &RootManifest) -> Result<ManifestSet, EvaluationError> {
        let workspace = match root.kind {
            RootManifestKind::Workspace => self
                .loader
                .load_workspace(&root.path.join(WORKSPACE_MANIFEST))?,
            RootManifestKind::Project => {
                let project = self
                    .loader
                    .load_project(&root.path.join(PROJECT_MANIFEST))?;
                tracing::debug!(
                    project = %project.name,
                    "no workspace manifest, synthesizing one from the project"
                );
                WorkspaceManifest {
                    name: project.name.clone(),
                    projects: vec![".".to_string()],
                    schemes: Vec::new(),
                }
            }
            RootManifestKind::Package => {
                let name = root
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "Workspace".to_string());
                WorkspaceManifest {
                    name,
                    projects: Vec::new(),
                    schemes: Vec::new(),
                }
            }
        };

        let mut set = ManifestSet {
            path: root.path.clone(),
            workspace,
            projects: Default::default(),
        };

        let mut queue: VecDeque<_> = self
            .locator
            .expand_project_patterns(&root.path, &set.workspace.projects)?
            .into_iter()
            .collect();

        while let Some(dir) = queue.pop_front() {
            if set.projects.contains_key(&dir) {
                continue;
            }

            let manifest = self.loader.load_project(&dir.join(PROJECT_MANIFEST))?;
            for referenced in referenced_projects(&dir, &manifest) {
                if !set.projects.contains_key(&referenced) {
                    queue.push_back(referenced);
                }
            }
            set.projects.insert(dir, manifest);
        }

        tracing::debug!(
            workspace = %set.workspace.name,
            projects = set.projects.len(),
            "manifest discovery complete"
        );
        Ok(set)
    }
}

/// Directories referenced by a project's cross-project dependencies.
fn referenced_projects(
    dir: &Path,
    manifest: &crate::core::manifest::ProjectManifest,
) -> Vec<std::path::PathBuf> {
    manifest
        .targets
        .iter()
        .flat_map(|t| &t.dependencies)
        .filter_map(|dep| match dep {
            DependencyManifest::Project { project, .. } => {
                Some(normalize_path(&dir.join(project)))
            }
            _ => None,
        })
        .collect()
}
