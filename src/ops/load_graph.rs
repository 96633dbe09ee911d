//! The resolution run.
//!
//! `ManifestGraphLoader` drives one full resolution: root check, plugin
//! registration, recursive discovery, external dependency resolution and
//! merge, structural lint, parallel conversion, cycle lint, the mapper
//! pipeline, and graph assembly. All collaborators are injected at
//! construction; the result is an explicit value, not ambient state.

use std::path::Path;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigLoader;
use crate::convert::{ConvertError, ManifestModelConverter, UnresolvedDependency};
use crate::core::graph::Graph;
use crate::core::manifest::ManifestSet;
use crate::core::workspace::WorkspaceWithProjects;
use crate::external::graph::ExternalDependenciesGraph;
use crate::external::resolver::{LockfilePackageResolver, PackageResolveError, PackageResolving};
use crate::external::settings::PackageSettingsLoader;
use crate::lint::cycles::{CircularDependency, CircularDependencyLinter};
use crate::lint::manifest::ManifestLinter;
use crate::lint::{check_issues, LintingIssue, StructuralLintError};
use crate::loader::GraphLoader;
use crate::manifests::evaluator::{EvaluationError, ManifestEvaluating, TomlEvaluator};
use crate::manifests::loader::CachedManifestLoader;
use crate::manifests::locator::{ManifestFilesLocator, MissingRootManifest};
use crate::manifests::recursive::RecursiveManifestLoader;
use crate::mappers::{
    DerivedSettingsMapper, GraphFingerprintMapper, GraphMapping, MapperEnvironment, MapperError,
    ModelMapping, SequentialGraphMapper, SequentialModelMapper, SideEffectDescriptor,
};
use crate::plugins::{PluginError, PluginService};
use crate::util::diagnostic::Diagnostic as TerminalDiagnostic;

/// Error of a resolution run.
///
/// Fail-fast everywhere except the aggregating linters, which raise one
/// error carrying every offender.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    MissingRootManifest(#[from] MissingRootManifest),

    #[error(transparent)]
    #[diagnostic(code(gantry::load::evaluation))]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    #[diagnostic(code(gantry::load::package_resolve))]
    PackageResolve(#[from] PackageResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    UnresolvedDependency(#[from] UnresolvedDependency),

    #[error("failed to resolve target sources: {0}")]
    #[diagnostic(code(gantry::load::sources))]
    Sources(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    StructuralLint(#[from] StructuralLintError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    CircularDependency(#[from] CircularDependency),

    #[error(transparent)]
    #[diagnostic(code(gantry::load::mapper))]
    Mapper(#[from] MapperError),
}

impl From<ConvertError> for LoadError {
    fn from(error: ConvertError) -> Self {
        match error {
            ConvertError::Unresolved(unresolved) => LoadError::UnresolvedDependency(unresolved),
            other => LoadError::Sources(other.to_string()),
        }
    }
}

impl LoadError {
    /// Render this error for terminal output.
    ///
    /// Aggregate failures enumerate every offending entity, one context
    /// line each, never truncated to the first occurrence.
    pub fn to_diagnostic(&self) -> TerminalDiagnostic {
        use crate::util::diagnostic::suggestions;

        match self {
            LoadError::MissingRootManifest(error) => TerminalDiagnostic::error(error.to_string())
                .with_location(error.path.clone())
                .with_suggestion(suggestions::NO_ROOT_MANIFEST),
            LoadError::Plugin(error) => {
                TerminalDiagnostic::error(error.to_string()).with_suggestion(suggestions::PLUGIN_NOT_FOUND)
            }
            LoadError::UnresolvedDependency(error) => TerminalDiagnostic::error(error.to_string())
                .with_suggestion(suggestions::UNRESOLVED_DEPENDENCY),
            LoadError::CircularDependency(error) => {
                let mut diagnostic = TerminalDiagnostic::error("circular dependency detected");
                for edge in error.cycle.windows(2) {
                    diagnostic = diagnostic.with_context(format!("{} -> {}", edge[0], edge[1]));
                }
                diagnostic.with_suggestion(suggestions::CYCLE)
            }
            LoadError::StructuralLint(error) => {
                let mut diagnostic = TerminalDiagnostic::error("manifest linting failed");
                for issue in &error.issues {
                    diagnostic = diagnostic.with_context(issue.message.clone());
                }
                diagnostic
            }
            other => TerminalDiagnostic::error(other.to_string()),
        }
    }
}

/// The result of a successful resolution run.
///
/// The graph is the artifact downstream consumers hold on to; side
/// effects are applied by the caller, in order, after a successful run.
#[derive(Debug)]
pub struct LoadedGraph {
    /// The assembled, validated graph
    pub graph: Graph,

    /// Deferred side effects, in emission order
    pub side_effects: Vec<SideEffectDescriptor>,

    /// Environment produced by the graph mapper stages
    pub environment: MapperEnvironment,

    /// Non-fatal lint findings of the run
    pub issues: Vec<LintingIssue>,
}

/// Loads a validated dependency graph from a manifest tree.
pub struct ManifestGraphLoader {
    evaluator: Arc<dyn ManifestEvaluating>,
    manifest_loader: Arc<CachedManifestLoader>,
    locator: ManifestFilesLocator,
    package_resolver: Arc<dyn PackageResolving>,
    converter: ManifestModelConverter,
    manifest_linter: ManifestLinter,
    cycle_linter: CircularDependencyLinter,
    graph_loader: GraphLoader,
    model_mapper: SequentialModelMapper,
    graph_mapper: SequentialGraphMapper,
}

impl Default for ManifestGraphLoader {
    /// The stock loader: TOML evaluation, lockfile-backed package
    /// resolution, and the default mapper pipeline.
    fn default() -> Self {
        ManifestGraphLoader::new(
            Arc::new(TomlEvaluator::new()),
            Arc::new(LockfilePackageResolver::new()),
        )
        .with_model_mappers(vec![Box::new(DerivedSettingsMapper::new())])
        .with_graph_mappers(vec![Box::new(GraphFingerprintMapper::new())])
    }
}

impl ManifestGraphLoader {
    /// Create a loader over the given collaborator boundaries, with an
    /// empty mapper pipeline.
    pub fn new(
        evaluator: Arc<dyn ManifestEvaluating>,
        package_resolver: Arc<dyn PackageResolving>,
    ) -> Self {
        let manifest_loader = Arc::new(CachedManifestLoader::new(evaluator.clone()));
        ManifestGraphLoader {
            evaluator,
            manifest_loader,
            locator: ManifestFilesLocator::new(),
            package_resolver,
            converter: ManifestModelConverter::new(),
            manifest_linter: ManifestLinter::new(),
            cycle_linter: CircularDependencyLinter::new(),
            graph_loader: GraphLoader::new(),
            model_mapper: SequentialModelMapper::default(),
            graph_mapper: SequentialGraphMapper::default(),
        }
    }

    /// Set the model mapper pipeline, applied in the given order.
    pub fn with_model_mappers(mut self, mappers: Vec<Box<dyn ModelMapping>>) -> Self {
        self.model_mapper = SequentialModelMapper::new(mappers);
        self
    }

    /// Set the graph mapper pipeline, applied in the given order.
    pub fn with_graph_mappers(mut self, mappers: Vec<Box<dyn GraphMapping>>) -> Self {
        self.graph_mapper = SequentialGraphMapper::new(mappers);
        self
    }

    /// Run one resolution rooted at or above the given path.
    pub fn load(&self, path: &Path) -> Result<LoadedGraph, LoadError> {
        let root = self.locator.locate_root(path)?;
        tracing::info!(root = %root.path.display(), "loading graph");

        // Plugins must be registered before any workspace or project
        // manifest evaluates.
        let config = ConfigLoader::new().load(&root.path)?;
        let plugins =
            PluginService::new(self.manifest_loader.clone()).load_plugins(&root.path, &config)?;
        self.evaluator.register_plugins(&plugins)?;

        let mut set =
            RecursiveManifestLoader::new(self.manifest_loader.clone()).load_workspace(&root)?;

        let external = self.resolve_external_dependencies(&mut set)?;

        let issues = self.lint_manifests(&set)?;

        let workspace = self.converter.convert_workspace(&set);
        let projects = self.converter.convert_projects(&set, &external)?;

        self.cycle_linter.lint_workspace(&projects)?;

        let (model, model_side_effects) = self.model_mapper.map(WorkspaceWithProjects {
            workspace,
            projects,
        })?;

        let graph = self
            .graph_loader
            .load_workspace(model.workspace, model.projects);

        let (graph, graph_side_effects, environment) = self.graph_mapper.map(graph)?;

        let mut side_effects = model_side_effects;
        side_effects.extend(graph_side_effects);

        tracing::info!(
            targets = graph.targets().count(),
            side_effects = side_effects.len(),
            "graph loaded"
        );
        Ok(LoadedGraph {
            graph,
            side_effects,
            environment,
            issues,
        })
    }

    /// Resolve the external package surface and splice it into the set.
    ///
    /// Short-circuits to the empty graph when there is no package manifest
    /// or no external-dependency signal. A package-only checkout always
    /// includes its local test targets, regardless of configuration.
    fn resolve_external_dependencies(
        &self,
        set: &mut ManifestSet,
    ) -> Result<ExternalDependenciesGraph, LoadError> {
        let Some(manifest_path) = self.locator.locate_package_manifest(&set.path) else {
            return Ok(ExternalDependenciesGraph::none());
        };

        let package_only = set.projects.is_empty();
        if !package_only && !set.contains_external_dependencies() {
            tracing::debug!("no external dependency references, skipping package resolution");
            return Ok(ExternalDependenciesGraph::none());
        }

        let mut settings =
            PackageSettingsLoader::new(self.manifest_loader.clone()).load(&manifest_path)?;
        if package_only {
            // Test targets of a pure package checkout are always part of
            // the generated surface.
            settings.include_local_package_test_targets = true;
        }

        let raw = self.package_resolver.resolve(&set.path, &settings)?;
        let external = ExternalDependenciesGraph::from_raw(raw, &set.path, &settings);
        set.merge_external_projects(&external.projects);

        Ok(external)
    }

    /// Lint every manifest, aborting on aggregated errors and returning
    /// the surviving warnings.
    fn lint_manifests(&self, set: &ManifestSet) -> Result<Vec<LintingIssue>, StructuralLintError> {
        let mut issues = self.manifest_linter.lint_workspace(&set.workspace);
        for manifest in set.projects.values() {
            issues.extend(self.manifest_linter.lint_project(manifest));
        }

        check_issues(&issues)?;
        Ok(issues)
    }
}
