//! Import drift detection.
//!
//! Compares the imports statically observed in a target's sources against
//! the dependencies its manifest declares, over the assembled graph. Runs
//! as a read-only analysis pass after resolution; the two modes are
//! independent runs, never combined into one report.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;

use crate::core::dependency::TargetDependency;
use crate::core::graph::Graph;
use crate::core::target::Target;

/// Which direction of drift to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectType {
    /// Dependencies declared but never imported from source.
    Redundant,

    /// Imports used in source but not declared as dependencies.
    Implicit,
}

impl fmt::Display for InspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectType::Redundant => write!(f, "redundant"),
            InspectType::Implicit => write!(f, "implicit"),
        }
    }
}

/// Drift found for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIssue {
    /// Directory of the owning project
    pub project: PathBuf,

    /// Target name
    pub target: String,

    /// The flagged module names
    pub imports: BTreeSet<String>,
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.imports.iter().map(String::as_str).collect();
        write!(f, "{}: {}", self.target, names.join(", "))
    }
}

/// Error inspecting target imports.
///
/// The found-drift variants aggregate every offending target in a single
/// error, one per run mode.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum InspectImportsError {
    #[error("failed to scan imports of target `{target}`: {message}")]
    #[diagnostic(code(gantry::lint::imports::scan))]
    Scan { target: String, message: String },

    #[error("redundant dependencies found:\n{}", format_issues(.issues))]
    #[diagnostic(
        code(gantry::lint::imports::redundant),
        help("Remove the listed dependencies or import them from source")
    )]
    RedundantImportsFound { issues: Vec<ImportIssue> },

    #[error("implicit imports found:\n{}", format_issues(.issues))]
    #[diagnostic(
        code(gantry::lint::imports::implicit),
        help("Declare the listed modules as dependencies of the importing target")
    )]
    ImplicitImportsFound { issues: Vec<ImportIssue> },
}

fn format_issues(issues: &[ImportIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!(" - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Produces the set of module names statically imported by a target's
/// sources. Must be deterministic for a given source tree snapshot.
pub trait TargetImportsScanning: Send + Sync {
    /// Scan the target's sources, returning imported module names in order
    /// of first occurrence.
    fn imports(&self, target: &Target) -> anyhow::Result<Vec<String>>;
}

/// The default scanner: matches `import Name` statements with a regex.
///
/// Platform-scoped source variants are scanned merged into one set per
/// target, not per platform.
#[derive(Debug)]
pub struct RegexImportsScanner {
    pattern: Regex,
}

impl RegexImportsScanner {
    /// Create a scanner with the default import pattern.
    pub fn new() -> Self {
        RegexImportsScanner {
            pattern: Regex::new(r"(?m)^\s*(?:@testable\s+)?import\s+([A-Za-z_][A-Za-z0-9_]*)")
                .unwrap(),
        }
    }
}

impl Default for RegexImportsScanner {
    fn default() -> Self {
        RegexImportsScanner::new()
    }
}

impl TargetImportsScanning for RegexImportsScanner {
    fn imports(&self, target: &Target) -> anyhow::Result<Vec<String>> {
        let mut seen = BTreeSet::new();
        let mut imports = Vec::new();

        // Sources are sorted at conversion, so occurrence order is stable.
        for source in &target.sources {
            let content = crate::util::fs::read_to_string(source)?;
            for capture in self.pattern.captures_iter(&content) {
                let name = capture[1].to_string();
                if seen.insert(name.clone()) {
                    imports.push(name);
                }
            }
        }

        Ok(imports)
    }
}

/// Compares declared dependencies against observed source imports.
pub struct ImportsLinter {
    scanner: Box<dyn TargetImportsScanning>,
}

impl ImportsLinter {
    /// Create a linter with the given scanner.
    pub fn new(scanner: Box<dyn TargetImportsScanning>) -> Self {
        ImportsLinter { scanner }
    }

    /// Fail if any target drifts in the inspected direction.
    ///
    /// A non-empty drift map surfaces as one aggregate error listing every
    /// offending target.
    pub fn lint(&self, graph: &Graph, mode: InspectType) -> Result<(), InspectImportsError> {
        let issues = self.drift(graph, mode)?;
        if issues.is_empty() {
            return Ok(());
        }

        Err(match mode {
            InspectType::Redundant => InspectImportsError::RedundantImportsFound { issues },
            InspectType::Implicit => InspectImportsError::ImplicitImportsFound { issues },
        })
    }

    /// Compute the per-target drift in the inspected direction.
    ///
    /// Targets with an empty resulting set are omitted. Scanning of
    /// distinct targets fans out on the rayon pool; results recombine in
    /// graph order, not completion order.
    pub fn drift(
        &self,
        graph: &Graph,
        mode: InspectType,
    ) -> Result<Vec<ImportIssue>, InspectImportsError> {
        // References outside the graph are system or SDK modules, never
        // drift findings.
        let known_products = graph_product_names(graph);

        let targets: Vec<_> = graph.targets().collect();
        targets
            .into_par_iter()
            .map(|(project, target)| {
                let observed: BTreeSet<String> = self
                    .scanner
                    .imports(target)
                    .map_err(|e| InspectImportsError::Scan {
                        target: target.name.clone(),
                        message: e.to_string(),
                    })?
                    .into_iter()
                    .collect();
                let declared = declared_product_names(graph, &project.path, target, mode);

                let drift: BTreeSet<String> = match mode {
                    InspectType::Redundant => &declared - &observed,
                    InspectType::Implicit => &observed - &declared,
                };
                let drift: BTreeSet<String> =
                    drift.intersection(&known_products).cloned().collect();

                Ok((!drift.is_empty()).then(|| ImportIssue {
                    project: project.path.clone(),
                    target: target.name.clone(),
                    imports: drift,
                }))
            })
            .filter_map(|result| match result {
                Ok(Some(issue)) => Some(Ok(issue)),
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            })
            .collect()
    }
}

/// Product names of every target and external product in the graph.
fn graph_product_names(graph: &Graph) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = graph
        .targets()
        .map(|(_, target)| target.product_name.clone())
        .collect();
    names.extend(graph.external_products());
    names
}

/// Product names of a target's direct declared dependencies.
///
/// Bundle products are excluded in redundant mode: a resource bundle is
/// legitimately depended on without ever being imported.
fn declared_product_names(
    graph: &Graph,
    project_path: &std::path::Path,
    target: &Target,
    mode: InspectType,
) -> BTreeSet<String> {
    target
        .dependencies
        .iter()
        .filter_map(|dependency| {
            let (path, name) = match dependency {
                TargetDependency::Target { name } => (project_path, name.as_str()),
                TargetDependency::Project { target, path } => (path.as_path(), target.as_str()),
                TargetDependency::ExternalProduct { product } => return Some(product.clone()),
            };
            let resolved = graph.target(path, name)?;
            if mode == InspectType::Redundant && resolved.product.is_bundle() {
                return None;
            }
            Some(resolved.product_name.clone())
        })
        .collect()
}
