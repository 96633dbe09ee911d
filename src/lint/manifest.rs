//! Structural manifest linting.
//!
//! Stateless, pure functions over raw manifests. Issues are returned as
//! data; aggregation and the abort decision belong to the caller.

use std::collections::BTreeSet;

use crate::core::manifest::{ProjectManifest, SchemeManifest, WorkspaceManifest};
use crate::lint::LintingIssue;

/// Lints raw manifests for structural problems.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLinter;

impl ManifestLinter {
    /// Create a linter.
    pub fn new() -> Self {
        ManifestLinter
    }

    /// Lint a workspace manifest.
    pub fn lint_workspace(&self, manifest: &WorkspaceManifest) -> Vec<LintingIssue> {
        let mut issues = Vec::new();

        if manifest.name.is_empty() {
            issues.push(LintingIssue::error("workspace has an empty name"));
        }
        issues.extend(duplicate_schemes("workspace", &manifest.schemes));

        issues
    }

    /// Lint a project manifest.
    pub fn lint_project(&self, manifest: &ProjectManifest) -> Vec<LintingIssue> {
        let mut issues = Vec::new();

        if manifest.name.is_empty() {
            issues.push(LintingIssue::error("project has an empty name"));
        }

        let mut seen = BTreeSet::new();
        for target in &manifest.targets {
            if !seen.insert(target.name.as_str()) {
                issues.push(LintingIssue::error(format!(
                    "project `{}` declares target `{}` more than once",
                    manifest.name, target.name
                )));
            }
        }

        let target_names: BTreeSet<&str> =
            manifest.targets.iter().map(|t| t.name.as_str()).collect();

        for target in &manifest.targets {
            if let Some(host) = &target.test_host {
                if !target_names.contains(host.as_str()) {
                    issues.push(LintingIssue::error(format!(
                        "target `{}` declares unknown test host `{}`",
                        target.name, host
                    )));
                } else if !target.product.is_tests() {
                    issues.push(LintingIssue::warning(format!(
                        "target `{}` declares a test host but is not a test target",
                        target.name
                    )));
                }
            }

            if target.sources.is_empty() && !target.product.is_bundle() {
                issues.push(LintingIssue::warning(format!(
                    "target `{}` declares no sources",
                    target.name
                )));
            }
        }

        for scheme in &manifest.schemes {
            for referenced in scheme.build_targets.iter().chain(&scheme.test_targets) {
                if !target_names.contains(referenced.as_str()) {
                    issues.push(LintingIssue::error(format!(
                        "scheme `{}` in project `{}` references unknown target `{}`",
                        scheme.name, manifest.name, referenced
                    )));
                }
            }
        }
        issues.extend(duplicate_schemes(&manifest.name, &manifest.schemes));

        issues
    }
}

fn duplicate_schemes(owner: &str, schemes: &[SchemeManifest]) -> Vec<LintingIssue> {
    let mut seen = BTreeSet::new();
    schemes
        .iter()
        .filter(|s| !seen.insert(s.name.as_str()))
        .map(|s| {
            LintingIssue::warning(format!(
                "`{}` declares scheme `{}` more than once",
                owner, s.name
            ))
        })
        .collect()
}
