//! Linting.
//!
//! Linters aggregate issues as pure data; the caller decides whether to
//! abort. Fatal lint errors enumerate every offending entity in a single
//! message, never just the first occurrence.

pub mod cycles;
pub mod imports;
pub mod manifest;

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

pub use cycles::{CircularDependency, CircularDependencyLinter};
pub use imports::{
    ImportIssue, ImportsLinter, InspectImportsError, InspectType, RegexImportsScanner,
    TargetImportsScanning,
};
pub use manifest::ManifestLinter;

/// Severity of a linting issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    Warning,
    Error,
}

/// One linting finding. Accumulated, never thrown individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintingIssue {
    /// Severity of the finding
    pub severity: LintSeverity,

    /// Human-readable description
    pub message: String,
}

impl LintingIssue {
    /// Create a warning issue.
    pub fn warning(message: impl Into<String>) -> Self {
        LintingIssue {
            severity: LintSeverity::Warning,
            message: message.into(),
        }
    }

    /// Create an error issue.
    pub fn error(message: impl Into<String>) -> Self {
        LintingIssue {
            severity: LintSeverity::Error,
            message: message.into(),
        }
    }

    /// Check if this issue is fatal.
    pub fn is_error(&self) -> bool {
        self.severity == LintSeverity::Error
    }
}

impl fmt::Display for LintingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            LintSeverity::Warning => write!(f, "warning: {}", self.message),
            LintSeverity::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Aggregated error-severity manifest lint findings.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("manifest linting failed:\n{}", format_issues(.issues))]
#[diagnostic(code(gantry::lint::structural), help("Fix the listed manifest declarations"))]
pub struct StructuralLintError {
    /// Every error-severity issue found across the manifest set
    pub issues: Vec<LintingIssue>,
}

fn format_issues(issues: &[LintingIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!(" - {}", issue.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Report warnings and fail on aggregated errors.
///
/// Warnings are logged and survive in the returned issue list of the run;
/// error-severity issues abort with one aggregate error.
pub fn check_issues(issues: &[LintingIssue]) -> Result<(), StructuralLintError> {
    for issue in issues.iter().filter(|i| !i.is_error()) {
        tracing::warn!("{}", issue.message);
    }

    let errors: Vec<LintingIssue> = issues.iter().filter(|i| i.is_error()).cloned().collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(StructuralLintError { issues: errors })
    }
}
