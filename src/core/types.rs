//! Common type definitions used across the codebase

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Tool categories the detector classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    PackageManager,
    Linter,
    Formatter,
    ImportSorter,
    TypeChecker,
    CiSystem,
}

impl ToolCategory {
    pub const ALL: [ToolCategory; 6] = [
        ToolCategory::PackageManager,
        ToolCategory::Linter,
        ToolCategory::Formatter,
        ToolCategory::ImportSorter,
        ToolCategory::TypeChecker,
        ToolCategory::CiSystem,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ToolCategory::PackageManager => "package manager",
            ToolCategory::Linter => "linter",
            ToolCategory::Formatter => "formatter",
            ToolCategory::ImportSorter => "import sorter",
            ToolCategory::TypeChecker => "type checker",
            ToolCategory::CiSystem => "CI system",
        }
    }
}

/// Every tool the detector knows how to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Uv,
    Poetry,
    Pipenv,
    Pip,
    Setuptools,
    Ruff,
    Flake8,
    Pylint,
    Black,
    Isort,
    Basedpyright,
    Pyright,
    Mypy,
    GithubActions,
    GitlabCi,
    TravisCi,
    CircleCi,
    AzurePipelines,
    Unknown,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Uv => "uv",
            Tool::Poetry => "poetry",
            Tool::Pipenv => "pipenv",
            Tool::Pip => "pip",
            Tool::Setuptools => "setuptools",
            Tool::Ruff => "ruff",
            Tool::Flake8 => "flake8",
            Tool::Pylint => "pylint",
            Tool::Black => "black",
            Tool::Isort => "isort",
            Tool::Basedpyright => "basedpyright",
            Tool::Pyright => "pyright",
            Tool::Mypy => "mypy",
            Tool::GithubActions => "github-actions",
            Tool::GitlabCi => "gitlab-ci",
            Tool::TravisCi => "travis-ci",
            Tool::CircleCi => "circleci",
            Tool::AzurePipelines => "azure-pipelines",
            Tool::Unknown => "unknown",
        }
    }

    /// Fixed tie-break rank within a category. Lower rank wins when two tools
    /// carry the same amount of evidence. The package-manager order
    /// (uv > poetry > pipenv > pip > setuptools) is a stated contract and
    /// must not change silently.
    pub fn priority_rank(&self) -> u8 {
        match self {
            Tool::Uv => 0,
            Tool::Poetry => 1,
            Tool::Pipenv => 2,
            Tool::Pip => 3,
            Tool::Setuptools => 4,
            Tool::Ruff => 0,
            Tool::Flake8 => 1,
            Tool::Pylint => 2,
            Tool::Black => 1,
            Tool::Isort => 1,
            Tool::Basedpyright => 0,
            Tool::Pyright => 1,
            Tool::Mypy => 2,
            Tool::GithubActions => 0,
            Tool::GitlabCi => 1,
            Tool::TravisCi => 2,
            Tool::CircleCi => 3,
            Tool::AzurePipelines => 4,
            Tool::Unknown => u8::MAX,
        }
    }

    /// Parse a user-supplied tool name (the `--from-tool` override).
    pub fn from_name(name: &str) -> Option<Tool> {
        match name {
            "uv" => Some(Tool::Uv),
            "poetry" => Some(Tool::Poetry),
            "pipenv" => Some(Tool::Pipenv),
            "pip" => Some(Tool::Pip),
            "setuptools" => Some(Tool::Setuptools),
            "ruff" => Some(Tool::Ruff),
            "flake8" => Some(Tool::Flake8),
            "pylint" => Some(Tool::Pylint),
            "black" => Some(Tool::Black),
            "isort" => Some(Tool::Isort),
            "basedpyright" => Some(Tool::Basedpyright),
            "pyright" => Some(Tool::Pyright),
            "mypy" => Some(Tool::Mypy),
            _ => None,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One detection conclusion for a category, with its evidence trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub tool: Tool,
    pub confidence: f64,
    pub evidence: Vec<String>,
}

impl Finding {
    pub fn unknown() -> Self {
        Finding {
            tool: Tool::Unknown,
            confidence: 0.0,
            evidence: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.tool == Tool::Unknown
    }
}

/// Immutable result of project detection: one Finding per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub project_path: PathBuf,
    pub findings: BTreeMap<ToolCategory, Finding>,
}

impl DetectionReport {
    /// The finding for a category. Categories with no evidence carry an
    /// `unknown` finding, so lookups never fail for a report built by `detect`.
    pub fn finding(&self, category: ToolCategory) -> &Finding {
        static UNKNOWN: Finding = Finding {
            tool: Tool::Unknown,
            confidence: 0.0,
            evidence: Vec::new(),
        };
        self.findings.get(&category).unwrap_or(&UNKNOWN)
    }

    pub fn tool(&self, category: ToolCategory) -> Tool {
        self.finding(category).tool
    }
}

/// Severity levels for audit issues, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Fixed score weights: critical=20, error=10, warning=5, info=1.
    /// These are a testable contract, not tunables.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 20,
            Severity::Error => 10,
            Severity::Warning => 5,
            Severity::Info => 1,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

/// A single audit issue derived from detection evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identifier, used as the deterministic secondary sort key.
    pub id: String,
    pub severity: Severity,
    pub category: ToolCategory,
    pub message: String,
    /// Suggested remediation, e.g. a pyforge command to run.
    pub action: Option<String>,
}

/// Health score plus the ordered issues it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: u8,
    pub issues: Vec<Issue>,
}

/// Full audit output: detection findings, structural signals, and the score
/// derived from them. This is the unit the writers serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub detection: DetectionReport,
    pub signals: ExtraSignals,
    pub score: ScoreReport,
}

/// Cheap structural signals computed by the caller and fed to the scorer,
/// keeping the scorer itself pure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraSignals {
    /// Percentage (0-100) of function signatures carrying annotations.
    pub annotation_coverage: f64,
    pub typed_functions: usize,
    pub total_functions: usize,
    pub has_lockfile: bool,
    pub has_ci: bool,
    pub has_pre_commit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_weights_are_fixed() {
        assert_eq!(Severity::Critical.weight(), 20);
        assert_eq!(Severity::Error.weight(), 10);
        assert_eq!(Severity::Warning.weight(), 5);
        assert_eq!(Severity::Info.weight(), 1);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn package_manager_priority_order() {
        // uv > poetry > pipenv > pip > setuptools
        assert!(Tool::Uv.priority_rank() < Tool::Poetry.priority_rank());
        assert!(Tool::Poetry.priority_rank() < Tool::Pipenv.priority_rank());
        assert!(Tool::Pipenv.priority_rank() < Tool::Pip.priority_rank());
        assert!(Tool::Pip.priority_rank() < Tool::Setuptools.priority_rank());
    }

    #[test]
    fn tool_name_round_trip() {
        for tool in [
            Tool::Uv,
            Tool::Poetry,
            Tool::Ruff,
            Tool::Mypy,
            Tool::Basedpyright,
        ] {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("cargo"), None);
    }
}
