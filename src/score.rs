//! Project health scoring.
//!
//! A pure function from a detection report plus caller-computed structural
//! signals to a 0-100 score and an ordered issue list. Issues derive from
//! fixed rules; the score is `100 - sum(severity weight)` floored at zero.
//! Output order is deterministic: descending severity, then issue id.

use crate::core::{
    DetectionReport, ExtraSignals, Issue, ScoreReport, Severity, Tool, ToolCategory,
};

/// Score a project from detection evidence and structural signals.
pub fn score(report: &DetectionReport, signals: &ExtraSignals) -> ScoreReport {
    let mut issues = Vec::new();
    tooling_issues(report, signals, &mut issues);
    structure_issues(report, signals, &mut issues);
    coverage_issues(signals, &mut issues);

    issues.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.id.cmp(&b.id))
    });

    let penalty: u32 = issues.iter().map(|i| i.severity.weight()).sum();
    let score = 100_u32.saturating_sub(penalty) as u8;

    ScoreReport { score, issues }
}

fn issue(
    id: &str,
    severity: Severity,
    category: ToolCategory,
    message: impl Into<String>,
    action: Option<&str>,
) -> Issue {
    Issue {
        id: id.to_string(),
        severity,
        category,
        message: message.into(),
        action: action.map(str::to_string),
    }
}

fn tooling_issues(report: &DetectionReport, signals: &ExtraSignals, issues: &mut Vec<Issue>) {
    match report.tool(ToolCategory::PackageManager) {
        Tool::Poetry => issues.push(issue(
            "pm-poetry",
            Severity::Info,
            ToolCategory::PackageManager,
            "Consider migrating from Poetry to uv for faster dependency resolution",
            Some("pyforge upgrade . --from-tool poetry"),
        )),
        Tool::Pip => issues.push(issue(
            "pm-pip",
            Severity::Info,
            ToolCategory::PackageManager,
            "Consider migrating from pip/requirements.txt to uv with pyproject.toml",
            Some("pyforge upgrade . --from-tool pip"),
        )),
        Tool::Pipenv => issues.push(issue(
            "pm-pipenv",
            Severity::Info,
            ToolCategory::PackageManager,
            "Consider migrating from Pipenv to uv for better performance",
            Some("pyforge upgrade . --from-tool pipenv"),
        )),
        Tool::Setuptools => issues.push(issue(
            "pm-setuptools",
            Severity::Warning,
            ToolCategory::PackageManager,
            "Consider migrating from setup.py/setup.cfg to pyproject.toml (PEP 621)",
            Some("pyforge upgrade . --from-tool setuptools"),
        )),
        Tool::Unknown => issues.push(issue(
            "pm-missing",
            Severity::Warning,
            ToolCategory::PackageManager,
            "No package manager detected. Consider adding a pyproject.toml",
            None,
        )),
        _ => {}
    }

    match report.tool(ToolCategory::Linter) {
        Tool::Flake8 => issues.push(issue(
            "lint-flake8",
            Severity::Info,
            ToolCategory::Linter,
            "Consider migrating from flake8 to ruff for better performance",
            Some("pyforge upgrade ."),
        )),
        Tool::Pylint => issues.push(issue(
            "lint-pylint",
            Severity::Info,
            ToolCategory::Linter,
            "Consider migrating from pylint to ruff for better performance",
            None,
        )),
        Tool::Unknown => {
            // A ruff formatter setup covers linting too; only flag a truly
            // bare project.
            if report.tool(ToolCategory::Formatter) != Tool::Ruff {
                issues.push(issue(
                    "lint-missing",
                    Severity::Warning,
                    ToolCategory::Linter,
                    "No linter detected. Consider adding ruff for code quality",
                    None,
                ));
            }
        }
        _ => {}
    }

    if report.tool(ToolCategory::Formatter) == Tool::Black {
        issues.push(issue(
            "fmt-black",
            Severity::Info,
            ToolCategory::Formatter,
            "Consider migrating from black to ruff format for better performance",
            Some("pyforge upgrade ."),
        ));
    }

    if report.tool(ToolCategory::ImportSorter) == Tool::Isort {
        issues.push(issue(
            "sorter-isort",
            Severity::Info,
            ToolCategory::ImportSorter,
            "Consider migrating from isort to ruff (handles import sorting)",
            Some("pyforge upgrade ."),
        ));
    }

    match report.tool(ToolCategory::TypeChecker) {
        Tool::Mypy => issues.push(issue(
            "type-mypy",
            Severity::Info,
            ToolCategory::TypeChecker,
            "Consider migrating from mypy to basedpyright for stricter checking",
            Some("pyforge upgrade ."),
        )),
        Tool::Unknown => issues.push(issue(
            "type-missing",
            Severity::Error,
            ToolCategory::TypeChecker,
            "No type checker detected. Consider adding basedpyright",
            None,
        )),
        _ => {}
    }

    if report.tool(ToolCategory::CiSystem) == Tool::Unknown && !signals.has_ci {
        issues.push(issue(
            "ci-missing",
            Severity::Info,
            ToolCategory::CiSystem,
            "No CI/CD configuration detected. Consider adding GitHub Actions",
            None,
        ));
    }
}

fn structure_issues(report: &DetectionReport, signals: &ExtraSignals, issues: &mut Vec<Issue>) {
    if !signals.has_pre_commit {
        issues.push(issue(
            "hooks-missing",
            Severity::Info,
            ToolCategory::Linter,
            "No pre-commit hooks detected. Consider adding pre-commit",
            None,
        ));
    }

    // A lockfile only makes sense once some package manager is in play.
    if !signals.has_lockfile && report.tool(ToolCategory::PackageManager) != Tool::Unknown {
        issues.push(issue(
            "lockfile-missing",
            Severity::Warning,
            ToolCategory::PackageManager,
            "No lockfile detected. Dependency resolution is not reproducible",
            None,
        ));
    }
}

fn coverage_issues(signals: &ExtraSignals, issues: &mut Vec<Issue>) {
    if signals.total_functions == 0 {
        return;
    }
    let pct = signals.annotation_coverage;
    let detail = format!(
        "{}/{} functions have type hints",
        signals.typed_functions, signals.total_functions
    );
    if pct < 25.0 {
        issues.push(issue(
            "coverage-low",
            Severity::Warning,
            ToolCategory::TypeChecker,
            format!("Low type annotation coverage ({pct:.0}%). Only {detail}"),
            None,
        ));
    } else if pct < 50.0 {
        issues.push(issue(
            "coverage-moderate",
            Severity::Info,
            ToolCategory::TypeChecker,
            format!("Moderate type annotation coverage ({pct:.0}%). {detail}"),
            None,
        ));
    } else if pct < 80.0 {
        issues.push(issue(
            "coverage-good",
            Severity::Info,
            ToolCategory::TypeChecker,
            format!("Good type annotation coverage ({pct:.0}%). Consider improving to 80%+"),
            None,
        ));
    }
}
