//! Declarative evidence probes.
//!
//! Detection is a table mapping `(category, tool)` to independent probes.
//! Each probe is a pure function over a `ProjectSnapshot` returning an
//! evidence string when its signal is present. Resolution (evidence counting
//! and tie-breaking) lives in the parent module; nothing here ranks tools.

use super::snapshot::ProjectSnapshot;
use crate::core::{Tool, ToolCategory};

pub type ProbeFn = fn(&ProjectSnapshot) -> Option<String>;

pub struct ToolProbes {
    pub category: ToolCategory,
    pub tool: Tool,
    pub probes: &'static [ProbeFn],
}

/// The full probe table. Order within a category does not affect resolution;
/// ties are broken by `Tool::priority_rank`.
pub static PROBE_TABLE: &[ToolProbes] = &[
    // Package managers
    ToolProbes {
        category: ToolCategory::PackageManager,
        tool: Tool::Uv,
        probes: &[
            |s| s.evidence_file("uv.lock"),
            |s| s.evidence_key("tool.uv"),
        ],
    },
    ToolProbes {
        category: ToolCategory::PackageManager,
        tool: Tool::Poetry,
        probes: &[
            |s| s.evidence_file("poetry.lock"),
            |s| s.evidence_key("tool.poetry"),
        ],
    },
    ToolProbes {
        category: ToolCategory::PackageManager,
        tool: Tool::Pipenv,
        probes: &[
            |s| s.evidence_file("Pipfile"),
            |s| s.evidence_file("Pipfile.lock"),
        ],
    },
    ToolProbes {
        category: ToolCategory::PackageManager,
        tool: Tool::Pip,
        probes: &[
            |s| s.evidence_file("requirements.txt"),
            |s| s.evidence_file("requirements-dev.txt"),
        ],
    },
    ToolProbes {
        category: ToolCategory::PackageManager,
        tool: Tool::Setuptools,
        probes: &[
            |s| s.evidence_file("setup.py"),
            |s| s.evidence_file("setup.cfg"),
        ],
    },
    // Linters
    ToolProbes {
        category: ToolCategory::Linter,
        tool: Tool::Ruff,
        probes: &[
            |s| s.evidence_file("ruff.toml"),
            |s| s.evidence_key("tool.ruff"),
            |s| s.evidence_dependency("ruff"),
        ],
    },
    ToolProbes {
        category: ToolCategory::Linter,
        tool: Tool::Flake8,
        probes: &[
            |s| s.evidence_file(".flake8"),
            |s| s.evidence_dependency("flake8"),
        ],
    },
    ToolProbes {
        category: ToolCategory::Linter,
        tool: Tool::Pylint,
        probes: &[
            |s| s.evidence_file(".pylintrc"),
            |s| s.evidence_file("pylintrc"),
            |s| s.evidence_key("tool.pylint"),
        ],
    },
    // Formatters
    ToolProbes {
        category: ToolCategory::Formatter,
        tool: Tool::Ruff,
        probes: &[
            |s| s.evidence_key("tool.ruff.format"),
            |s| s.evidence_key("tool.ruff.line-length"),
        ],
    },
    ToolProbes {
        category: ToolCategory::Formatter,
        tool: Tool::Black,
        probes: &[
            |s| s.evidence_key("tool.black"),
            |s| s.evidence_dependency("black"),
        ],
    },
    // Import sorters
    ToolProbes {
        category: ToolCategory::ImportSorter,
        tool: Tool::Ruff,
        probes: &[
            |s| s.evidence_key("tool.ruff.lint.isort"),
            ruff_selects_isort_rules,
        ],
    },
    ToolProbes {
        category: ToolCategory::ImportSorter,
        tool: Tool::Isort,
        probes: &[
            |s| s.evidence_file(".isort.cfg"),
            |s| s.evidence_key("tool.isort"),
            |s| s.evidence_dependency("isort"),
        ],
    },
    // Type checkers
    ToolProbes {
        category: ToolCategory::TypeChecker,
        tool: Tool::Basedpyright,
        probes: &[
            |s| s.evidence_key("tool.basedpyright"),
            |s| s.evidence_dependency("basedpyright"),
        ],
    },
    ToolProbes {
        category: ToolCategory::TypeChecker,
        tool: Tool::Pyright,
        probes: &[
            |s| s.evidence_file("pyrightconfig.json"),
            |s| s.evidence_key("tool.pyright"),
        ],
    },
    ToolProbes {
        category: ToolCategory::TypeChecker,
        tool: Tool::Mypy,
        probes: &[
            |s| s.evidence_file("mypy.ini"),
            |s| s.evidence_file(".mypy.ini"),
            |s| s.evidence_key("tool.mypy"),
            |s| s.evidence_dependency("mypy"),
        ],
    },
    // CI systems
    ToolProbes {
        category: ToolCategory::CiSystem,
        tool: Tool::GithubActions,
        probes: &[
            |s| s.evidence_glob(".github/workflows/*.yml"),
            |s| s.evidence_glob(".github/workflows/*.yaml"),
        ],
    },
    ToolProbes {
        category: ToolCategory::CiSystem,
        tool: Tool::GitlabCi,
        probes: &[|s| s.evidence_file(".gitlab-ci.yml")],
    },
    ToolProbes {
        category: ToolCategory::CiSystem,
        tool: Tool::TravisCi,
        probes: &[|s| s.evidence_file(".travis.yml")],
    },
    ToolProbes {
        category: ToolCategory::CiSystem,
        tool: Tool::CircleCi,
        probes: &[|s| s.evidence_file(".circleci/config.yml")],
    },
    ToolProbes {
        category: ToolCategory::CiSystem,
        tool: Tool::AzurePipelines,
        probes: &[|s| s.evidence_file("azure-pipelines.yml")],
    },
];

/// Ruff handles import sorting when the `I` rule family is selected.
fn ruff_selects_isort_rules(snapshot: &ProjectSnapshot) -> Option<String> {
    let doc = snapshot.pyproject()?;
    let select = doc.get("tool.ruff.lint.select")?.as_array()?;
    let has_isort_rules = select
        .iter()
        .filter_map(|v| v.as_str())
        .any(|rule| rule == "I" || (rule.starts_with('I') && rule[1..].chars().all(|c| c.is_ascii_digit())));
    has_isort_rules.then(|| "tool.ruff.lint.select enables I (isort) rules".to_string())
}
