//! Plan derivation.
//!
//! Turns a detection report into an ordered list of migration steps for the
//! configured target profile. Planning is pure and touches no files; only
//! tools the detector actually found produce steps, so the resulting plan is
//! idempotent by construction: a migrated project detects as already-modern
//! and plans nothing.

use super::{MigrationPlan, MigrationStep, PlanContext, StepAction};
use crate::core::{DetectionReport, Tool, ToolCategory};
use log::debug;

/// The tool set a migration converges on. Only the modern default profile is
/// supported today; the struct exists so the planner's inputs stay explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetProfile {
    pub package_manager: Tool,
    pub linter: Tool,
    pub formatter: Tool,
    pub import_sorter: Tool,
    pub type_checker: Tool,
}

impl Default for TargetProfile {
    fn default() -> Self {
        TargetProfile {
            package_manager: Tool::Uv,
            linter: Tool::Ruff,
            formatter: Tool::Ruff,
            import_sorter: Tool::Ruff,
            type_checker: Tool::Basedpyright,
        }
    }
}

/// Result of planning: either a non-empty plan or nothing to do.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Plan(MigrationPlan),
    /// The project already matches the target profile for every category the
    /// planner knows how to migrate.
    NoMigrationNeeded,
}

/// Derive a migration plan from detection results. `from_override` replaces
/// the detected package manager, letting users force a migration path when
/// detection picked a different tool.
pub fn plan(
    report: &DetectionReport,
    target: &TargetProfile,
    from_override: Option<Tool>,
) -> PlanOutcome {
    let context = PlanContext {
        project_name: project_name(report),
    };

    let mut steps = Vec::new();

    let package_manager = from_override.unwrap_or_else(|| report.tool(ToolCategory::PackageManager));
    if package_manager != target.package_manager {
        package_manager_steps(package_manager, &mut steps);
    }

    if report.tool(ToolCategory::Formatter) == Tool::Black && target.formatter == Tool::Ruff {
        steps.push(MigrationStep {
            id: "fmt-black-to-ruff".to_string(),
            description: "Move black settings to [tool.ruff] and ruff format".to_string(),
            target_files: vec!["pyproject.toml".to_string()],
            reversible: true,
            action: StepAction::BlackToRuff,
        });
    }

    if report.tool(ToolCategory::ImportSorter) == Tool::Isort && target.import_sorter == Tool::Ruff
    {
        steps.push(MigrationStep {
            id: "sorter-isort-to-ruff".to_string(),
            description: "Move isort settings to [tool.ruff.lint.isort]".to_string(),
            target_files: vec!["pyproject.toml".to_string()],
            reversible: true,
            action: StepAction::IsortToRuff,
        });
        steps.push(remove_step("sorter-isort-remove-cfg", ".isort.cfg"));
    }

    if report.tool(ToolCategory::Linter) == Tool::Flake8 && target.linter == Tool::Ruff {
        steps.push(MigrationStep {
            id: "lint-flake8-to-ruff".to_string(),
            description: "Translate .flake8 settings to [tool.ruff.lint]".to_string(),
            target_files: vec!["pyproject.toml".to_string(), ".flake8".to_string()],
            reversible: true,
            action: StepAction::Flake8ToRuff,
        });
        steps.push(MigrationStep {
            id: "lint-flake8-remove-config".to_string(),
            description: "Remove the superseded .flake8 file".to_string(),
            target_files: vec![".flake8".to_string()],
            reversible: true,
            action: StepAction::RemoveFile {
                path: ".flake8".to_string(),
            },
        });
    }

    if report.tool(ToolCategory::TypeChecker) == Tool::Mypy
        && target.type_checker == Tool::Basedpyright
    {
        steps.push(MigrationStep {
            id: "type-mypy-to-basedpyright".to_string(),
            description: "Map mypy strictness onto [tool.basedpyright]".to_string(),
            target_files: vec![
                "pyproject.toml".to_string(),
                "mypy.ini".to_string(),
                ".mypy.ini".to_string(),
            ],
            reversible: true,
            action: StepAction::MypyToBasedpyright,
        });
        for path in ["mypy.ini", ".mypy.ini"] {
            steps.push(MigrationStep {
                id: format!("type-mypy-remove-{path}"),
                description: format!("Remove the superseded {path} file"),
                target_files: vec![path.to_string()],
                reversible: true,
                action: StepAction::RemoveFile {
                    path: path.to_string(),
                },
            });
        }
    }

    if steps.is_empty() {
        return PlanOutcome::NoMigrationNeeded;
    }

    // Additive steps run before any removal so every transform still sees
    // its source files; within each half the derivation order is kept.
    let (additive, removals): (Vec<_>, Vec<_>) =
        steps.into_iter().partition(|step| !step.is_removal());
    let steps: Vec<MigrationStep> = additive.into_iter().chain(removals).collect();

    debug!(
        "planned {} steps: {}",
        steps.len(),
        steps
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    PlanOutcome::Plan(MigrationPlan { context, steps })
}

fn package_manager_steps(source: Tool, steps: &mut Vec<MigrationStep>) {
    match source {
        Tool::Poetry => {
            steps.push(MigrationStep {
                id: "pm-poetry-convert".to_string(),
                description: "Convert [tool.poetry] metadata to PEP 621 [project]".to_string(),
                target_files: vec!["pyproject.toml".to_string()],
                reversible: true,
                action: StepAction::ConvertPoetryMetadata,
            });
            steps.push(remove_step("pm-poetry-remove-lock", "poetry.lock"));
        }
        Tool::Pip => {
            steps.push(MigrationStep {
                id: "pm-pip-import".to_string(),
                description: "Import requirements files into pyproject.toml dependencies"
                    .to_string(),
                target_files: vec![
                    "pyproject.toml".to_string(),
                    "requirements.txt".to_string(),
                    "requirements-dev.txt".to_string(),
                ],
                reversible: true,
                action: StepAction::ImportRequirements,
            });
            steps.push(remove_step("pm-pip-remove-requirements", "requirements.txt"));
            steps.push(remove_step(
                "pm-pip-remove-requirements-dev",
                "requirements-dev.txt",
            ));
        }
        Tool::Pipenv => {
            steps.push(MigrationStep {
                id: "pm-pipenv-import".to_string(),
                description: "Import Pipfile packages into pyproject.toml dependencies"
                    .to_string(),
                target_files: vec!["pyproject.toml".to_string(), "Pipfile".to_string()],
                reversible: true,
                action: StepAction::ImportPipfile,
            });
            steps.push(remove_step("pm-pipenv-remove-pipfile", "Pipfile"));
            steps.push(remove_step("pm-pipenv-remove-lock", "Pipfile.lock"));
        }
        Tool::Setuptools => {
            steps.push(MigrationStep {
                id: "pm-setuptools-convert".to_string(),
                description: "Convert setup.cfg metadata to pyproject.toml".to_string(),
                target_files: vec!["pyproject.toml".to_string(), "setup.cfg".to_string()],
                reversible: true,
                action: StepAction::ConvertSetupCfg,
            });
            // setup.py can hold arbitrary code; it is reported, never
            // rewritten or deleted. The manual follow-up it stands for
            // cannot be undone by the engine, hence not reversible.
            steps.push(MigrationStep {
                id: "pm-setuptools-advise-setup-py".to_string(),
                description: "setup.py requires manual review and is left in place".to_string(),
                target_files: vec!["setup.py".to_string()],
                reversible: false,
                action: StepAction::AdviseSetupPy,
            });
            steps.push(remove_step("pm-setuptools-remove-cfg", "setup.cfg"));
        }
        _ => {}
    }
}

fn remove_step(id: &str, path: &str) -> MigrationStep {
    MigrationStep {
        id: id.to_string(),
        description: format!("Remove the superseded {path} file"),
        target_files: vec![path.to_string()],
        reversible: true,
        action: StepAction::RemoveFile {
            path: path.to_string(),
        },
    }
}

fn project_name(report: &DetectionReport) -> String {
    report
        .project_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("project")
        .to_string()
}
