//! Migration planning and execution.
//!
//! A plan is an ordered list of discrete, pure steps. Steps transform an
//! in-memory working set of file contents; nothing in this module touches
//! the file system except the executor's read, backup, and commit phases.

pub mod backup;
pub mod executor;
pub mod planner;
pub mod steps;

pub use backup::BackupSet;
pub use executor::{ExecutorOptions, FileDiff, MigrationExecutor, MigrationResult};
pub use planner::{plan, PlanOutcome, TargetProfile};
pub use steps::StepAction;

use crate::core::Result;
use std::collections::BTreeMap;

/// In-memory state of one project file during planning and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Present(String),
    Absent,
}

impl FileState {
    pub fn text(&self) -> Option<&str> {
        match self {
            FileState::Present(text) => Some(text),
            FileState::Absent => None,
        }
    }
}

/// Relative path -> file state. Steps consume and produce whole working sets,
/// which keeps each step a pure function.
pub type WorkingSet = BTreeMap<String, FileState>;

/// Context shared by every step of one plan.
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// Directory name of the project, used when a minimal pyproject.toml has
    /// to be created from scratch.
    pub project_name: String,
}

/// One discrete migration step. `apply` is pure: the same input working set
/// always yields the same output, with no I/O and no hidden state.
#[derive(Debug, Clone)]
pub struct MigrationStep {
    pub id: String,
    pub description: String,
    /// Files this step may read or rewrite, relative to the project root.
    pub target_files: Vec<String>,
    pub reversible: bool,
    pub action: StepAction,
}

impl MigrationStep {
    pub fn apply(&self, context: &PlanContext, files: &WorkingSet) -> Result<WorkingSet> {
        steps::apply_action(self, context, files)
    }

    /// Removal steps are ordered after additive steps touching the same file.
    pub fn is_removal(&self) -> bool {
        matches!(self.action, StepAction::RemoveFile { .. })
    }
}

/// Ordered steps plus shared context. Never mutated after creation; a re-run
/// derives a fresh plan from a fresh detection report.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub context: PlanContext,
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    /// Union of every step's target files, in first-touched order.
    pub fn touched_files(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for step in &self.steps {
            for file in &step.target_files {
                if !seen.contains(file) {
                    seen.push(file.clone());
                }
            }
        }
        seen
    }
}
