//! Plan execution.
//!
//! Execution is strictly phased: read every touched file, apply every step to
//! the in-memory working set, then (live runs only) back up, commit, and
//! verify. No file is written until every step has succeeded in memory, so a
//! failing transform leaves the project untouched. Write or verification
//! failures roll the project back from the backup.
//!
//! Concurrent runs against the same project are undefined behavior: the
//! executor takes no lock, and two interleaved commit phases can corrupt
//! each other's files and backups.

use super::{BackupSet, FileState, MigrationPlan, WorkingSet};
use crate::core::{Error, Result};
use crate::document::Document;
use log::{debug, info, warn};
use similar::TextDiff;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    /// Compute and report changes without touching any file.
    pub dry_run: bool,
    /// Create a backup directory before the first write. Disabling this
    /// removes the rollback safety net.
    pub backup: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        ExecutorOptions {
            dry_run: false,
            backup: true,
        }
    }
}

/// Unified diff of one changed file.
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub path: String,
    pub diff: String,
}

#[derive(Debug, Clone)]
pub struct MigrationResult {
    /// Step ids in application order.
    pub applied: Vec<String>,
    pub diffs: Vec<FileDiff>,
    pub written_files: Vec<String>,
    pub removed_files: Vec<String>,
    pub backup_path: Option<PathBuf>,
    pub dry_run: bool,
}

pub struct MigrationExecutor {
    root: PathBuf,
    options: ExecutorOptions,
}

impl MigrationExecutor {
    pub fn new(root: &Path, options: ExecutorOptions) -> Self {
        MigrationExecutor {
            root: root.to_path_buf(),
            options,
        }
    }

    pub fn execute(&self, plan: &MigrationPlan) -> Result<MigrationResult> {
        // Read phase: load every file any step may touch. Reads complete
        // before the first step runs.
        let touched = plan.touched_files();
        let original = self.read_working_set(&touched)?;

        // Backup phase, live runs only. Every touched file is copied before
        // the first step applies, so a failing run always has its originals
        // on disk in the backup directory.
        let backup = if self.options.dry_run {
            None
        } else if self.options.backup {
            Some(BackupSet::create(&self.root, &touched)?)
        } else {
            warn!("running without backup; a failed run cannot be rolled back");
            None
        };

        // Apply phase, entirely in memory. A failing step aborts before any
        // file on disk has changed.
        let mut current = original.clone();
        let mut applied = Vec::new();
        let mut last_writer: BTreeMap<String, String> = BTreeMap::new();
        for step in &plan.steps {
            debug!("applying step {}", step.id);
            let next = step.apply(&plan.context, &current)?;
            for (path, state) in &next {
                if current.get(path) != Some(state) {
                    last_writer.insert(path.clone(), step.id.clone());
                }
            }
            current = next;
            applied.push(step.id.clone());
        }

        let changes = diff_working_sets(&original, &current);
        let diffs: Vec<FileDiff> = changes
            .iter()
            .map(|(path, change)| FileDiff {
                path: path.clone(),
                diff: render_diff(path, change),
            })
            .collect();
        let written_files: Vec<String> = changes
            .iter()
            .filter(|(_, c)| matches!(c.after, FileState::Present(_)))
            .map(|(p, _)| p.clone())
            .collect();
        let removed_files: Vec<String> = changes
            .iter()
            .filter(|(_, c)| c.after == FileState::Absent)
            .map(|(p, _)| p.clone())
            .collect();

        if self.options.dry_run {
            info!(
                "dry run: {} step(s) would change {} file(s)",
                applied.len(),
                changes.len()
            );
            return Ok(MigrationResult {
                applied,
                diffs,
                written_files,
                removed_files,
                backup_path: None,
                dry_run: true,
            });
        }

        // Commit phase: all writes were computed up front, so this loop does
        // nothing but I/O.
        if let Err(err) = self.commit(&changes) {
            return Err(self.roll_back(backup.as_ref(), &changes, err));
        }

        // Verification phase: every structured file written back must still
        // parse. Catches transforms that serialized something malformed.
        if let Err(err) = self.verify(&last_writer, &written_files) {
            return Err(self.roll_back(backup.as_ref(), &changes, err));
        }

        info!(
            "applied {} step(s), wrote {} file(s), removed {} file(s)",
            applied.len(),
            written_files.len(),
            removed_files.len()
        );
        Ok(MigrationResult {
            applied,
            diffs,
            written_files,
            removed_files,
            backup_path: backup.map(|b| b.path().to_path_buf()),
            dry_run: false,
        })
    }

    fn read_working_set(&self, touched: &[String]) -> Result<WorkingSet> {
        let mut files = WorkingSet::new();
        for relative in touched {
            let path = self.root.join(relative);
            let state = if path.is_file() {
                FileState::Present(fs::read_to_string(&path)?)
            } else {
                FileState::Absent
            };
            files.insert(relative.clone(), state);
        }
        Ok(files)
    }

    fn commit(&self, changes: &BTreeMap<String, Change>) -> Result<()> {
        for (relative, change) in changes {
            let path = self.root.join(relative);
            match &change.after {
                FileState::Present(text) => {
                    debug!("writing {relative}");
                    fs::write(&path, text)?;
                }
                FileState::Absent => {
                    debug!("removing {relative}");
                    // Absent-to-absent pairs never reach here; diff_working_sets
                    // drops unchanged entries.
                    fs::remove_file(&path)?;
                }
            }
        }
        Ok(())
    }

    /// Re-parse every structured file written back. `last_writer` maps each
    /// path to the id of the last step that changed it, so a failure is
    /// attributed to the step that produced the file, not the last step run.
    fn verify(&self, last_writer: &BTreeMap<String, String>, written: &[String]) -> Result<()> {
        for relative in written {
            if !relative.ends_with(".toml") {
                continue;
            }
            let path = self.root.join(relative);
            let text = fs::read_to_string(&path)?;
            if let Err(err) = Document::parse(&text, &path) {
                return Err(Error::Verification {
                    step_id: last_writer.get(relative).cloned().unwrap_or_default(),
                    file: path,
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Undo a partially committed run: restore backed-up files, delete files
    /// the run created. Returns the original error on success; a failure
    /// while restoring escalates to `RollbackFailed`.
    fn roll_back(
        &self,
        backup: Option<&BackupSet>,
        changes: &BTreeMap<String, Change>,
        cause: Error,
    ) -> Error {
        let Some(backup) = backup else {
            warn!("cannot roll back: run started without a backup");
            return cause;
        };
        warn!("rolling back from {}", backup.path().display());

        for (relative, change) in changes {
            if change.before == FileState::Absent {
                let path = self.root.join(relative);
                if path.is_file() {
                    if let Err(err) = fs::remove_file(&path) {
                        return Error::RollbackFailed {
                            backup_path: backup.path().to_path_buf(),
                            reason: format!("could not delete created file {relative}: {err}"),
                        };
                    }
                }
            }
        }
        if let Err(err) = backup.restore() {
            return err;
        }

        info!("rollback complete; backup retained at {}", backup.path().display());
        cause
    }
}

struct Change {
    before: FileState,
    after: FileState,
}

fn diff_working_sets(original: &WorkingSet, current: &WorkingSet) -> BTreeMap<String, Change> {
    let mut changes = BTreeMap::new();
    for (path, after) in current {
        let before = original.get(path).cloned().unwrap_or(FileState::Absent);
        if before != *after {
            changes.insert(
                path.clone(),
                Change {
                    before,
                    after: after.clone(),
                },
            );
        }
    }
    changes
}

fn render_diff(path: &str, change: &Change) -> String {
    let before = change.before.text().unwrap_or("");
    let after = change.after.text().unwrap_or("");
    let old_label = match change.before {
        FileState::Present(_) => format!("a/{path}"),
        FileState::Absent => "/dev/null".to_string(),
    };
    let new_label = match change.after {
        FileState::Present(_) => format!("b/{path}"),
        FileState::Absent => "/dev/null".to_string(),
    };
    TextDiff::from_lines(before, after)
        .unified_diff()
        .header(&old_label, &new_label)
        .to_string()
}
