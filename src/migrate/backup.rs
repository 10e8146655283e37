//! Pre-migration file backups.
//!
//! Before a live run writes anything, every file it may touch is copied into
//! a timestamped directory inside the project. The directory is deliberately
//! retained after a successful run; it is the user's undo button.

use crate::core::{Error, Result};
use chrono::Utc;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// A created backup directory plus the relative paths it holds.
#[derive(Debug, Clone)]
pub struct BackupSet {
    dir: PathBuf,
    root: PathBuf,
    files: Vec<String>,
}

impl BackupSet {
    /// Copy `files` (relative to `root`, absent ones skipped) into a fresh
    /// `.pyforge_backup_<timestamp>` directory under `root`.
    pub fn create(root: &Path, files: &[String]) -> Result<BackupSet> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let dir = root.join(format!(".pyforge_backup_{stamp}"));
        fs::create_dir_all(&dir)?;

        let mut backed_up = Vec::new();
        for relative in files {
            let source = root.join(relative);
            if !source.is_file() {
                continue;
            }
            let destination = dir.join(relative);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &destination)?;
            debug!("backed up {relative} to {}", dir.display());
            backed_up.push(relative.clone());
        }

        info!(
            "created backup of {} file(s) at {}",
            backed_up.len(),
            dir.display()
        );
        Ok(BackupSet {
            dir,
            root: root.to_path_buf(),
            files: backed_up,
        })
    }

    /// Restore every backed-up file to its original location. Any failure
    /// here is the unrecoverable case; the error names this directory so the
    /// user can finish the restore by hand.
    pub fn restore(&self) -> Result<()> {
        for relative in &self.files {
            let source = self.dir.join(relative);
            let destination = self.root.join(relative);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|err| self.rollback_failed(relative, err))?;
            }
            fs::copy(&source, &destination)
                .map_err(|err| self.rollback_failed(relative, err))?;
        }
        Ok(())
    }

    fn rollback_failed(&self, relative: &str, err: std::io::Error) -> Error {
        Error::RollbackFailed {
            backup_path: self.dir.clone(),
            reason: format!("could not restore {relative}: {err}"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Relative paths that actually existed and were copied.
    pub fn files(&self) -> &[String] {
        &self.files
    }
}
