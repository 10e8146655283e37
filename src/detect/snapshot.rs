//! Read-only snapshot of the project files the detector probes.
//!
//! Probes run against a `ProjectSnapshot` rather than the file system, so
//! detection is testable without touching disk. Loading performs every read
//! up front; unreadable entries are recorded as skip notes, never errors.

use crate::core::{Error, Result};
use crate::document::Document;
use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Directories whose files are listed in addition to the project root.
/// CI configuration is the only thing the detector looks for below the root.
const NESTED_DIRS: &[&str] = &[".github/workflows", ".circleci"];

#[derive(Debug, Default)]
pub struct ProjectSnapshot {
    root: PathBuf,
    /// Relative paths, `/`-separated regardless of platform.
    files: BTreeSet<String>,
    pyproject: Option<Document>,
    skipped: Vec<String>,
}

impl ProjectSnapshot {
    /// Snapshot a project directory. Fails only when the path itself is not
    /// a readable directory; individual unreadable files become skip notes.
    pub fn load(root: &Path) -> Result<Self> {
        if !root.exists() {
            return Err(Error::invalid_project(root, "path does not exist"));
        }
        if !root.is_dir() {
            return Err(Error::invalid_project(root, "path is not a directory"));
        }

        let mut snapshot = ProjectSnapshot {
            root: root.to_path_buf(),
            ..Default::default()
        };

        snapshot.list_dir(root, "");
        for nested in NESTED_DIRS {
            let dir = root.join(nested);
            if dir.is_dir() {
                snapshot.list_dir(&dir, &format!("{nested}/"));
            }
        }

        if snapshot.files.contains("pyproject.toml") {
            let path = root.join("pyproject.toml");
            match fs::read_to_string(&path) {
                Ok(text) => match Document::parse(&text, &path) {
                    Ok(doc) => snapshot.pyproject = Some(doc),
                    Err(err) => snapshot
                        .skipped
                        .push(format!("skipped pyproject.toml: {err}")),
                },
                Err(err) => snapshot
                    .skipped
                    .push(format!("skipped pyproject.toml: {err}")),
            }
        }

        debug!(
            "snapshot of {}: {} files, {} skipped",
            root.display(),
            snapshot.files.len(),
            snapshot.skipped.len()
        );
        Ok(snapshot)
    }

    fn list_dir(&mut self, dir: &Path, prefix: &str) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.skipped
                    .push(format!("skipped {prefix}: unreadable directory ({err})"));
                return;
            }
        };
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_file() {
                self.files.insert(format!("{prefix}{name}"));
            }
        }
    }

    /// Empty snapshot for tests; populate with the `with_*` builders.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        ProjectSnapshot {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, relative: &str) -> Self {
        self.files.insert(relative.to_string());
        self
    }

    pub fn with_pyproject(mut self, doc: Document) -> Self {
        self.files.insert("pyproject.toml".to_string());
        self.pyproject = Some(doc);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn has_file(&self, relative: &str) -> bool {
        self.files.contains(relative)
    }

    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    pub fn pyproject(&self) -> Option<&Document> {
        self.pyproject.as_ref()
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Evidence helper: file presence.
    pub fn evidence_file(&self, relative: &str) -> Option<String> {
        self.has_file(relative).then(|| format!("found {relative}"))
    }

    /// Evidence helper: files matching a glob pattern, e.g. CI workflows.
    pub fn evidence_glob(&self, pattern: &str) -> Option<String> {
        let matcher = glob::Pattern::new(pattern).ok()?;
        let count = self.files.iter().filter(|f| matcher.matches(f)).count();
        (count > 0).then(|| format!("found {count} file(s) matching {pattern}"))
    }

    /// Evidence helper: key presence in pyproject.toml.
    pub fn evidence_key(&self, key_path: &str) -> Option<String> {
        let doc = self.pyproject.as_ref()?;
        doc.contains(key_path)
            .then(|| format!("pyproject.toml defines {key_path}"))
    }

    /// Evidence helper: a package named in the declared dependencies.
    pub fn evidence_dependency(&self, package: &str) -> Option<String> {
        self.dependency_declared(package)
            .then(|| format!("{package} declared as a dependency"))
    }

    /// Whether a package appears in PEP 621 dependency arrays, optional
    /// dependency groups, or Poetry dependency tables.
    pub fn dependency_declared(&self, package: &str) -> bool {
        let Some(doc) = self.pyproject.as_ref() else {
            return false;
        };

        let in_array = |key_path: &str| -> bool {
            doc.get(key_path)
                .and_then(|item| item.as_array())
                .map(|array| {
                    array
                        .iter()
                        .filter_map(|v| v.as_str())
                        .any(|spec| requirement_name(spec) == package)
                })
                .unwrap_or(false)
        };

        if in_array("project.dependencies") {
            return true;
        }
        for group in doc.keys("project.optional-dependencies") {
            if in_array(&format!("project.optional-dependencies.{group}")) {
                return true;
            }
        }
        for table in ["tool.poetry.dependencies", "tool.poetry.dev-dependencies"] {
            if doc.keys(table).iter().any(|k| k == package) {
                return true;
            }
        }
        false
    }
}

/// Extract the bare package name from a PEP 508 requirement line.
pub fn requirement_name(spec: &str) -> &str {
    let end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .unwrap_or(spec.len());
    &spec[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pyproject(text: &str) -> Document {
        Document::parse(text, &PathBuf::from("pyproject.toml")).unwrap()
    }

    #[test]
    fn requirement_name_strips_specifiers() {
        assert_eq!(requirement_name("black==24.1.0"), "black");
        assert_eq!(requirement_name("ruff>=0.4"), "ruff");
        assert_eq!(requirement_name("requests[socks]>=2"), "requests");
        assert_eq!(requirement_name("flask"), "flask");
    }

    #[test]
    fn dependency_lookup_covers_pep621_and_poetry() {
        let snapshot = ProjectSnapshot::empty("/p").with_pyproject(pyproject(
            "[project]\ndependencies = [\"black==24.1.0\"]\n\n[project.optional-dependencies]\ndev = [\"mypy>=1.0\"]\n\n[tool.poetry.dependencies]\nflask = \"^2.0\"\n",
        ));
        assert!(snapshot.dependency_declared("black"));
        assert!(snapshot.dependency_declared("mypy"));
        assert!(snapshot.dependency_declared("flask"));
        assert!(!snapshot.dependency_declared("ruff"));
    }

    #[test]
    fn glob_evidence_matches_workflows() {
        let snapshot = ProjectSnapshot::empty("/p")
            .with_file(".github/workflows/ci.yml")
            .with_file(".github/workflows/release.yml");
        let evidence = snapshot.evidence_glob(".github/workflows/*.yml").unwrap();
        assert!(evidence.contains("2 file(s)"));
        assert!(snapshot.evidence_glob(".circleci/*.yml").is_none());
    }
}
