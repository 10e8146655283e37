use crate::core::{AuditReport, ExtraSignals};
use crate::detect::{self, ProjectSnapshot};
use crate::io::output::{JsonWriter, OutputFormat, OutputWriter, TerminalWriter};
use crate::score;
use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct AuditConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn handle_audit(config: AuditConfig) -> Result<()> {
    let report = run_audit(&config.path)?;
    info!("audit of {} scored {}", config.path.display(), report.score.score);

    let mut writer = make_writer(config.format, config.output.as_ref())?;
    writer.write_audit(&report)?;
    Ok(())
}

/// Detect, gather structural signals, and score. Split from `handle_audit` so
/// `upgrade` and the tests can reuse it without touching the writers.
pub fn run_audit(path: &Path) -> Result<AuditReport> {
    let snapshot = ProjectSnapshot::load(path)
        .with_context(|| format!("failed to inspect project at {}", path.display()))?;
    let detection = detect::detect_snapshot(&snapshot);
    let signals = gather_signals(&snapshot)?;
    let score = score::score(&detection, &signals);
    Ok(AuditReport {
        detection,
        signals,
        score,
    })
}

fn gather_signals(snapshot: &ProjectSnapshot) -> Result<ExtraSignals> {
    let coverage = detect::annotation_coverage(snapshot.root())?;
    let has_file = |name: &str| snapshot.has_file(name);
    Ok(ExtraSignals {
        annotation_coverage: coverage.percentage,
        typed_functions: coverage.typed_functions,
        total_functions: coverage.total_functions,
        has_lockfile: has_file("uv.lock") || has_file("poetry.lock") || has_file("Pipfile.lock"),
        has_ci: snapshot
            .files()
            .iter()
            .any(|f| f.starts_with(".github/workflows/") || f == ".gitlab-ci.yml"),
        has_pre_commit: has_file(".pre-commit-config.yaml"),
    })
}

pub(crate) fn make_writer(
    format: OutputFormat,
    output: Option<&PathBuf>,
) -> Result<Box<dyn OutputWriter>> {
    Ok(match (format, output) {
        (OutputFormat::Json, Some(path)) => Box::new(JsonWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        (OutputFormat::Json, None) => Box::new(JsonWriter::new(std::io::stdout())),
        (OutputFormat::Terminal, Some(path)) => Box::new(TerminalWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        (OutputFormat::Terminal, None) => Box::new(TerminalWriter::new(std::io::stdout())),
    })
}
