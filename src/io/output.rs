use crate::core::{AuditReport, Severity, ToolCategory};
use crate::migrate::MigrationResult;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Terminal,
}

pub trait OutputWriter {
    fn write_audit(&mut self, report: &AuditReport) -> anyhow::Result<()>;
    fn write_migration(&mut self, result: &MigrationResult) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_audit(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_migration(&mut self, result: &MigrationResult) -> anyhow::Result<()> {
        let value = json!({
            "dry_run": result.dry_run,
            "applied_steps": result.applied,
            "written_files": result.written_files,
            "removed_files": result.removed_files,
            "backup_path": result.backup_path,
            "diffs": result.diffs.iter().map(|d| json!({
                "path": d.path,
                "diff": d.diff,
            })).collect::<Vec<_>>(),
        });
        let json = serde_json::to_string_pretty(&value)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_audit(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Project Audit".bold().blue())?;
        writeln!(self.writer, "{}", "=============".blue())?;
        writeln!(self.writer)?;

        writeln!(
            self.writer,
            "Health score: {} / 100",
            score_colored(report.score.score)
        )?;
        writeln!(self.writer)?;

        writeln!(self.writer, "{}", findings_table(report))?;
        writeln!(self.writer)?;

        if report.signals.total_functions > 0 {
            writeln!(
                self.writer,
                "Type annotation coverage: {:.0}% ({}/{} functions)",
                report.signals.annotation_coverage,
                report.signals.typed_functions,
                report.signals.total_functions
            )?;
            writeln!(self.writer)?;
        }

        if report.score.issues.is_empty() {
            writeln!(self.writer, "{} no issues found", "✓".green())?;
            return Ok(());
        }

        writeln!(
            self.writer,
            "{} ({}):",
            "Issues".bold(),
            report.score.issues.len()
        )?;
        for issue in &report.score.issues {
            writeln!(
                self.writer,
                "  [{}] {}",
                severity_colored(issue.severity),
                issue.message
            )?;
            if let Some(action) = &issue.action {
                writeln!(self.writer, "        run: {}", action.cyan())?;
            }
        }
        Ok(())
    }

    fn write_migration(&mut self, result: &MigrationResult) -> anyhow::Result<()> {
        if result.dry_run {
            writeln!(
                self.writer,
                "{}",
                "Dry run: no files were modified".bold().yellow()
            )?;
            writeln!(self.writer)?;
            for diff in &result.diffs {
                writeln!(self.writer, "{}", diff.path.bold())?;
                writeln!(self.writer, "{}", diff.diff)?;
            }
            writeln!(
                self.writer,
                "{} step(s) would be applied",
                result.applied.len()
            )?;
            return Ok(());
        }

        writeln!(self.writer, "{}", "Migration complete".bold().green())?;
        for step in &result.applied {
            writeln!(self.writer, "  {} {}", "✓".green(), step)?;
        }
        if !result.written_files.is_empty() {
            writeln!(self.writer, "Written: {}", result.written_files.join(", "))?;
        }
        if !result.removed_files.is_empty() {
            writeln!(self.writer, "Removed: {}", result.removed_files.join(", "))?;
        }
        if let Some(backup) = &result.backup_path {
            writeln!(
                self.writer,
                "Backup retained at {}",
                backup.display().to_string().cyan()
            )?;
        }
        Ok(())
    }
}

fn findings_table(report: &AuditReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Category", "Tool", "Confidence", "Signals"]);
    for category in ToolCategory::ALL {
        let finding = report.detection.finding(category);
        let tool = if finding.is_unknown() {
            "—".to_string()
        } else {
            finding.tool.name().to_string()
        };
        table.add_row(vec![
            Cell::new(category.display_name()),
            Cell::new(tool),
            Cell::new(format!("{:.0}%", finding.confidence * 100.0)),
            Cell::new(finding.evidence.len()),
        ]);
    }
    table
}

fn score_colored(score: u8) -> ColoredString {
    let text = score.to_string();
    match score {
        80..=100 => text.green().bold(),
        50..=79 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

fn severity_colored(severity: Severity) -> ColoredString {
    let name = severity.display_name();
    match severity {
        Severity::Critical => name.red().bold(),
        Severity::Error => name.red(),
        Severity::Warning => name.yellow(),
        Severity::Info => name.blue(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DetectionReport, ExtraSignals, Finding, Issue, ScoreReport, Tool};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn sample_report() -> AuditReport {
        let mut findings = BTreeMap::new();
        findings.insert(
            ToolCategory::PackageManager,
            Finding {
                tool: Tool::Poetry,
                confidence: 0.75,
                evidence: vec!["poetry.lock".to_string(), "[tool.poetry]".to_string()],
            },
        );
        AuditReport {
            detection: DetectionReport {
                project_path: PathBuf::from("/p"),
                findings,
            },
            signals: ExtraSignals {
                annotation_coverage: 50.0,
                typed_functions: 5,
                total_functions: 10,
                has_lockfile: true,
                has_ci: false,
                has_pre_commit: false,
            },
            score: ScoreReport {
                score: 87,
                issues: vec![Issue {
                    id: "pm-poetry".to_string(),
                    severity: Severity::Info,
                    category: ToolCategory::PackageManager,
                    message: "Consider migrating from Poetry to uv".to_string(),
                    action: Some("pyforge upgrade . --from-tool poetry".to_string()),
                }],
            },
        }
    }

    #[test]
    fn json_audit_output_is_valid_json() {
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer)
            .write_audit(&sample_report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["score"]["score"], 87);
        assert_eq!(
            value["detection"]["findings"]["package_manager"]["tool"],
            "poetry"
        );
    }

    #[test]
    fn terminal_audit_output_names_score_and_issues() {
        let mut buffer = Vec::new();
        TerminalWriter::new(&mut buffer)
            .write_audit(&sample_report())
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("87"));
        assert!(text.contains("poetry"));
        assert!(text.contains("Consider migrating from Poetry to uv"));
        assert!(text.contains("pyforge upgrade . --from-tool poetry"));
    }

    #[test]
    fn json_migration_output_round_trips() {
        let result = MigrationResult {
            applied: vec!["pm-poetry-convert".to_string()],
            diffs: Vec::new(),
            written_files: vec!["pyproject.toml".to_string()],
            removed_files: vec!["poetry.lock".to_string()],
            backup_path: Some(PathBuf::from(".pyforge_backup_20250101T000000")),
            dry_run: false,
        };
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer).write_migration(&result).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["applied_steps"][0], "pm-poetry-convert");
        assert_eq!(value["removed_files"][0], "poetry.lock");
        assert_eq!(value["dry_run"], false);
    }
}
