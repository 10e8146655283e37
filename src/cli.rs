use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Machine-readable JSON
    Json,
    /// Colored human-readable output (default)
    Terminal,
}

impl From<OutputFormat> for crate::io::output::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => crate::io::output::OutputFormat::Json,
            OutputFormat::Terminal => crate::io::output::OutputFormat::Terminal,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pyforge")]
#[command(about = "Audit Python projects and migrate them to modern tooling", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect a project's tooling and report a health score
    Audit {
        /// Path to the project directory
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Migrate legacy tooling to uv, ruff, and basedpyright
    Upgrade {
        /// Path to the project directory
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the detected package manager (poetry, pip, pipenv, setuptools)
        #[arg(long = "from-tool")]
        from_tool: Option<String>,

        /// Report the changes without writing any file
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Skip the pre-migration backup (disables rollback)
        #[arg(long = "no-backup")]
        no_backup: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_defaults() {
        let cli = Cli::parse_from(["pyforge", "audit", "."]);
        match cli.command {
            Commands::Audit {
                path,
                format,
                output,
            } => {
                assert_eq!(path, PathBuf::from("."));
                assert!(matches!(format, OutputFormat::Terminal));
                assert!(output.is_none());
            }
            other => panic!("expected audit, got {other:?}"),
        }
    }

    #[test]
    fn upgrade_flags() {
        let cli = Cli::parse_from([
            "pyforge",
            "upgrade",
            "/work/project",
            "--from-tool",
            "poetry",
            "--dry-run",
            "--no-backup",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Upgrade {
                path,
                format,
                from_tool,
                dry_run,
                no_backup,
                ..
            } => {
                assert_eq!(path, PathBuf::from("/work/project"));
                assert!(matches!(format, OutputFormat::Json));
                assert_eq!(from_tool.as_deref(), Some("poetry"));
                assert!(dry_run);
                assert!(no_backup);
            }
            other => panic!("expected upgrade, got {other:?}"),
        }
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::parse_from(["pyforge", "audit", ".", "-vv"]);
        assert_eq!(cli.verbosity, 2);
    }
}
