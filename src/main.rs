use anyhow::Result;
use clap::Parser;
use pyforge::cli::{Cli, Commands};
use pyforge::commands::{handle_audit, handle_upgrade, AuditConfig, UpgradeConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Audit {
            path,
            format,
            output,
        } => handle_audit(AuditConfig {
            path,
            format: format.into(),
            output,
        }),
        Commands::Upgrade {
            path,
            format,
            output,
            from_tool,
            dry_run,
            no_backup,
        } => handle_upgrade(UpgradeConfig {
            path,
            format: format.into(),
            output,
            from_tool,
            dry_run,
            backup: !no_backup,
        }),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
