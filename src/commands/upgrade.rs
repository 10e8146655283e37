use super::audit::make_writer;
use crate::core::Tool;
use crate::detect;
use crate::io::output::OutputFormat;
use crate::migrate::{plan, ExecutorOptions, MigrationExecutor, PlanOutcome, TargetProfile};
use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;

pub struct UpgradeConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub from_tool: Option<String>,
    pub dry_run: bool,
    pub backup: bool,
}

pub fn handle_upgrade(config: UpgradeConfig) -> Result<()> {
    let from_override = match &config.from_tool {
        Some(name) => match Tool::from_name(name) {
            Some(tool) => Some(tool),
            None => bail!("unknown tool '{name}' for --from-tool"),
        },
        None => None,
    };

    let report = detect::detect(&config.path)
        .with_context(|| format!("failed to inspect project at {}", config.path.display()))?;

    let outcome = plan(&report, &TargetProfile::default(), from_override);
    let migration_plan = match outcome {
        PlanOutcome::Plan(plan) => plan,
        PlanOutcome::NoMigrationNeeded => {
            println!("Nothing to migrate: the project already uses the modern tool set.");
            return Ok(());
        }
    };

    info!(
        "upgrading {} with {} step(s)",
        config.path.display(),
        migration_plan.steps.len()
    );

    let executor = MigrationExecutor::new(
        &config.path,
        ExecutorOptions {
            dry_run: config.dry_run,
            backup: config.backup,
        },
    );
    let result = executor.execute(&migration_plan)?;

    let mut writer = make_writer(config.format, config.output.as_ref())?;
    writer.write_migration(&result)?;
    Ok(())
}
