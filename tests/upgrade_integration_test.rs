mod common;

use common::{project, read_file, write_file};
use indoc::indoc;
use pyforge::detect;
use pyforge::migrate::{
    plan, ExecutorOptions, MigrationExecutor, PlanOutcome, TargetProfile,
};
use std::fs;

fn plan_project(root: &std::path::Path) -> PlanOutcome {
    let report = detect::detect(root).unwrap();
    plan(&report, &TargetProfile::default(), None)
}

fn execute(root: &std::path::Path, options: ExecutorOptions) -> pyforge::migrate::MigrationResult {
    let PlanOutcome::Plan(migration_plan) = plan_project(root) else {
        panic!("expected a migration plan");
    };
    MigrationExecutor::new(root, options)
        .execute(&migration_plan)
        .unwrap()
}

#[test]
fn poetry_project_migrates_end_to_end() {
    let dir = project(&[
        (
            "pyproject.toml",
            indoc! {r#"
                [tool.poetry]
                name = "legacy"
                version = "0.3.0"
                description = "A legacy service"
                authors = ["Ada Lovelace <ada@example.com>"]

                [tool.poetry.dependencies]
                python = "^3.11"
                flask = "^2.0"

                # test configuration
                [tool.pytest.ini_options]
                testpaths = ["tests"]
            "#},
        ),
        ("poetry.lock", "# lock\n"),
    ]);

    let result = execute(dir.path(), ExecutorOptions::default());

    assert!(result
        .applied
        .iter()
        .any(|id| id == "pm-poetry-convert"));
    assert!(!dir.path().join("poetry.lock").exists());

    let text = read_file(dir.path(), "pyproject.toml");
    assert!(text.contains("[project]"));
    assert!(text.contains("name = \"legacy\""));
    assert!(text.contains("requires-python = \">=3.11\""));
    assert!(text.contains("\"flask>=2.0\""));
    assert!(!text.contains("[tool.poetry]"));
    // Unrelated content and comments survive the rewrite.
    assert!(text.contains("# test configuration\n[tool.pytest.ini_options]"));

    // Backup holds the pre-migration bytes.
    let backup = result.backup_path.expect("backup created");
    assert!(fs::read_to_string(backup.join("pyproject.toml"))
        .unwrap()
        .contains("[tool.poetry]"));
    assert_eq!(
        fs::read_to_string(backup.join("poetry.lock")).unwrap(),
        "# lock\n"
    );
}

#[test]
fn pip_project_gains_pyproject_before_requirements_are_removed() {
    let dir = project(&[
        ("requirements.txt", "flask==2.3.0\nrequests>=2.28\n"),
        ("requirements-dev.txt", "pytest\n"),
    ]);

    let PlanOutcome::Plan(migration_plan) = plan_project(dir.path()) else {
        panic!("expected a migration plan");
    };
    // The import step precedes both removals.
    let position = |id: &str| {
        migration_plan
            .steps
            .iter()
            .position(|s| s.id == id)
            .unwrap_or_else(|| panic!("step {id} missing"))
    };
    assert!(position("pm-pip-import") < position("pm-pip-remove-requirements"));
    assert!(position("pm-pip-import") < position("pm-pip-remove-requirements-dev"));

    let result = MigrationExecutor::new(dir.path(), ExecutorOptions::default())
        .execute(&migration_plan)
        .unwrap();

    let text = read_file(dir.path(), "pyproject.toml");
    assert!(text.contains("\"flask==2.3.0\""));
    assert!(text.contains("\"requests>=2.28\""));
    assert!(text.contains("\"pytest\""));
    assert!(!dir.path().join("requirements.txt").exists());
    assert!(!dir.path().join("requirements-dev.txt").exists());
    assert_eq!(
        result.removed_files,
        vec![
            "requirements-dev.txt".to_string(),
            "requirements.txt".to_string()
        ]
    );
}

#[test]
fn dry_run_changes_nothing_on_disk() {
    let dir = project(&[
        (
            "pyproject.toml",
            "[tool.poetry]\nname = \"legacy\"\nversion = \"0.1.0\"\n",
        ),
        ("poetry.lock", "# lock\n"),
    ]);
    let before_pyproject = read_file(dir.path(), "pyproject.toml");

    let result = execute(
        dir.path(),
        ExecutorOptions {
            dry_run: true,
            backup: true,
        },
    );

    assert!(result.dry_run);
    assert!(!result.diffs.is_empty());
    assert_eq!(read_file(dir.path(), "pyproject.toml"), before_pyproject);
    assert!(dir.path().join("poetry.lock").exists());
    // No backup directory appears on a dry run.
    let backups: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with(".pyforge_backup_")
        })
        .collect();
    assert!(backups.is_empty());
}

#[test]
fn second_run_plans_nothing() {
    let dir = project(&[
        (
            "pyproject.toml",
            indoc! {r#"
                [tool.poetry]
                name = "legacy"
                version = "0.1.0"

                [tool.poetry.dependencies]
                python = "^3.11"
            "#},
        ),
        ("poetry.lock", "# lock\n"),
    ]);

    execute(dir.path(), ExecutorOptions::default());

    // After migration the project detects as modern; planning is a no-op.
    assert!(matches!(
        plan_project(dir.path()),
        PlanOutcome::NoMigrationNeeded
    ));
}

#[test]
fn formatter_and_type_checker_migrate_together() {
    let dir = project(&[
        (
            "pyproject.toml",
            indoc! {r#"
                [project]
                name = "app"
                version = "1.0.0"

                [tool.black]
                line-length = 120

                [tool.isort]
                known_first_party = ["app"]

                [tool.mypy]
                strict = true
                python_version = "3.12"
            "#},
        ),
        ("uv.lock", "version = 1\n"),
    ]);

    execute(dir.path(), ExecutorOptions::default());

    let text = read_file(dir.path(), "pyproject.toml");
    assert!(text.contains("line-length = 120"));
    assert!(text.contains("known-first-party = [\"app\"]"));
    assert!(text.contains("typeCheckingMode = \"strict\""));
    assert!(text.contains("pythonVersion = \"3.12\""));
    assert!(!text.contains("[tool.black]"));
    assert!(!text.contains("[tool.isort]"));
    assert!(!text.contains("[tool.mypy]"));
}

#[test]
fn flake8_config_is_translated_then_deleted() {
    let dir = project(&[
        ("pyproject.toml", "[project]\nname = \"app\"\nversion = \"1.0.0\"\n"),
        ("uv.lock", "version = 1\n"),
        (
            ".flake8",
            "[flake8]\nmax-line-length = 110\nignore = E203, W503\n",
        ),
    ]);

    execute(dir.path(), ExecutorOptions::default());

    let text = read_file(dir.path(), "pyproject.toml");
    assert!(text.contains("line-length = 110"));
    assert!(text.contains("\"E203\""));
    assert!(!dir.path().join(".flake8").exists());
}

#[test]
fn failed_transform_leaves_project_intact() {
    // A broken pyproject.toml makes the first parse fail; nothing on disk
    // may change.
    let dir = project(&[
        ("pyproject.toml", "[tool.poetry\nname = broken\n"),
        ("poetry.lock", "# lock\n"),
    ]);
    let report = detect::detect(dir.path()).unwrap();
    // Force the poetry path even though the snapshot skipped the bad file.
    let outcome = plan(
        &report,
        &TargetProfile::default(),
        Some(pyforge::core::Tool::Poetry),
    );
    let PlanOutcome::Plan(migration_plan) = outcome else {
        panic!("expected a migration plan");
    };

    let err = MigrationExecutor::new(dir.path(), ExecutorOptions::default())
        .execute(&migration_plan)
        .unwrap_err();
    assert!(matches!(err, pyforge::core::Error::Parse { .. }));

    assert_eq!(
        read_file(dir.path(), "pyproject.toml"),
        "[tool.poetry\nname = broken\n"
    );
    assert!(dir.path().join("poetry.lock").exists());
}

#[test]
fn no_backup_run_still_commits() {
    let dir = project(&[
        (
            "pyproject.toml",
            "[tool.poetry]\nname = \"legacy\"\nversion = \"0.1.0\"\n",
        ),
        ("poetry.lock", "# lock\n"),
    ]);

    let result = execute(
        dir.path(),
        ExecutorOptions {
            dry_run: false,
            backup: false,
        },
    );

    assert!(result.backup_path.is_none());
    assert!(read_file(dir.path(), "pyproject.toml").contains("[project]"));
}

#[test]
fn setuptools_project_keeps_setup_py() {
    let dir = project(&[
        (
            "setup.cfg",
            indoc! {r#"
                [metadata]
                name = oldstyle
                version = 2.1.0

                [options]
                python_requires = >=3.9
                install_requires =
                    click
            "#},
        ),
        ("setup.py", "from setuptools import setup\nsetup()\n"),
    ]);

    execute(dir.path(), ExecutorOptions::default());

    let text = read_file(dir.path(), "pyproject.toml");
    assert!(text.contains("name = \"oldstyle\""));
    assert!(text.contains("requires-python = \">=3.9\""));
    assert!(text.contains("\"click\""));
    assert!(!dir.path().join("setup.cfg").exists());
    // setup.py is advisory-only and never deleted.
    assert_eq!(
        read_file(dir.path(), "setup.py"),
        "from setuptools import setup\nsetup()\n"
    );
}

#[test]
fn failing_middle_step_preserves_all_target_files() {
    use pyforge::migrate::{MigrationPlan, MigrationStep, PlanContext, StepAction};

    let dir = project(&[
        ("pyproject.toml", "[tool.black]\nline-length = 100\n"),
        ("stale.cfg", "old settings\n"),
        ("extra.txt", "keep me\n"),
    ]);

    // Second of three steps fails: there is no [tool.poetry] to convert.
    let migration_plan = MigrationPlan {
        context: PlanContext {
            project_name: "demo".to_string(),
        },
        steps: vec![
            MigrationStep {
                id: "fmt-black-to-ruff".to_string(),
                description: "black to ruff".to_string(),
                target_files: vec!["pyproject.toml".to_string()],
                reversible: true,
                action: StepAction::BlackToRuff,
            },
            MigrationStep {
                id: "pm-poetry-convert".to_string(),
                description: "convert".to_string(),
                target_files: vec!["pyproject.toml".to_string(), "stale.cfg".to_string()],
                reversible: true,
                action: StepAction::ConvertPoetryMetadata,
            },
            MigrationStep {
                id: "remove-extra".to_string(),
                description: "remove extra.txt".to_string(),
                target_files: vec!["extra.txt".to_string()],
                reversible: true,
                action: StepAction::RemoveFile {
                    path: "extra.txt".to_string(),
                },
            },
        ],
    };

    let err = MigrationExecutor::new(dir.path(), ExecutorOptions::default())
        .execute(&migration_plan)
        .unwrap_err();
    assert!(err.to_string().contains("pm-poetry-convert"));

    // Every target file is byte-identical to its pre-run content.
    assert_eq!(
        read_file(dir.path(), "pyproject.toml"),
        "[tool.black]\nline-length = 100\n"
    );
    assert_eq!(read_file(dir.path(), "stale.cfg"), "old settings\n");
    assert_eq!(read_file(dir.path(), "extra.txt"), "keep me\n");

    // The backup directory exists and holds all three originals.
    let backup = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .find(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with(".pyforge_backup_")
        })
        .expect("backup directory present");
    for name in ["pyproject.toml", "stale.cfg", "extra.txt"] {
        assert_eq!(
            fs::read_to_string(backup.path().join(name)).unwrap(),
            read_file(dir.path(), name)
        );
    }
}

#[test]
fn failed_commit_rolls_back_already_removed_files() {
    // A directory squatting on the pyproject.toml path makes the write fail
    // after the .flake8 removal has already hit the disk. The rollback must
    // bring .flake8 back and surface the write error, not a rollback error.
    let flake8_config = "[flake8]\nmax-line-length = 110\n";
    let dir = project(&[(".flake8", flake8_config)]);
    fs::create_dir(dir.path().join("pyproject.toml")).unwrap();

    let PlanOutcome::Plan(migration_plan) = plan_project(dir.path()) else {
        panic!("expected a migration plan");
    };

    let err = MigrationExecutor::new(dir.path(), ExecutorOptions::default())
        .execute(&migration_plan)
        .unwrap_err();
    assert!(matches!(err, pyforge::core::Error::Io(_)));

    assert_eq!(read_file(dir.path(), ".flake8"), flake8_config);
    assert!(dir.path().join("pyproject.toml").is_dir());
}

#[test]
fn rollback_restores_original_bytes() {
    use pyforge::migrate::BackupSet;

    let dir = project(&[("pyproject.toml", "[tool.poetry]\nname = \"x\"\n")]);
    let backup = BackupSet::create(dir.path(), &["pyproject.toml".to_string()]).unwrap();

    // Simulate a partial commit, then restore.
    write_file(dir.path(), "pyproject.toml", "[project]\nname = \"x\"\n");
    backup.restore().unwrap();

    assert_eq!(
        read_file(dir.path(), "pyproject.toml"),
        "[tool.poetry]\nname = \"x\"\n"
    );
    // The backup directory is retained for the user.
    assert!(backup.path().is_dir());
}
