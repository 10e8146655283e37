//! Pure step transforms.
//!
//! Every transform maps one working set to the next. Transforms read only
//! from the working set and the plan context, so applying the same step to
//! the same input always yields the same output.

use super::{FileState, MigrationStep, PlanContext, WorkingSet};
use crate::core::{Error, Result};
use crate::document::Document;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use toml_edit::{Array, InlineTable, Item, Value};

pub const PYPROJECT: &str = "pyproject.toml";

/// What a step does. The executor never inspects these beyond dispatch;
/// semantics live entirely in this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Rewrite `[tool.poetry]` metadata and dependencies as PEP 621.
    ConvertPoetryMetadata,
    /// Mirror requirements.txt (and requirements-dev.txt) into pyproject.
    ImportRequirements,
    /// Mirror Pipfile packages into pyproject.
    ImportPipfile,
    /// Mirror setup.cfg metadata/options into pyproject.
    ConvertSetupCfg,
    /// Advisory only: setup.py cannot be converted mechanically.
    AdviseSetupPy,
    /// Move `[tool.black]` settings into `[tool.ruff]`/`[tool.ruff.format]`.
    BlackToRuff,
    /// Move `[tool.isort]` settings into `[tool.ruff.lint.isort]`.
    IsortToRuff,
    /// Move `.flake8` settings into `[tool.ruff]`/`[tool.ruff.lint]`.
    Flake8ToRuff,
    /// Map `[tool.mypy]`/mypy.ini onto `[tool.basedpyright]`.
    MypyToBasedpyright,
    /// Mark a superseded file for deletion. A no-op when already absent.
    RemoveFile { path: String },
}

pub fn apply_action(
    step: &MigrationStep,
    context: &PlanContext,
    files: &WorkingSet,
) -> Result<WorkingSet> {
    let mut next = files.clone();
    match &step.action {
        StepAction::ConvertPoetryMetadata => convert_poetry(step, &mut next)?,
        StepAction::ImportRequirements => import_requirements(step, context, &mut next)?,
        StepAction::ImportPipfile => import_pipfile(step, context, &mut next)?,
        StepAction::ConvertSetupCfg => convert_setup_cfg(context, &mut next)?,
        StepAction::AdviseSetupPy => {}
        StepAction::BlackToRuff => black_to_ruff(context, &mut next)?,
        StepAction::IsortToRuff => isort_to_ruff(context, &mut next)?,
        StepAction::Flake8ToRuff => flake8_to_ruff(context, &mut next)?,
        StepAction::MypyToBasedpyright => mypy_to_basedpyright(context, &mut next)?,
        StepAction::RemoveFile { path } => {
            next.insert(path.clone(), FileState::Absent);
        }
    }
    Ok(next)
}

// ---------------------------------------------------------------------------
// Working-set helpers
// ---------------------------------------------------------------------------

fn text_of<'a>(files: &'a WorkingSet, path: &str) -> Option<&'a str> {
    files.get(path).and_then(FileState::text)
}

fn parse_doc(files: &WorkingSet, path: &str, step_id: &str) -> Result<Document> {
    let Some(text) = text_of(files, path) else {
        return Err(Error::step_application(
            step_id,
            path,
            format!("{path} not found in project"),
        ));
    };
    Document::parse(text, &PathBuf::from(path))
}

/// Parse the project's pyproject.toml, or start a minimal PEP 621 document
/// when the project has none yet.
fn ensure_pyproject(files: &WorkingSet, context: &PlanContext) -> Result<Document> {
    match text_of(files, PYPROJECT) {
        Some(text) => Document::parse(text, &PathBuf::from(PYPROJECT)),
        None => {
            let mut doc = Document::new();
            doc.set("project.name", Value::from(context.project_name.as_str()));
            doc.set("project.version", Value::from("0.1.0"));
            doc.set("project.requires-python", Value::from(">=3.11"));
            doc.set(
                "build-system.requires",
                Value::Array(string_array(["hatchling"])),
            );
            doc.set("build-system.build-backend", Value::from("hatchling.build"));
            Ok(doc)
        }
    }
}

fn store(files: &mut WorkingSet, path: &str, doc: &Document) {
    files.insert(path.to_string(), FileState::Present(doc.to_string()));
}

fn string_array<I, S>(items: I) -> Array
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut array = Array::new();
    for item in items {
        let item: String = item.into();
        array.push(item);
    }
    array
}

// ---------------------------------------------------------------------------
// Dependency specifier conversion
// ---------------------------------------------------------------------------

/// Convert a Poetry-style specifier to a PEP 440 requirement line.
/// Caret and tilde constraints become `>=`; bare versions become `==`.
fn poetry_spec_to_requirement(name: &str, spec: &str) -> String {
    if spec == "*" {
        return name.to_string();
    }
    if let Some(rest) = spec.strip_prefix('^').or_else(|| spec.strip_prefix('~')) {
        return format!("{name}>={rest}");
    }
    if spec.starts_with(['<', '>', '=', '!']) {
        return format!("{name}{spec}");
    }
    format!("{name}=={spec}")
}

/// Requirement line for one entry of a Poetry/Pipfile dependency table.
/// String specs convert directly; inline tables use their `version` key.
fn table_entry_requirement(name: &str, item: &Item) -> Option<String> {
    if let Some(spec) = item.as_str() {
        return Some(poetry_spec_to_requirement(name, spec));
    }
    if let Some(table) = item.as_table_like() {
        return match table.get("version").and_then(Item::as_str) {
            Some(version) => Some(poetry_spec_to_requirement(name, version)),
            None => Some(name.to_string()),
        };
    }
    None
}

fn dependency_table_to_array(doc: &Document, key_path: &str, skip: &[&str]) -> Array {
    let mut deps = Array::new();
    for name in doc.keys(key_path) {
        if skip.contains(&name.as_str()) {
            continue;
        }
        if let Some(item) = doc.get(&format!("{key_path}.{name}")) {
            if let Some(requirement) = table_entry_requirement(&name, item) {
                deps.push(requirement);
            }
        }
    }
    deps
}

// ---------------------------------------------------------------------------
// Package manager transforms
// ---------------------------------------------------------------------------

fn author_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)\s*<(.+?)>$").expect("valid regex"))
}

fn convert_poetry(step: &MigrationStep, files: &mut WorkingSet) -> Result<()> {
    let mut doc = parse_doc(files, PYPROJECT, &step.id)?;
    if !doc.contains("tool.poetry") {
        return Err(Error::step_application(
            &step.id,
            PYPROJECT,
            "no [tool.poetry] section found",
        ));
    }

    doc.ensure_table("project");

    // Scalar metadata carries over directly.
    for key in ["name", "version", "description", "readme"] {
        if let Some(value) = doc.get_str(&format!("tool.poetry.{key}")) {
            let value = value.to_string();
            doc.set(&format!("project.{key}"), Value::from(value));
        }
    }
    if let Some(license) = doc.get_str("tool.poetry.license") {
        let mut inline = InlineTable::new();
        inline.insert("text", license.into());
        doc.set("project.license", Value::InlineTable(inline));
    }
    for key in ["keywords", "classifiers"] {
        if let Some(item) = doc.get(&format!("tool.poetry.{key}")) {
            let item = item.clone();
            doc.set_item(&format!("project.{key}"), item);
        }
    }

    // "Name <email>" author strings become PEP 621 inline tables.
    if let Some(authors) = doc.get("tool.poetry.authors").and_then(Item::as_array) {
        let mut converted = Array::new();
        for author in authors.iter().filter_map(Value::as_str) {
            let mut inline = InlineTable::new();
            match author_regex().captures(author) {
                Some(caps) => {
                    inline.insert("name", caps[1].trim().into());
                    inline.insert("email", caps[2].into());
                }
                None => {
                    inline.insert("name", author.into());
                }
            }
            converted.push(Value::InlineTable(inline));
        }
        if !converted.is_empty() {
            doc.set("project.authors", Value::Array(converted));
        }
    }

    // Poetry's python constraint becomes requires-python.
    if let Some(python) = doc.get_str("tool.poetry.dependencies.python") {
        let requires = if let Some(rest) = python
            .strip_prefix('^')
            .or_else(|| python.strip_prefix('~'))
        {
            format!(">={rest}")
        } else {
            python.to_string()
        };
        doc.set("project.requires-python", Value::from(requires));
    }

    let deps = dependency_table_to_array(&doc, "tool.poetry.dependencies", &["python"]);
    if !deps.is_empty() {
        doc.set("project.dependencies", Value::Array(deps));
    }

    // Dev dependencies from both the group syntax and the legacy key.
    let mut dev = dependency_table_to_array(&doc, "tool.poetry.group.dev.dependencies", &[]);
    for entry in dependency_table_to_array(&doc, "tool.poetry.dev-dependencies", &[]).iter() {
        dev.push(entry.clone());
    }
    if !dev.is_empty() {
        doc.set("project.optional-dependencies.dev", Value::Array(dev));
    }

    if let Some(scripts) = doc.get("tool.poetry.scripts") {
        let scripts = scripts.clone();
        doc.set_item("project.scripts", scripts);
    }

    doc.set(
        "build-system.requires",
        Value::Array(string_array(["hatchling"])),
    );
    doc.set("build-system.build-backend", Value::from("hatchling.build"));

    doc.remove("tool.poetry");
    store(files, PYPROJECT, &doc);
    Ok(())
}

/// Requirement lines from a requirements file, skipping comments, blank
/// lines, and pip directives (`-r`, `-e`, ...).
fn requirement_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .map(str::to_string)
        .collect()
}

fn import_requirements(
    step: &MigrationStep,
    context: &PlanContext,
    files: &mut WorkingSet,
) -> Result<()> {
    let Some(text) = text_of(files, "requirements.txt") else {
        return Err(Error::step_application(
            &step.id,
            "requirements.txt",
            "requirements.txt not found in project",
        ));
    };
    let deps = requirement_lines(text);

    let mut doc = ensure_pyproject(files, context)?;
    doc.set("project.dependencies", Value::Array(string_array(deps)));

    if let Some(dev_text) = text_of(files, "requirements-dev.txt") {
        let dev = requirement_lines(dev_text);
        if !dev.is_empty() {
            doc.set(
                "project.optional-dependencies.dev",
                Value::Array(string_array(dev)),
            );
        }
    }

    store(files, PYPROJECT, &doc);
    Ok(())
}

fn import_pipfile(
    step: &MigrationStep,
    context: &PlanContext,
    files: &mut WorkingSet,
) -> Result<()> {
    let pipfile = parse_doc(files, "Pipfile", &step.id)?;
    let mut doc = ensure_pyproject(files, context)?;

    let deps = dependency_table_to_array(&pipfile, "packages", &[]);
    if !deps.is_empty() {
        doc.set("project.dependencies", Value::Array(deps));
    }
    let dev = dependency_table_to_array(&pipfile, "dev-packages", &[]);
    if !dev.is_empty() {
        doc.set("project.optional-dependencies.dev", Value::Array(dev));
    }
    if let Some(python) = pipfile.get_str("requires.python_version") {
        doc.set("project.requires-python", Value::from(format!(">={python}")));
    }

    store(files, PYPROJECT, &doc);
    Ok(())
}

fn convert_setup_cfg(context: &PlanContext, files: &mut WorkingSet) -> Result<()> {
    // setup.py-only projects get the advisory step instead; nothing to do.
    let Some(text) = text_of(files, "setup.cfg") else {
        return Ok(());
    };
    let ini = parse_ini(text);
    let mut doc = ensure_pyproject(files, context)?;

    if let Some(metadata) = ini.get("metadata") {
        for key in ["name", "version", "description"] {
            if let Some(value) = metadata.get(key) {
                doc.set(&format!("project.{key}"), Value::from(value.as_str()));
            }
        }
        if let Some(author) = metadata.get("author") {
            let mut inline = InlineTable::new();
            inline.insert("name", author.as_str().into());
            if let Some(email) = metadata.get("author_email") {
                inline.insert("email", email.as_str().into());
            }
            let mut authors = Array::new();
            authors.push(Value::InlineTable(inline));
            doc.set("project.authors", Value::Array(authors));
        }
        if let Some(license) = metadata.get("license") {
            let mut inline = InlineTable::new();
            inline.insert("text", license.as_str().into());
            doc.set("project.license", Value::InlineTable(inline));
        }
    }

    if let Some(options) = ini.get("options") {
        if let Some(python) = options.get("python_requires") {
            doc.set("project.requires-python", Value::from(python.as_str()));
        }
        if let Some(install_requires) = options.get("install_requires") {
            let deps: Vec<String> = install_requires
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            if !deps.is_empty() {
                doc.set("project.dependencies", Value::Array(string_array(deps)));
            }
        }
    }

    store(files, PYPROJECT, &doc);
    Ok(())
}

// ---------------------------------------------------------------------------
// Linter / formatter / type checker transforms
// ---------------------------------------------------------------------------

fn black_to_ruff(context: &PlanContext, files: &mut WorkingSet) -> Result<()> {
    let mut doc = ensure_pyproject(files, context)?;

    let line_length = doc
        .get("tool.black.line-length")
        .and_then(Item::as_integer);
    // Black's default applies when it never set one explicitly.
    if !doc.contains("tool.ruff.line-length") {
        doc.set(
            "tool.ruff.line-length",
            Value::from(line_length.unwrap_or(88)),
        );
    } else if let Some(length) = line_length {
        doc.set("tool.ruff.line-length", Value::from(length));
    }

    // target-version py311 style strings carry over; take the newest when
    // black listed several.
    let target = match doc.get("tool.black.target-version") {
        Some(item) => match item.as_array() {
            Some(array) => array
                .iter()
                .filter_map(Value::as_str)
                .last()
                .map(str::to_string),
            None => item.as_str().map(str::to_string),
        },
        None => None,
    };
    if let Some(target) = target {
        if target.starts_with("py") {
            doc.set("tool.ruff.target-version", Value::from(target));
        }
    }

    doc.set("tool.ruff.format.quote-style", Value::from("double"));
    if let Some(skip) = doc
        .get("tool.black.skip-magic-trailing-comma")
        .and_then(Item::as_bool)
    {
        doc.set(
            "tool.ruff.format.skip-magic-trailing-comma",
            Value::from(skip),
        );
    }

    doc.remove("tool.black");
    store(files, PYPROJECT, &doc);
    Ok(())
}

fn isort_to_ruff(context: &PlanContext, files: &mut WorkingSet) -> Result<()> {
    let mut doc = ensure_pyproject(files, context)?;

    let key_mappings = [
        ("known_first_party", "known-first-party"),
        ("known_third_party", "known-third-party"),
        ("known_local_folder", "known-local-folder"),
    ];
    for (isort_key, ruff_key) in key_mappings {
        if let Some(item) = doc.get(&format!("tool.isort.{isort_key}")) {
            let item = item.clone();
            doc.set_item(&format!("tool.ruff.lint.isort.{ruff_key}"), item);
        }
    }
    for (isort_key, ruff_key) in [
        ("force_single_line", "force-single-line"),
        ("combine_as_imports", "combine-as-imports"),
    ] {
        if let Some(flag) = doc
            .get(&format!("tool.isort.{isort_key}"))
            .and_then(Item::as_bool)
        {
            doc.set(
                &format!("tool.ruff.lint.isort.{ruff_key}"),
                Value::from(flag),
            );
        }
    }

    ensure_lint_select_contains(&mut doc, "I");

    doc.remove("tool.isort");
    store(files, PYPROJECT, &doc);
    Ok(())
}

fn flake8_to_ruff(context: &PlanContext, files: &mut WorkingSet) -> Result<()> {
    let mut doc = ensure_pyproject(files, context)?;

    let flake8: BTreeMap<String, String> = text_of(files, ".flake8")
        .map(parse_ini)
        .and_then(|mut ini| ini.remove("flake8"))
        .unwrap_or_default();

    if let Some(length) = flake8
        .get("max-line-length")
        .and_then(|v| v.parse::<i64>().ok())
    {
        doc.set("tool.ruff.line-length", Value::from(length));
    }
    if let Some(ignored) = flake8.get("ignore") {
        let codes: Vec<String> = ignored
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        doc.set("tool.ruff.lint.ignore", Value::Array(string_array(codes)));
    }
    if let Some(excluded) = flake8.get("exclude") {
        let patterns: Vec<String> = excluded
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        doc.set("tool.ruff.exclude", Value::Array(string_array(patterns)));
    }

    if !doc.contains("tool.ruff.lint.select") {
        doc.set(
            "tool.ruff.lint.select",
            Value::Array(string_array(["E", "F", "W"])),
        );
    }

    store(files, PYPROJECT, &doc);
    Ok(())
}

fn mypy_to_basedpyright(context: &PlanContext, files: &mut WorkingSet) -> Result<()> {
    let mut doc = ensure_pyproject(files, context)?;

    // Prefer [tool.mypy]; fall back to an ini-style mypy.ini.
    let ini_config: BTreeMap<String, String> = text_of(files, "mypy.ini")
        .or_else(|| text_of(files, ".mypy.ini"))
        .map(parse_ini)
        .and_then(|mut ini| ini.remove("mypy"))
        .unwrap_or_default();

    let flag = |key: &str| -> bool {
        doc.get(&format!("tool.mypy.{key}"))
            .and_then(Item::as_bool)
            .unwrap_or_else(|| {
                ini_config
                    .get(key)
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false)
            })
    };

    // Read everything from the source config before mutating the document.
    let mode = if flag("strict") {
        "strict"
    } else if flag("warn_return_any") || flag("disallow_untyped_defs") {
        "standard"
    } else {
        "basic"
    };
    let ignore_missing = flag("ignore_missing_imports");
    let python_version = doc
        .get_str("tool.mypy.python_version")
        .map(str::to_string)
        .or_else(|| ini_config.get("python_version").cloned());

    doc.set("tool.basedpyright.typeCheckingMode", Value::from(mode));
    if let Some(version) = python_version {
        doc.set("tool.basedpyright.pythonVersion", Value::from(version));
    }
    if ignore_missing {
        doc.set("tool.basedpyright.reportMissingImports", Value::from(false));
    }

    doc.remove("tool.mypy");
    store(files, PYPROJECT, &doc);
    Ok(())
}

/// Make sure `tool.ruff.lint.select` exists and includes a rule family.
fn ensure_lint_select_contains(doc: &mut Document, rule: &str) {
    match doc
        .get_mut("tool.ruff.lint.select")
        .and_then(Item::as_array_mut)
    {
        Some(select) => {
            let present = select.iter().filter_map(Value::as_str).any(|r| r == rule);
            if !present {
                select.push(rule);
            }
        }
        None => {
            doc.set(
                "tool.ruff.lint.select",
                Value::Array(string_array(["E", "F", rule])),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Minimal INI reader
// ---------------------------------------------------------------------------

/// Parse ini-style config (.flake8, setup.cfg, mypy.ini) into
/// section -> key -> value. Indented continuation lines append to the
/// previous value with newlines, which is how setuptools encodes lists.
fn parse_ini(text: &str) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut current_section = String::new();
    let mut current_key: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.trim_start().starts_with(['#', ';']) || trimmed.trim().is_empty() {
            continue;
        }
        if let Some(section) = trimmed
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
        {
            current_section = section.to_string();
            current_key = None;
            sections.entry(current_section.clone()).or_default();
            continue;
        }
        let indented = line.starts_with([' ', '\t']);
        if indented {
            if let Some(key) = &current_key {
                if let Some(section) = sections.get_mut(&current_section) {
                    if let Some(value) = section.get_mut(key) {
                        value.push('\n');
                        value.push_str(trimmed.trim());
                    }
                }
            }
            continue;
        }
        if let Some((key, value)) = trimmed.split_once(['=', ':']) {
            let key = key.trim().to_string();
            sections
                .entry(current_section.clone())
                .or_default()
                .insert(key.clone(), value.trim().to_string());
            current_key = Some(key);
        }
    }
    sections
}
