//! pyforge inspects Python projects, scores their tooling health, and
//! migrates legacy setups (poetry/pip/pipenv/setuptools, black/isort/flake8,
//! mypy) to the modern uv + ruff + basedpyright stack through safe,
//! reversible edits.

pub mod cli;
pub mod commands;
pub mod core;
pub mod detect;
pub mod document;
pub mod io;
pub mod migrate;
pub mod score;

pub use core::{
    AuditReport, DetectionReport, Error, ExtraSignals, Finding, Issue, Result, ScoreReport,
    Severity, Tool, ToolCategory,
};
pub use document::Document;
