//! Core vocabulary shared by the detector, scorer, planner, and executor.

pub mod errors;
pub mod types;

pub use errors::{Error, Result};
pub use types::{
    AuditReport, DetectionReport, ExtraSignals, Finding, Issue, ScoreReport, Severity, Tool,
    ToolCategory,
};
