use crate::case::CaseId;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Which external collaborator a process failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Solver,
    Scorer,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Solver => "solver",
            Stage::Scorer => "scorer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessFailureKind {
    /// Executable could not be started.
    Launch,
    Timeout,
    NonZeroExit,
    /// Scorer exited cleanly but wrote nothing.
    EmptyReport,
    /// Reading/writing a case artifact failed.
    Io,
}

impl ProcessFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::Timeout => "timeout",
            Self::NonZeroExit => "non_zero_exit",
            Self::EmptyReport => "empty_report",
            Self::Io => "io",
        }
    }
}

/// Per-case failure. Recorded, excluded from statistics, never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{} {}: {message}", .stage.as_str(), .kind.as_str())]
pub struct ProcessFailure {
    pub stage: Stage,
    pub kind: ProcessFailureKind,
    pub message: String,
}

impl ProcessFailure {
    pub fn new(stage: Stage, kind: ProcessFailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(stage: Stage, limit: std::time::Duration) -> Self {
        Self::new(
            stage,
            ProcessFailureKind::Timeout,
            format!("killed after {:.3}s", limit.as_secs_f64()),
        )
    }

    pub fn io(stage: Stage, path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::new(
            stage,
            ProcessFailureKind::Io,
            format!("{}: {err}", path.display()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseFailureKind {
    #[error("non-numeric")]
    NonNumeric,
    #[error("missing-field")]
    MissingField,
}

/// Scorer report does not match the field contract. Fatal to the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseFailure {
    pub kind: ParseFailureKind,
    pub raw: String,
}

impl ParseFailure {
    pub fn new(kind: ParseFailureKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Run-level errors. Anything here ends the run without a final report.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("case {case}: scorer report violates contract ({failure})")]
    Contract { case: CaseId, failure: ParseFailure },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("run incomplete: {folded} of {expected} cases produced an outcome")]
    Incomplete { folded: u64, expected: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
