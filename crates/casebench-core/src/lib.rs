//! Parallel benchmark harness: runs an external solver over a fixed battery of cases,
//! scores each output with an external scorer and folds the scores into run statistics.

pub mod aggregate;
pub mod case;
pub mod collaborator;
pub mod config;
pub mod errors;
pub mod parser;
pub mod pool;
pub mod process;
pub mod progress;
pub mod report;
pub mod runner;

pub use aggregate::RunningStatistics;
pub use case::{CaseId, CaseSpec, CorpusLayout, SizeParameters, TrialOutcome};
pub use collaborator::Collaborator;
pub use config::{GridConfig, HarnessConfig, HistogramConfig};
pub use errors::{
    ConfigError, HarnessError, ParseFailure, ParseFailureKind, ProcessFailure,
    ProcessFailureKind, Stage,
};
pub use pool::Scheduler;
pub use process::ProcessCollaborator;
pub use runner::{CaseRunner, RawTrial};
