use crate::case::{CaseId, CaseSpec, SizeParameters};
use crate::collaborator::Collaborator;
use crate::errors::{ProcessFailure, ProcessFailureKind, Stage};
use std::sync::Arc;
use std::time::Duration;

/// Unparsed result of one case: the scorer's report plus the grouping key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrial {
    pub case: CaseId,
    pub report: String,
    pub size: Option<SizeParameters>,
}

/// Runs one case: solver, then scorer, each under the same limit.
#[derive(Clone)]
pub struct CaseRunner {
    collaborator: Arc<dyn Collaborator>,
    limit: Duration,
}

impl CaseRunner {
    pub fn new(collaborator: Arc<dyn Collaborator>, limit: Duration) -> Self {
        Self {
            collaborator,
            limit,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub async fn run(&self, case: &CaseSpec) -> Result<RawTrial, ProcessFailure> {
        self.collaborator.run_solver(case, self.limit).await?;
        let report = self.collaborator.run_scorer(case, self.limit).await?;

        // A scorer that crashes after printing nothing can still exit 0.
        if report.trim().is_empty() {
            return Err(ProcessFailure::new(
                Stage::Scorer,
                ProcessFailureKind::EmptyReport,
                "scorer produced no output",
            ));
        }

        let size = match SizeParameters::read_from(&case.input).await {
            Ok(Some(size)) => Some(size),
            Ok(None) => {
                tracing::warn!(case = %case.id, "input has no `n m` header; case left out of size grid");
                None
            }
            Err(e) => {
                tracing::warn!(case = %case.id, error = %e, "could not re-read input for size grouping");
                None
            }
        };

        Ok(RawTrial {
            case: case.id,
            report,
            size,
        })
    }
}
