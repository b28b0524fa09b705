use crate::case::CaseSpec;
use crate::errors::ProcessFailure;
use async_trait::async_trait;
use std::time::Duration;

/// The two external programs a case depends on, treated as opaque subroutines.
///
/// Implementations must stop waiting after `limit` and make sure nothing they started
/// keeps running once they return.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Feeds `case.input` to the solver and leaves its output at `case.output`.
    async fn run_solver(&self, case: &CaseSpec, limit: Duration) -> Result<(), ProcessFailure>;

    /// Scores `(case.input, case.output)` and returns the scorer's raw report.
    async fn run_scorer(&self, case: &CaseSpec, limit: Duration) -> Result<String, ProcessFailure>;
}
