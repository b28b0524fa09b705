use crate::aggregate::RunningStatistics;
use crate::case::{CaseId, CaseSpec, TrialOutcome};
use crate::errors::{HarnessError, ProcessFailure, ProcessFailureKind, Stage};
use crate::parser;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::runner::{CaseRunner, RawTrial};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Bounded worker pool. Cases run concurrently up to `workers`; outcomes are parsed and
/// folded one at a time on the caller's task as they complete, in no particular order.
pub struct Scheduler {
    runner: CaseRunner,
    workers: usize,
    progress: Option<ProgressSink>,
}

impl Scheduler {
    pub fn new(runner: CaseRunner, workers: usize) -> Self {
        Self {
            runner,
            workers: workers.max(1),
            progress: None,
        }
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every case and returns the folded statistics.
    ///
    /// A [`HarnessError::Contract`] ends the run at once: tasks still in flight are
    /// aborted and awaited, so their child processes are killed before this returns.
    pub async fn run(
        &self,
        cases: Vec<CaseSpec>,
        mut stats: RunningStatistics,
    ) -> Result<RunningStatistics, HarnessError> {
        let total = cases.len();
        let expected = stats.folded() + total as u64;
        tracing::info!(
            cases = total,
            workers = self.workers,
            timeout_ms = self.runner.limit().as_millis() as u64,
            "starting run"
        );

        let sem = Arc::new(Semaphore::new(self.workers));
        let mut join_set: JoinSet<(CaseId, Result<RawTrial, ProcessFailure>)> = JoinSet::new();
        for case in cases {
            let sem = sem.clone();
            let runner = self.runner.clone();
            join_set.spawn(async move {
                let result = match sem.acquire_owned().await {
                    Ok(_permit) => runner.run(&case).await,
                    Err(_) => Err(ProcessFailure::new(
                        Stage::Solver,
                        ProcessFailureKind::Launch,
                        "worker pool closed",
                    )),
                };
                (case.id, result)
            });
        }

        let mut done = 0usize;
        while let Some(joined) = join_set.join_next().await {
            let (case, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    shutdown(&mut join_set).await;
                    return Err(HarnessError::Worker(e.to_string()));
                }
            };

            let outcome = parser::classify(case, result);
            if let TrialOutcome::ParseFailure { case, failure } = outcome {
                tracing::error!(case = %case, kind = %failure.kind, "scorer report violates contract; aborting run");
                shutdown(&mut join_set).await;
                return Err(HarnessError::Contract { case, failure });
            }
            if let TrialOutcome::ProcessFailure { case, failure } = &outcome {
                tracing::warn!(case = %case, %failure, "case failed");
            }

            stats.fold(&outcome);
            done += 1;
            if let Some(sink) = &self.progress {
                sink(ProgressEvent {
                    done,
                    total,
                    case,
                    ok: matches!(outcome, TrialOutcome::Success { .. }),
                });
            }
        }

        if stats.folded() != expected {
            return Err(HarnessError::Incomplete {
                folded: stats.folded(),
                expected,
            });
        }
        tracing::info!(
            scored = stats.successes(),
            failed = stats.failures().len(),
            "run complete"
        );
        Ok(stats)
    }
}

/// Aborts every task and waits until each is dropped. Dropping a task drops its
/// `kill_on_drop` children, so nothing outlives the returned error.
async fn shutdown<T: 'static>(join_set: &mut JoinSet<T>) {
    join_set.abort_all();
    while join_set.join_next().await.is_some() {}
}
