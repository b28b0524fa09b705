//! Process-backed [`Collaborator`].
//!
//! Each launch is bounded by the caller's limit. A child that outlives it is killed and
//! reaped before the failure is reported; children of a cancelled case are killed on drop.

use crate::case::CaseSpec;
use crate::collaborator::Collaborator;
use crate::config::HarnessConfig;
use crate::errors::{ProcessFailure, ProcessFailureKind, Stage};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

#[derive(Debug, Clone)]
pub struct ProcessCollaborator {
    pub solver: PathBuf,
    pub solver_args: Vec<String>,
    pub scorer: PathBuf,
    /// Placed before the `<input> <output>` pair.
    pub scorer_args: Vec<String>,
}

impl ProcessCollaborator {
    pub fn new(solver: impl Into<PathBuf>, scorer: impl Into<PathBuf>) -> Self {
        Self {
            solver: solver.into(),
            solver_args: Vec::new(),
            scorer: scorer.into(),
            scorer_args: Vec::new(),
        }
    }

    pub fn with_solver_args(mut self, args: Vec<String>) -> Self {
        self.solver_args = args;
        self
    }

    pub fn with_scorer_args(mut self, args: Vec<String>) -> Self {
        self.scorer_args = args;
        self
    }

    pub fn from_config(cfg: &HarnessConfig) -> Self {
        Self::new(&cfg.solver, &cfg.scorer)
            .with_solver_args(cfg.solver_args.clone())
            .with_scorer_args(cfg.scorer_args.clone())
    }
}

#[async_trait]
impl Collaborator for ProcessCollaborator {
    async fn run_solver(&self, case: &CaseSpec, limit: Duration) -> Result<(), ProcessFailure> {
        let stdin = tokio::fs::File::open(&case.input)
            .await
            .map_err(|e| ProcessFailure::io(Stage::Solver, &case.input, &e))?
            .into_std()
            .await;
        // Truncates whatever a previous run left behind.
        let stdout = tokio::fs::File::create(&case.output)
            .await
            .map_err(|e| ProcessFailure::io(Stage::Solver, &case.output, &e))?
            .into_std()
            .await;

        let mut cmd = Command::new(&self.solver);
        cmd.args(&self.solver_args)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        tracing::debug!(case = %case.id, solver = %self.solver.display(), "launching solver");
        let child = spawn(Stage::Solver, &mut cmd, &self.solver)?;
        wait_bounded(Stage::Solver, child, limit).await
    }

    async fn run_scorer(&self, case: &CaseSpec, limit: Duration) -> Result<String, ProcessFailure> {
        let capture = tempfile::Builder::new()
            .prefix(&format!("pipefile_{}_", case.id))
            .tempfile_in(&case.scratch_dir)
            .map_err(|e| ProcessFailure::io(Stage::Scorer, &case.scratch_dir, &e))?;
        let stdout = capture
            .reopen()
            .map_err(|e| ProcessFailure::io(Stage::Scorer, capture.path(), &e))?;

        let mut cmd = Command::new(&self.scorer);
        cmd.args(&self.scorer_args)
            .arg(&case.input)
            .arg(&case.output)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        tracing::debug!(case = %case.id, scorer = %self.scorer.display(), "launching scorer");
        let child = spawn(Stage::Scorer, &mut cmd, &self.scorer)?;
        wait_bounded(Stage::Scorer, child, limit).await?;

        // `capture` is removed when it drops at the end of this scope.
        tokio::fs::read_to_string(capture.path())
            .await
            .map_err(|e| ProcessFailure::io(Stage::Scorer, capture.path(), &e))
    }
}

fn spawn(stage: Stage, cmd: &mut Command, program: &std::path::Path) -> Result<Child, ProcessFailure> {
    cmd.spawn().map_err(|e| {
        ProcessFailure::new(
            stage,
            ProcessFailureKind::Launch,
            format!("{}: {e}", program.display()),
        )
    })
}

async fn wait_bounded(stage: Stage, mut child: Child, limit: Duration) -> Result<(), ProcessFailure> {
    let waited = tokio::time::timeout(limit, child.wait()).await;
    match waited {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(ProcessFailure::new(
            stage,
            ProcessFailureKind::NonZeroExit,
            status.to_string(),
        )),
        Ok(Err(e)) => Err(ProcessFailure::new(
            stage,
            ProcessFailureKind::Io,
            format!("waiting for child: {e}"),
        )),
        Err(_) => {
            // kill() sends SIGKILL and reaps the child.
            if let Err(e) = child.kill().await {
                tracing::warn!(stage = stage.as_str(), error = %e, "failed to kill timed-out child");
            }
            Err(ProcessFailure::timeout(stage, limit))
        }
    }
}
