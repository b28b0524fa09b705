use crate::cli::args::RunArgs;
use crate::exit_codes;
use anyhow::Context;
use casebench_core::progress::digit_sink;
use casebench_core::report::{self, Summary};
use casebench_core::{CaseRunner, HarnessError, ProcessCollaborator, RunningStatistics, Scheduler};
use std::sync::Arc;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = match args.harness.resolve() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config error: {e:#}");
            return Ok(exit_codes::EXIT_CONFIG_ERROR);
        }
    };
    if !cfg.input_dir.is_dir() {
        eprintln!(
            "config error: input directory not found: {}",
            cfg.input_dir.display()
        );
        return Ok(exit_codes::EXIT_CONFIG_ERROR);
    }
    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating {}", cfg.output_dir.display()))?;

    let collaborator = ProcessCollaborator::from_config(&cfg);
    let runner = CaseRunner::new(Arc::new(collaborator), cfg.timeout());
    let mut scheduler = Scheduler::new(runner, cfg.effective_workers());
    if !args.quiet {
        scheduler = scheduler.with_progress(digit_sink());
    }

    let stats = RunningStatistics::new(cfg.histogram.clone(), cfg.grid.clone());
    let stats = match scheduler.run(cfg.layout().cases(cfg.cases), stats).await {
        Ok(stats) => stats,
        Err(e) => {
            report_abort(&e);
            return Ok(abort_exit_code(&e));
        }
    };

    let total_cases = u64::from(cfg.cases);
    print!("{}", report::render_text(&stats, total_cases, cfg.extremes));

    if let Some(path) = &args.report {
        let summary = Summary::from_stats(&stats, total_cases, cfg.extremes);
        report::write_summary(&summary, path)
            .with_context(|| format!("writing summary to {}", path.display()))?;
        tracing::info!(path = %path.display(), "summary written");
    }

    if args.strict && !stats.failures().is_empty() {
        return Ok(exit_codes::EXIT_CASE_FAILURES);
    }
    Ok(exit_codes::EXIT_SUCCESS)
}

fn report_abort(err: &HarnessError) {
    eprintln!();
    match err {
        HarnessError::Contract { case, failure } => {
            eprintln!("{case} {failure}");
            eprintln!("{}", failure.raw);
        }
        other => eprintln!("run failed: {other}"),
    }
}

/// Exit code for a run that ended without a report.
pub fn abort_exit_code(err: &HarnessError) -> i32 {
    match err {
        HarnessError::Contract { .. } => exit_codes::EXIT_CONTRACT_VIOLATION,
        HarnessError::Config(_) => exit_codes::EXIT_CONFIG_ERROR,
        HarnessError::Worker(_) | HarnessError::Incomplete { .. } | HarnessError::Io(_) => {
            exit_codes::EXIT_INTERNAL_ERROR
        }
    }
}
