//! Real child processes via /bin/sh: timeouts kill, exit codes and empty reports are
//! per-case failures, capture files do not outlive their case.
#![cfg(unix)]

use casebench_core::{
    CaseRunner, CorpusLayout, GridConfig, HarnessError, HistogramConfig, ProcessCollaborator,
    ProcessFailureKind, RunningStatistics, Scheduler, Stage,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn sh(script: &str) -> Vec<String> {
    vec!["-c".into(), script.into()]
}

/// Scorer script: `$1` is the input path, `$2` the solver output path.
fn scorer(script: &str) -> Vec<String> {
    vec!["-c".into(), script.into(), "scorer".into()]
}

fn corpus(dir: &Path, inputs: &[&str]) -> CorpusLayout {
    let layout = CorpusLayout::new(dir.join("in"), dir.join("out"), 4);
    std::fs::create_dir_all(&layout.input_dir).unwrap();
    std::fs::create_dir_all(&layout.output_dir).unwrap();
    for (i, text) in inputs.iter().enumerate() {
        std::fs::write(layout.case(i as u32).input, text).unwrap();
    }
    layout
}

fn collaborator(solver: &str, score: &str) -> ProcessCollaborator {
    ProcessCollaborator::new("/bin/sh", "/bin/sh")
        .with_solver_args(sh(solver))
        .with_scorer_args(scorer(score))
}

fn leftover_captures(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("pipefile_"))
        .count()
}

#[tokio::test]
async fn solver_output_is_scored_and_captures_are_removed() {
    let dir = tempfile::tempdir().unwrap();
    let layout = corpus(dir.path(), &["33 65\n1\n2\n", "40 100\n7\n"]);
    // Score = number of lines the solver echoed back, scaled into the histogram range.
    let collab = collaborator("cat", "echo \"0 0 $(( $(wc -l < \"$2\") * 100000 + 500000 ))\"");
    let runner = CaseRunner::new(Arc::new(collab), Duration::from_secs(10));
    let stats = RunningStatistics::new(HistogramConfig::default(), GridConfig::default());

    let stats = Scheduler::new(runner, 2)
        .run(layout.cases(2), stats)
        .await
        .unwrap();

    assert_eq!(stats.successes(), 2);
    assert_eq!(stats.total(), 800_000 + 700_000);
    assert_eq!(stats.grid().cell(0, 1).count, 1);
    assert_eq!(stats.grid().cell(1, 2).count, 1);
    assert_eq!(
        std::fs::read_to_string(layout.case(0).output).unwrap(),
        "33 65\n1\n2\n"
    );
    assert_eq!(leftover_captures(&layout.output_dir), 0);
}

#[tokio::test]
async fn stale_output_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let layout = corpus(dir.path(), &["31 30\n"]);
    let case = layout.case(0);
    std::fs::write(&case.output, "stale output from an earlier run\n".repeat(50)).unwrap();

    let runner = CaseRunner::new(
        Arc::new(collaborator("echo fresh", "echo 0 0 1")),
        Duration::from_secs(10),
    );
    runner.run(&case).await.unwrap();

    assert_eq!(std::fs::read_to_string(&case.output).unwrap(), "fresh\n");
}

#[tokio::test]
async fn hung_solver_is_killed_at_the_limit() {
    let dir = tempfile::tempdir().unwrap();
    let layout = corpus(dir.path(), &["31 30\n"]);
    let runner = CaseRunner::new(
        Arc::new(collaborator("exec sleep 30", "echo 0 0 1")),
        Duration::from_millis(300),
    );

    let started = Instant::now();
    let failure = runner.run(&layout.case(0)).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Solver);
    assert_eq!(failure.kind, ProcessFailureKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn hung_scorer_is_killed_and_capture_removed() {
    let dir = tempfile::tempdir().unwrap();
    let layout = corpus(dir.path(), &["31 30\n"]);
    let runner = CaseRunner::new(
        Arc::new(collaborator("cat", "exec sleep 30")),
        Duration::from_millis(300),
    );

    let failure = runner.run(&layout.case(0)).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Scorer);
    assert_eq!(failure.kind, ProcessFailureKind::Timeout);
    assert_eq!(leftover_captures(&layout.output_dir), 0);
}

#[tokio::test]
async fn non_zero_exit_is_a_process_failure() {
    let dir = tempfile::tempdir().unwrap();
    let layout = corpus(dir.path(), &["31 30\n"]);
    let runner = CaseRunner::new(
        Arc::new(collaborator("cat", "echo 0 0 5; exit 3")),
        Duration::from_secs(10),
    );

    let failure = runner.run(&layout.case(0)).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Scorer);
    assert_eq!(failure.kind, ProcessFailureKind::NonZeroExit);
}

#[tokio::test]
async fn silent_scorer_is_an_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let layout = corpus(dir.path(), &["31 30\n"]);
    let runner = CaseRunner::new(Arc::new(collaborator("cat", "true")), Duration::from_secs(10));

    let failure = runner.run(&layout.case(0)).await.unwrap_err();

    assert_eq!(failure.kind, ProcessFailureKind::EmptyReport);
}

#[tokio::test]
async fn missing_executable_is_a_launch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let layout = corpus(dir.path(), &["31 30\n"]);
    let collab = ProcessCollaborator::new(dir.path().join("no-such-solver"), "/bin/sh");
    let runner = CaseRunner::new(Arc::new(collab), Duration::from_secs(10));

    let failure = runner.run(&layout.case(0)).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Solver);
    assert_eq!(failure.kind, ProcessFailureKind::Launch);
}

#[tokio::test]
async fn missing_input_is_an_io_failure() {
    let dir = tempfile::tempdir().unwrap();
    let layout = corpus(dir.path(), &[]);
    let runner = CaseRunner::new(
        Arc::new(collaborator("cat", "echo 0 0 1")),
        Duration::from_secs(10),
    );

    let failure = runner.run(&layout.case(0)).await.unwrap_err();

    assert_eq!(failure.kind, ProcessFailureKind::Io);
}

/// Alive means present in /proc and not yet a zombie.
#[cfg(target_os = "linux")]
fn is_alive(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Format: `pid (comm) STATE ...`; comm may contain spaces.
    let state = stat
        .rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next());
    !matches!(state, None | Some("Z") | Some("X"))
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn contract_violation_kills_in_flight_children() {
    let dir = tempfile::tempdir().unwrap();
    let pids = dir.path().join("pids");
    std::fs::create_dir_all(&pids).unwrap();
    let count = 8;
    let mut inputs = vec!["fast\n"];
    inputs.extend(std::iter::repeat("hang\n").take(count - 1));
    let layout = corpus(dir.path(), &inputs);

    // Hanging solvers record their pid, then become `sleep` under the same pid.
    let solver = format!(
        "read kind; if [ \"$kind\" = hang ]; then : > \"{}/$$\"; exec sleep 30; fi; cat",
        pids.display()
    );
    // Give the siblings time to start before breaking the score contract.
    let collab = collaborator(&solver, "sleep 0.5; echo 12 34 bad");
    let runner = CaseRunner::new(Arc::new(collab), Duration::from_secs(20));
    let stats = RunningStatistics::new(HistogramConfig::default(), GridConfig::default());

    let started = Instant::now();
    let err = Scheduler::new(runner, count)
        .run(layout.cases(count as u32), stats)
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Contract { ref case, .. } if case.index == 0));
    assert!(started.elapsed() < Duration::from_secs(10));

    let recorded: Vec<u32> = std::fs::read_dir(&pids)
        .unwrap()
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().to_string_lossy().parse().ok())
        .collect();
    assert!(!recorded.is_empty(), "no sibling solver started");
    // Block the runtime thread: only kills issued before `run` returned count.
    std::thread::sleep(Duration::from_millis(200));
    let survivors: Vec<u32> = recorded.into_iter().filter(|pid| is_alive(*pid)).collect();
    assert!(survivors.is_empty(), "children outlived the run: {survivors:?}");
    assert_eq!(leftover_captures(&layout.output_dir), 0);
}
