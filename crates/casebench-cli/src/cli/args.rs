use anyhow::Context;
use casebench_core::HarnessConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG: &str = "casebench.yaml";

#[derive(Parser)]
#[command(
    name = "casebench",
    version,
    about = "Parallel benchmark harness: run a solver over every case, score it, summarize"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every case and print the score report
    Run(RunArgs),
    /// Print the effective configuration as YAML
    Config(ConfigArgs),
    Version,
}

/// Run parameters shared by `run` and `config`. Flags override the config file.
#[derive(clap::Args, Clone, Debug)]
pub struct HarnessArgs {
    /// YAML config file; built-in defaults apply when the default file is absent
    #[arg(long, default_value = DEFAULT_CONFIG, env = "CASEBENCH_CONFIG")]
    pub config: PathBuf,

    /// Number of cases (ids 0..cases)
    #[arg(long, env = "CASEBENCH_CASES")]
    pub cases: Option<u32>,

    /// Per-process wall-clock limit in seconds
    #[arg(long, env = "CASEBENCH_TIMEOUT")]
    pub timeout: Option<f64>,

    /// Concurrent cases (default: cores - 2, at least 1)
    #[arg(long, short = 'j', env = "CASEBENCH_WORKERS")]
    pub workers: Option<usize>,

    #[arg(long)]
    pub solver: Option<PathBuf>,

    /// Extra solver argument; repeat for several
    #[arg(long = "solver-arg", allow_hyphen_values = true)]
    pub solver_args: Vec<String>,

    #[arg(long)]
    pub scorer: Option<PathBuf>,

    /// Scorer argument placed before `<input> <output>`; repeat for several
    #[arg(long = "scorer-arg", allow_hyphen_values = true)]
    pub scorer_args: Vec<String>,

    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// How many best and worst cases to list
    #[arg(long)]
    pub extremes: Option<usize>,
}

impl HarnessArgs {
    /// Defaults, then the config file, then flags. The result is validated.
    pub fn resolve(&self) -> anyhow::Result<HarnessConfig> {
        let mut cfg = if self.config.exists() {
            HarnessConfig::load(&self.config)?
        } else if self.config.as_os_str() == DEFAULT_CONFIG {
            HarnessConfig::default()
        } else {
            anyhow::bail!("config file not found: {}", self.config.display());
        };

        if let Some(cases) = self.cases {
            cfg.cases = cases;
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout_secs = timeout;
        }
        if let Some(workers) = self.workers {
            cfg.workers = Some(workers);
        }
        if let Some(solver) = &self.solver {
            cfg.solver = solver.clone();
        }
        if !self.solver_args.is_empty() {
            cfg.solver_args = self.solver_args.clone();
        }
        if let Some(scorer) = &self.scorer {
            cfg.scorer = scorer.clone();
        }
        if !self.scorer_args.is_empty() {
            cfg.scorer_args = self.scorer_args.clone();
        }
        if let Some(dir) = &self.input_dir {
            cfg.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(k) = self.extremes {
            cfg.extremes = k;
        }

        cfg.validate()
            .with_context(|| format!("checking {}", self.config.display()))?;
        Ok(cfg)
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub harness: HarnessArgs,

    /// Write a JSON summary here after a completed run
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit non-zero when any case failed (timeout, crash, empty report)
    #[arg(long)]
    pub strict: bool,

    /// No progress digits on stderr
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub harness: HarnessArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_resolve_to_builtin_config() {
        let cli = Cli::try_parse_from(["casebench", "run", "--config", DEFAULT_CONFIG]).unwrap();
        match cli.cmd {
            Command::Run(args) => {
                assert!(!args.strict);
                assert!(args.report.is_none());
                // Resolved relative to the test's cwd, where no casebench.yaml exists.
                let cfg = args.harness.resolve().unwrap();
                assert_eq!(cfg, HarnessConfig::default());
            }
            _ => panic!("expected Command::Run"),
        }
    }

    #[test]
    fn flags_override_and_repeat() {
        let cli = Cli::try_parse_from([
            "casebench",
            "run",
            "--config",
            DEFAULT_CONFIG,
            "--cases",
            "7",
            "--timeout",
            "6.5",
            "-j",
            "3",
            "--solver-arg=-c",
            "--solver-arg",
            "cat",
            "--strict",
        ])
        .unwrap();
        let Command::Run(args) = cli.cmd else {
            panic!("expected Command::Run");
        };
        assert!(args.strict);
        let cfg = args.harness.resolve().unwrap();
        assert_eq!(cfg.cases, 7);
        assert_eq!(cfg.timeout_secs, 6.5);
        assert_eq!(cfg.workers, Some(3));
        assert_eq!(cfg.solver_args, vec!["-c".to_string(), "cat".to_string()]);
    }

    #[test]
    fn invalid_values_fail_resolution() {
        let cli = Cli::try_parse_from([
            "casebench",
            "config",
            "--config",
            DEFAULT_CONFIG,
            "--cases",
            "0",
        ])
        .unwrap();
        let Command::Config(args) = cli.cmd else {
            panic!("expected Command::Config");
        };
        assert!(args.harness.resolve().is_err());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let cli = Cli::try_parse_from(["casebench", "config", "--config", "nope/missing.yaml"])
            .unwrap();
        let Command::Config(args) = cli.cmd else {
            panic!("expected Command::Config");
        };
        let err = args.harness.resolve().unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn yaml_file_is_layered_under_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.yaml");
        std::fs::write(&path, "cases: 40\ntimeout_secs: 2\nextremes: 1\n").unwrap();
        let cli = Cli::try_parse_from([
            "casebench",
            "config",
            "--config",
            path.to_str().unwrap(),
            "--cases",
            "9",
        ])
        .unwrap();
        let Command::Config(args) = cli.cmd else {
            panic!("expected Command::Config");
        };
        let cfg = args.harness.resolve().unwrap();
        assert_eq!(cfg.cases, 9);
        assert_eq!(cfg.timeout_secs, 2.0);
        assert_eq!(cfg.extremes, 1);
    }
}
