//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::WizardConfig;

/// Top-level CLI parser for `task-wizard`.
#[derive(Debug, Parser)]
#[command(name = "task-wizard", version, about = "Execute warehouse task actions step by step")]
pub struct Cli {
    /// Log filter in `EnvFilter` syntax (overrides `TASK_WIZARD_LOG`).
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Base URL of the remote validation service.
    #[arg(long, global = true)]
    pub validation_url: Option<String>,

    /// Record clock, id and validation calls to this cassette.
    #[arg(long, global = true, conflicts_with = "replay")]
    pub record: Option<PathBuf>,

    /// Replay clock, id and validation calls from this cassette.
    #[arg(long, global = true)]
    pub replay: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies flag overrides on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: WizardConfig) -> WizardConfig {
        if let Some(filter) = &self.log {
            config.log_filter.clone_from(filter);
        }
        if let Some(url) = &self.validation_url {
            config.validation_url = Some(url.clone());
        }
        if let Some(path) = &self.record {
            config.record = Some(path.clone());
            config.replay = None;
        }
        if let Some(path) = &self.replay {
            config.replay = Some(path.clone());
            config.record = None;
        }
        config
    }
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the planned actions of a task and what blocks them.
    Status {
        /// Warehouse data file (YAML).
        #[arg(long)]
        data: PathBuf,
        /// Task id.
        #[arg(long)]
        task: String,
    },
    /// Drive one action's wizard with scripted inputs.
    Run {
        /// Warehouse data file (YAML).
        #[arg(long)]
        data: PathBuf,
        /// Task id.
        #[arg(long)]
        task: String,
        /// Action to execute; defaults to the next one in strict order.
        #[arg(long)]
        action: Option<String>,
        /// Input script (YAML list of `scan`, `quantity`, `back`, `skip`,
        /// `confirm`, `complete`, `cancel`).
        #[arg(long)]
        script: PathBuf,
        /// Print each state as JSON.
        #[arg(long)]
        json: bool,
        /// Write the warehouse data, with the recorded facts, to this file
        /// when the script ends. Without it the run leaves no trace.
        #[arg(long, value_name = "PATH")]
        save_to: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::config::WizardConfig;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parses_status_subcommand() {
        let cli = Cli::parse_from(["task-wizard", "status", "--data", "w.yaml", "--task", "T1"]);
        assert!(matches!(cli.command, Command::Status { ref task, .. } if task == "T1"));
    }

    #[test]
    fn parses_run_subcommand() {
        let args = "task-wizard run --data w.yaml --task T1 --script s.yaml --json";
        let cli = Cli::parse_from(args.split_whitespace());
        match cli.command {
            Command::Run { action, script, json, .. } => {
                assert_eq!(action, None);
                assert_eq!(script, PathBuf::from("s.yaml"));
                assert!(json);
            }
            Command::Status { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn record_and_replay_conflict() {
        let args = "task-wizard --record a.yaml --replay b.yaml status --data w --task T1";
        let parsed = Cli::try_parse_from(args.split_whitespace());
        assert!(parsed.is_err());
    }

    #[test]
    fn flags_override_environment() {
        let args = "task-wizard --log debug --replay c.yaml status --data w --task T1";
        let cli = Cli::parse_from(args.split_whitespace());
        let env = WizardConfig { record: Some(PathBuf::from("r.yaml")), ..WizardConfig::default() };
        let config = cli.apply(env);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.replay, Some(PathBuf::from("c.yaml")));
        assert_eq!(config.record, None);
    }
}
