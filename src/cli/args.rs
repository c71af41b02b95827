//! Command line argument parsing
//!
//! Subcommands:
//! - `schedule`: Build a schedule for every task in a task file
//! - `optimal-start`: Find the best start time for a single task
//! - `show-config`: Show configuration discovery information

use crate::schedule::CyclePolicy;
use crate::task::TaskId;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "slotplan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Schedule tasks around working hours, blackouts, dependencies and deadlines")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Schedule every task in a task file and print the schedule as JSON
    Schedule {
        /// Task file (JSON, or TOML by extension)
        file: PathBuf,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Also print schedule analytics
        #[arg(short = 'a', long = "analytics")]
        analytics: bool,
        /// Treat this RFC 3339 instant as "now"
        #[arg(long = "now", value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
        /// Override the configured handling of dependency cycles
        #[arg(long = "cycle-policy", value_enum)]
        cycle_policy: Option<CyclePolicyArg>,
    },
    /// Print the earliest deadline-safe start time for one task
    OptimalStart {
        /// Task file (JSON, or TOML by extension)
        file: PathBuf,
        /// Id of the task to place
        task_id: TaskId,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Treat this RFC 3339 instant as "now"
        #[arg(long = "now", value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
    },
    /// Show configuration discovery information
    ShowConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CyclePolicyArg {
    Tolerate,
    Reject,
}

impl From<CyclePolicyArg> for CyclePolicy {
    fn from(arg: CyclePolicyArg) -> Self {
        match arg {
            CyclePolicyArg::Tolerate => CyclePolicy::Tolerate,
            CyclePolicyArg::Reject => CyclePolicy::Reject,
        }
    }
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Log filter matching the verbosity flag
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "slotplan=debug"
        } else {
            "slotplan=info"
        }
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schedule_command() {
        let args = Args::try_parse_from([
            "slotplan",
            "schedule",
            "tasks.json",
            "--analytics",
            "--now",
            "2026-03-02T09:00:00+01:00",
            "--cycle-policy",
            "reject",
        ])
        .unwrap();
        assert_eq!(args.log_filter(), "slotplan=info");

        match args.command {
            Commands::Schedule {
                file,
                config,
                analytics,
                now,
                cycle_policy,
            } => {
                assert_eq!(file, PathBuf::from("tasks.json"));
                assert!(config.is_none());
                assert!(analytics);
                assert_eq!(now, Some(Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()));
                assert_eq!(cycle_policy.map(CyclePolicy::from), Some(CyclePolicy::Reject));
            }
            other => panic!("Expected schedule command, got {:?}", other),
        }
    }

    #[test]
    fn test_optimal_start_command_with_verbose() {
        let args = Args::try_parse_from([
            "slotplan",
            "optimal-start",
            "tasks.toml",
            "3f0c9a1e-8c1b-4b7e-9d52-0a3c2f7e5b11",
            "-v",
        ])
        .unwrap();

        assert!(matches!(args.command, Commands::OptimalStart { .. }));
        assert_eq!(args.log_filter(), "slotplan=debug");
    }

    #[test]
    fn test_invalid_now_is_rejected() {
        let result = Args::try_parse_from(["slotplan", "schedule", "t.json", "--now", "tomorrow"]);
        assert!(result.is_err());
    }
}
