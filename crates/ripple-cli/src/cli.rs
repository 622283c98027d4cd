use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ripple_diff::DuplicatePolicy;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "ripple",
    about = "Ripple -- identity-keyed collection diffing",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format; defaults to the config file's `default_format`
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Config file; defaults to ./ripple.toml when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the edit script between two JSON snapshots
    Diff(DiffArgs),
    /// Report duplicate ids in a JSON snapshot
    Check(CheckArgs),
    /// Drive a collection through a list of load steps
    Replay(ReplayArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    /// Treat both files as sectioned snapshots
    #[arg(long)]
    pub sections: bool,
    /// Duplicate id handling: panic, degrade, or reject
    #[arg(long)]
    pub policy: Option<DuplicatePolicy>,
}

#[derive(Args)]
pub struct CheckArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub sections: bool,
}

#[derive(Args)]
pub struct ReplayArgs {
    pub steps: PathBuf,
    /// Enforce the load-cycle transition graph
    #[arg(long)]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_diff() {
        let cli = Cli::try_parse_from(["ripple", "diff", "a.json", "b.json"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.old, PathBuf::from("a.json"));
            assert_eq!(args.new, PathBuf::from("b.json"));
            assert!(!args.sections);
            assert!(args.policy.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_diff_sections_with_policy() {
        let cli = Cli::try_parse_from([
            "ripple", "diff", "--sections", "--policy", "degrade", "a.json", "b.json",
        ])
        .unwrap();
        if let Command::Diff(args) = cli.command {
            assert!(args.sections);
            assert_eq!(args.policy, Some(DuplicatePolicy::Degrade));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_bad_policy() {
        assert!(Cli::try_parse_from(["ripple", "diff", "--policy", "ignore", "a", "b"]).is_err());
    }

    #[test]
    fn parse_check() {
        let cli = Cli::try_parse_from(["ripple", "check", "snap.json"]).unwrap();
        assert!(matches!(cli.command, Command::Check(_)));
    }

    #[test]
    fn parse_replay_strict() {
        let cli = Cli::try_parse_from(["ripple", "replay", "--strict", "steps.json"]).unwrap();
        if let Command::Replay(args) = cli.command {
            assert!(args.strict);
            assert_eq!(args.steps, PathBuf::from("steps.json"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "ripple", "check", "x.json", "--verbose", "--format", "json", "--config", "r.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("r.toml")));
    }

    #[test]
    fn format_defaults_to_none() {
        let cli = Cli::try_parse_from(["ripple", "check", "x.json"]).unwrap();
        assert!(cli.format.is_none());
    }
}
