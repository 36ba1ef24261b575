//! Command-line argument parsing for toolsage
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// toolsage - learn which tools work from an agent's experience log
#[derive(Parser, Debug)]
#[command(name = "toolsage")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Recommend tools and diagnose failures from recorded agent experience", long_about = None)]
pub struct Args {
    /// Configuration file path (~/.toolsage/config.toml by default)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only print results)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recommend a tool for a request
    Recommend {
        /// Experience log (JSON lines)
        #[arg(short, long)]
        log: PathBuf,
        /// Request text
        query: String,
        /// Intent label of the request
        #[arg(short, long, default_value = "general")]
        intent: String,
        /// Seed for exploration sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show recorded statistics for a tool
    Stats {
        #[arg(short, long)]
        log: PathBuf,
        /// Tool name
        tool: String,
        #[arg(short, long, default_value = "general")]
        intent: String,
    },

    /// List error patterns found in the log
    Patterns {
        #[arg(short, long)]
        log: PathBuf,
        /// Include patterns below the confidence floor
        #[arg(long)]
        all: bool,
    },

    /// Match a failure against known error patterns
    Diagnose {
        #[arg(short, long)]
        log: PathBuf,
        /// Request that failed
        query: String,
        /// Error message produced
        #[arg(short, long, default_value = "")]
        error: String,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Default tracing filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "toolsage=info",
            Verbosity::VeryVerbose => "toolsage=debug",
        }
    }

    /// Check if the telemetry summary should be printed
    pub fn show_summary(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        let log = ["toolsage", "patterns", "--log", "x.jsonl"];
        assert_eq!(parse(&log).verbosity(), Verbosity::Normal);

        let quiet = parse(&["toolsage", "-q", "patterns", "--log", "x.jsonl"]);
        assert_eq!(quiet.verbosity(), Verbosity::Quiet);

        let verbose = parse(&["toolsage", "-v", "patterns", "--log", "x.jsonl"]);
        assert_eq!(verbose.verbosity(), Verbosity::Verbose);

        let very = parse(&["toolsage", "patterns", "--log", "x.jsonl", "-vv"]);
        assert_eq!(very.verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_recommend_args() {
        let args = parse(&[
            "toolsage",
            "recommend",
            "--log",
            "exp.jsonl",
            "compute 2+2",
            "--intent",
            "calculation",
            "--seed",
            "7",
        ]);
        match args.command {
            Commands::Recommend {
                log,
                query,
                intent,
                seed,
            } => {
                assert_eq!(log, PathBuf::from("exp.jsonl"));
                assert_eq!(query, "compute 2+2");
                assert_eq!(intent, "calculation");
                assert_eq!(seed, Some(7));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_diagnose_default_error() {
        let args = parse(&["toolsage", "diagnose", "--log", "exp.jsonl", "divide 10 by 0"]);
        match args.command {
            Commands::Diagnose { error, .. } => assert!(error.is_empty()),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Args::try_parse_from(["toolsage"]).is_err());
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Normal.show_summary());
        assert!(Verbosity::Verbose.show_summary());
        assert_eq!(Verbosity::Quiet.log_filter(), "error");
        assert_eq!(Verbosity::VeryVerbose.as_str(), "very_verbose");
    }
}
