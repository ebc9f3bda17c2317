//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Phase;

/// Content-hash asset revisioning and reference rewriting
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "filever.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print debug output (non-matching patterns, skipped candidates)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run every task in order: version, then replace
    #[command(visible_alias = "r")]
    Run {
        /// Print the final asset map as JSON
        #[arg(long)]
        print_map: bool,
    },

    /// Run only the version tasks
    #[command(visible_alias = "v")]
    Version {
        /// Print the final asset map as JSON
        #[arg(long)]
        print_map: bool,
    },

    /// Validate the config and list the files each task matches
    #[command(visible_alias = "c")]
    Check,
}

impl Commands {
    /// Phases this command executes; `None` for commands that touch no files.
    pub const fn phases(&self) -> Option<&'static [Phase]> {
        match self {
            Self::Run { .. } => Some(&[Phase::Version, Phase::Replace]),
            Self::Version { .. } => Some(&[Phase::Version]),
            Self::Check => None,
        }
    }

    pub const fn print_map(&self) -> bool {
        match self {
            Self::Run { print_map } | Self::Version { print_map } => *print_map,
            Self::Check => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["filever", "-v", "run", "--print-map"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.print_map());
        assert_eq!(cli.command.phases(), Some(&[Phase::Version, Phase::Replace][..]));
        assert_eq!(cli.config, PathBuf::from("filever.toml"));
    }

    #[test]
    fn test_parse_version_and_check() {
        let cli = Cli::try_parse_from(["filever", "version", "-C", "assets.toml"]).unwrap();
        assert_eq!(cli.command.phases(), Some(&[Phase::Version][..]));
        assert_eq!(cli.config, PathBuf::from("assets.toml"));

        let cli = Cli::try_parse_from(["filever", "check"]).unwrap();
        assert!(cli.command.phases().is_none());
        assert!(!cli.command.print_map());
    }

    #[test]
    fn test_replace_is_not_a_command() {
        assert!(Cli::try_parse_from(["filever", "replace"]).is_err());
    }
}
