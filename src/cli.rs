use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::IMAGE_CUSTOMIZER_VERSION;

#[derive(Parser, Debug)]
#[clap(version = IMAGE_CUSTOMIZER_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,

    /// Path of a file that receives every log record as a JSON line
    #[arg(global = true, long)]
    pub log_file: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the provided configuration
    Validate {
        /// Path to a configuration file
        #[clap(index = 1)]
        config: PathBuf,
    },

    /// Validate the provided configuration and print its resolved storage
    Resolve {
        /// Path to a configuration file
        #[clap(index = 1)]
        config: PathBuf,

        /// Path to save the resolved storage instead of printing it
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Path to save an eventual fatal error
        #[clap(short, long)]
        error: Option<PathBuf>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Validate { .. } => "validate",
            Commands::Resolve { .. } => "resolve",
        }
    }
}

impl Display for Commands {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from(["imagecustomizer", "validate", "config.yaml"]);
        assert_eq!(cli.verbosity, LevelFilter::Info);
        assert!(cli.log_file.is_none());
        assert_eq!(cli.command.to_string(), "validate");

        let cli = Cli::parse_from([
            "imagecustomizer",
            "resolve",
            "config.yaml",
            "-o",
            "resolved.yaml",
            "-v",
            "trace",
            "--log-file",
            "log.jsonl",
        ]);
        assert_eq!(cli.verbosity, LevelFilter::Trace);
        assert_eq!(cli.log_file, Some(PathBuf::from("log.jsonl")));
        match cli.command {
            Commands::Resolve {
                config,
                output,
                error,
            } => {
                assert_eq!(config, PathBuf::from("config.yaml"));
                assert_eq!(output, Some(PathBuf::from("resolved.yaml")));
                assert!(error.is_none());
            }
            _ => panic!("expected resolve command"),
        }
    }
}
