//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for the
//! `run` and `validate` subcommands, and their argument structs. Every
//! `run` flag has an environment variable equivalent for container
//! deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::logging::LogLevel;

#[derive(Parser)]
#[command(
    name = "correlid",
    version,
    about = "Correlation ID aware HTTP echo server and sidecar proxy",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        correlid run                                   Echo server with default options\n  \
        correlid run -u http://localhost:8080          Forward to an upstream\n  \
        correlid validate correlid.yaml                Check an options file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server
    Run(Box<RunArgs>),

    /// Validate an options file without starting
    Validate(ValidateArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        correlid run                                       Auto-detect ./correlid.yaml\n  \
        correlid run -c options.toml                       Specific options file\n  \
        correlid run -u http://api:8080 -p 8080 --pretty   Sidecar in local dev mode")]
pub struct RunArgs {
    /// Options file path (.yaml, .json, .toml)
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Forward every request to this base URL instead of echoing it
    #[arg(short, long, env = "UPSTREAM_URL")]
    pub upstream: Option<String>,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Upstream timeout in milliseconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = 5000,
        help_heading = "Tuning"
    )]
    pub timeout: u64,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Options file to validate
    #[arg(default_value = "correlid.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_conflicts_with_pretty() {
        let result = Cli::try_parse_from(["correlid", "run", "--json", "--pretty"]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_takes_a_path() {
        let cli = Cli::parse_from(["correlid", "validate", "opts.toml", "--format", "json"]);
        let Some(Commands::Validate(args)) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.config, PathBuf::from("opts.toml"));
        assert!(matches!(args.format, ValidateFormat::Json));
    }
}
