//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to [`run`] or
//! [`validate`]. Each handler lives in its own submodule.

pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::CorrelidError;

pub async fn dispatch(cli: Cli) -> Result<(), CorrelidError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args),
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  correlid v{version}: correlation ID middleware host\n\n  \
         No command provided. To get started:\n\n    \
         correlid run                          Start the echo server (auto-detects ./correlid.yaml)\n    \
         correlid run -u http://api:8080       Forward every request to an upstream\n    \
         correlid validate correlid.yaml       Check an options file\n    \
         correlid --help                       See all commands and options\n"
    );
}
