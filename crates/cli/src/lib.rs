pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "prodrev",
    about = "Operator commands for the prodrev product service",
    long_about = "Prepare the product database, check readiness and show where each config \
                  value comes from.",
    after_help = "Examples:\n  prodrev migrate\n  prodrev doctor --json\n  prodrev config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Create or upgrade the products table and print a JSON outcome.
    Migrate,
    /// Print every effective setting with its source (env, file or default).
    Config,
    /// Check config, database reachability and the products table.
    Doctor {
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
}

impl Command {
    fn execute(self) -> CommandResult {
        match self {
            Self::Migrate => commands::migrate::run(),
            Self::Config => CommandResult { exit_code: 0, output: commands::config::run() },
            Self::Doctor { json } => {
                CommandResult { exit_code: 0, output: commands::doctor::run(json) }
            }
        }
    }
}

pub fn run() -> ExitCode {
    let result = Cli::parse().command.execute();
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
