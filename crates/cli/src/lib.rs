pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "fieldwise",
    about = "Fieldwise operator CLI",
    long_about = "Inspect Fieldwise configuration, check runtime readiness, and run deterministic estimates.",
    after_help = "Examples:\n  fieldwise doctor --json\n  fieldwise config\n  fieldwise estimate --crop rice --region Punjab --area 2 --offline"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, dataset readability, and LLM credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Estimate yield and profit for a profile without consulting the agronomist")]
    Estimate(commands::estimate::EstimateArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Estimate(args) => commands::estimate::run(&args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
