pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rentquote",
    about = "Rentquote operator CLI",
    long_about = "Inspect configuration, audit the catalog and rules, and play dialogues offline.",
    after_help = "Examples:\n  rentquote doctor --json\n  rentquote config\n  rentquote simulate --text ユンボ --choose バックホウ --choose 0.25m3"
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
    #[command(about = "Validate config, LINE credentials, catalog, rules and every offered path")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run a dialogue against the configured catalog and print each turn as JSON")]
    Simulate {
        #[arg(long, default_value = "", help = "Free text that opens the dialogue")]
        text: String,
        #[arg(
            long = "choose",
            value_name = "VALUE",
            help = "Option value for the pending step; repeat per step (`__next__` pages)"
        )]
        choices: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Simulate { text, choices } => commands::simulate::run(&text, &choices),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
