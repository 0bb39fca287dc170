//! Checks whether a sequence is an equal-teams counterexample

use clap::{ArgAction, Parser};
use equal_teams::checker::{parse_values, ExampleChecker};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Values, separated by spaces and/or commas (at least 10).
    #[arg(value_name = "INT", required = true, allow_hyphen_values = true)]
    values: Vec<String>,

    /// More logging (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let report = parse_values(&cli.values).and_then(|values| ExampleChecker::new().check(&values));
    match report {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
