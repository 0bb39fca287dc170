//! Sweeps pool sizes looking for equal-teams counterexamples

use clap::{ArgAction, Parser};
use equal_teams::encoder::EncoderOptions;
use equal_teams::engine::default_threads;
use equal_teams::engine::sat::{Options, SatBackend};
use equal_teams::sweep::{Strategy, Sweep, SweepOptions, Verdict};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Global time limit in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 600)]
    limit: u64,

    /// Solver threads (default: available parallelism).
    #[arg(long, value_name = "INT")]
    threads: Option<usize>,

    /// First pool size.
    #[arg(long, value_name = "INT", default_value_t = 14)]
    start: usize,

    /// Last pool size, inclusive.
    #[arg(long, value_name = "INT", default_value_t = 17)]
    end: usize,

    /// Encode every disjoint pair up front instead of refining.
    #[arg(long)]
    no_cegar: bool,

    /// Smallest allowed value.
    #[arg(long, value_name = "INT", default_value_t = 1, allow_negative_numbers = true)]
    min_value: i64,

    /// Largest allowed value.
    #[arg(long, value_name = "INT", default_value_t = 100)]
    max_value: i64,

    /// Do not add the redundant pruning constraints.
    #[arg(long)]
    no_pruning: bool,

    /// Stop after the first size without a counterexample.
    #[arg(long)]
    stop_on_unsat: bool,

    /// Base seed for the solver portfolio.
    #[arg(long, value_name = "INT", default_value_t = Options::default().seed)]
    seed: u64,

    /// More logging (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            start: self.start,
            end: self.end,
            limit: Duration::from_secs(self.limit),
            strategy: if self.no_cegar {
                Strategy::Static
            } else {
                Strategy::Cegar
            },
            stop_on_unsat: self.stop_on_unsat,
            encoder: EncoderOptions {
                min_value: self.min_value,
                max_value: self.max_value,
                pruning: !self.no_pruning,
                threads: self.threads.unwrap_or_else(default_threads).max(1),
            },
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
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
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.sweep_options();
    println!(
        "searching N = {}..={} over [{}, {}] with {} ({} threads, {} s limit)",
        options.start,
        options.end,
        options.encoder.min_value,
        options.encoder.max_value,
        options.strategy,
        options.encoder.threads,
        options.limit.as_secs()
    );

    let mut last_unsat = None;
    let solver = SatBackend::new(Options { seed: cli.seed });
    let report = Sweep::new(options).run_with(solver, |outcome| {
        println!("{outcome}");
        if outcome.anomaly {
            if let Some(below) = last_unsat {
                println!(
                    "  notable: N={} has a counterexample but N={below} had none",
                    outcome.size
                );
            }
        }
        if matches!(outcome.result, Ok(Verdict::NoCounterexample)) {
            last_unsat = Some(outcome.size);
        }
    });

    match report {
        Ok(report) => {
            match report.threshold() {
                Some(n) => println!("smallest N without a counterexample: {n}"),
                None => println!("no size in range was proven free of counterexamples"),
            }
            println!("total {:.2}s", report.elapsed.as_secs_f64());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
