use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};

use rangestat::config::{default_workers, DEFAULT_INPUT, DEFAULT_OUTPUT};
use rangestat::partition::MAX_WORKERS;
use rangestat::{Config, Output, Scheduler};

/// Per-key min/mean/max of a `key;value` file.
#[derive(Parser, Debug)]
#[command(name = "rangestat", version)]
struct Cli {
    /// Input file of `key;value` lines
    #[arg(default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Report destination, `-` for stdout
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: Output,

    /// Number of partitions processed concurrently [default: 2 x CPUs]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=MAX_WORKERS as i64))]
    workers: Option<u32>,

    /// How partitions are scheduled onto threads
    #[arg(long, value_enum, default_value_t = Scheduler::Threads)]
    scheduler: Scheduler,

    /// Memory-map the input instead of reading it through file handles
    #[arg(long)]
    mmap: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .init();

    debug!(?cli, "starting");

    if let Err(e) = run(cli) {
        error!("Fatal error: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config {
        workers: cli.workers.map_or_else(default_workers, |w| w as usize),
        input: cli.input,
        output: cli.output,
        scheduler: cli.scheduler,
        mmap: cli.mmap,
    };
    rangestat::run(&config)
        .with_context(|| format!("summarizing {}", config.input.display()))?;
    Ok(())
}
