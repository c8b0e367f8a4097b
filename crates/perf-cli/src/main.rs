use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    clean::{self, CleanArgs},
    plan::{self, PlanArgs},
    run::{self, RunArgs},
    status::{self, StatusArgs},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "perf-sweep", about = "Resumable configuration sweeps for inference benchmarks")]
struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every objective the configuration expands to.
    Plan(PlanArgs),
    /// Measure every objective missing from the checkpoint.
    Run(RunArgs),
    /// Summarise the stored checkpoint.
    Status(StatusArgs),
    /// Discard the stored checkpoint.
    Clean(CleanArgs),
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::debug!(command = ?cli.command, "parsed arguments");
    match cli.command {
        Command::Plan(args) => plan::run(&args),
        Command::Run(args) => run::run(&args),
        Command::Status(args) => status::run(&args),
        Command::Clean(args) => clean::run(&args),
    }
}
