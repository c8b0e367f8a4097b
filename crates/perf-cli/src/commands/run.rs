use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use perf_sweep::{CheckpointStore, CommandMeasurer, FailurePolicy, RunOpts, Sweep, SweepConfig};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML sweep configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Program invoked once per objective.
    #[arg(long)]
    pub measure: PathBuf,
    /// Argument passed to the measurement program (repeatable).
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,
    /// Discard any existing checkpoint first.
    #[arg(long)]
    pub clean: bool,
    /// Stop after this many measurements.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Store failed measurements instead of retrying them on the next run.
    #[arg(long)]
    pub record_failures: bool,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let config = SweepConfig::load(&args.config)?;
    let sweep = Sweep::new(&config, CheckpointStore::for_config(&config));
    let mut measurer = CommandMeasurer::new(&args.measure).args(&args.args);
    let opts = RunOpts {
        clean: args.clean,
        limit: args.limit,
        failure_policy: if args.record_failures {
            FailurePolicy::Record
        } else {
            FailurePolicy::Skip
        },
        ..RunOpts::from_config(&config)
    };

    let outcome = sweep.run(&mut measurer, &opts)?;
    println!(
        "measured={} skipped={} failed={} remaining={} records={}",
        outcome.measured,
        outcome.skipped,
        outcome.failed,
        outcome.remaining,
        outcome.results.len()
    );
    println!("checkpoint: {}", sweep.store().path_for(&config).display());
    Ok(())
}
