use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use perf_results::Direction;
use perf_search::ObjectiveGenerator;
use perf_sweep::{CheckpointStore, SweepConfig};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// YAML sweep configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Metric used to pick the best run.
    #[arg(long)]
    pub metric: Option<String>,
    /// Prefer smaller values of `--metric`.
    #[arg(long, requires = "metric")]
    pub minimize: bool,
}

pub fn run(args: &StatusArgs) -> Result<(), Box<dyn Error>> {
    let config = SweepConfig::load(&args.config)?;
    let store = CheckpointStore::for_config(&config);
    let state = store.load(&config)?;
    let restored = state.is_restored();
    let results = state.into_results();
    let total = ObjectiveGenerator::new(config.domain()).count();

    println!("checkpoint: {}", store.path_for(&config).display());
    if !restored {
        println!("no checkpoint; 0/{total} objectives measured");
        return Ok(());
    }
    println!("{}/{total} objectives measured", results.len());

    if let Some(metric) = &args.metric {
        let direction = if args.minimize {
            Direction::Minimize
        } else {
            Direction::Maximize
        };
        match results.best(metric, direction) {
            Ok(record) => println!(
                "best {metric}: {} = {}",
                record.name(),
                record.metric(metric).unwrap_or_default()
            ),
            Err(err) => println!("best {metric}: unavailable ({err})"),
        }
    }

    if !config.constraints.is_empty() {
        let passing = results.passing(&config.constraints).len();
        let failing = results.failing(&config.constraints).len();
        println!("constraints: {passing} passing, {failing} failing");
    }
    Ok(())
}
