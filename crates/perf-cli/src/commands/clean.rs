use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use perf_sweep::{CheckpointStore, SweepConfig};

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// YAML sweep configuration.
    #[arg(long)]
    pub config: PathBuf,
}

pub fn run(args: &CleanArgs) -> Result<(), Box<dyn Error>> {
    let config = SweepConfig::load(&args.config)?;
    let store = CheckpointStore::for_config(&config);
    let path = store.path_for(&config);
    if store.discard(&config)? {
        println!("removed {}", path.display());
    } else {
        println!("no checkpoint at {}", path.display());
    }
    Ok(())
}
