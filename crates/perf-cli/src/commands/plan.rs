use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use perf_sweep::{NamedObjectives, SweepConfig};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// YAML sweep configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Emit one JSON object per objective instead of text.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &PlanArgs) -> Result<(), Box<dyn Error>> {
    let config = SweepConfig::load(&args.config)?;
    let named = NamedObjectives::new(config.domain());
    if !args.json {
        println!("{} objectives", named.len());
    }

    for (name, objective) in named {
        if args.json {
            let line = serde_json::json!({ "run_name": name, "objective": objective });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{name}\t{}", serde_json::to_string(objective.values())?);
        }
    }
    Ok(())
}
