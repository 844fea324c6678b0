//! CLI: plan one or more households from JSON and print the plans as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use u_dose::config::OptimizerConfig;
use u_dose::logging;
use u_dose::planner::{plan_household, plan_households, HouseholdInput};

#[derive(Parser)]
#[command(
    name = "dose-plan",
    about = "Plan culturally adapted medication dose times for households",
    version
)]
struct Args {
    /// Household JSON file: one household object or an array of them
    #[arg(value_name = "HOUSEHOLD")]
    household: PathBuf,

    /// Optimizer configuration JSON; omitted fields take defaults
    #[arg(short = 'c', long = "config", value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write the plan here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Single-line JSON
    #[arg(long = "compact")]
    compact: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HouseholdFile {
    One(Box<HouseholdInput>),
    Many(Vec<HouseholdInput>),
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            OptimizerConfig::from_json_str(&raw)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => OptimizerConfig::default(),
    };

    let raw = fs::read_to_string(&args.household)
        .with_context(|| format!("reading household file {}", args.household.display()))?;
    let households: HouseholdFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing household file {}", args.household.display()))?;

    let plan = match households {
        HouseholdFile::One(input) => serde_json::to_value(plan_household(&input, &config)?)?,
        HouseholdFile::Many(inputs) => serde_json::to_value(plan_households(&inputs, &config)?)?,
    };

    let rendered = if args.compact {
        serde_json::to_string(&plan)?
    } else {
        serde_json::to_string_pretty(&plan)?
    };

    match &args.output {
        Some(path) => fs::write(path, rendered + "\n")
            .with_context(|| format!("writing plan to {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
