use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use riverweb::{
    engine::Engine,
    scenario::{Scenario, ScenarioLoader},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "River food-web population simulator")]
struct Cli {
    /// Path to a scenario YAML file (built-in river scenario when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the number of simulated years
    #[arg(long)]
    years: Option<u64>,

    /// Emit the full simulated history as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::river(),
    };
    let years = scenario.years(cli.years);

    let mut engine = Engine::from_scenario(&scenario)?;
    engine.run(years)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&engine.history_report())?);
        return Ok(());
    }

    println!(
        "Scenario '{}' completed: {} -> {}",
        engine.scenario_name(),
        engine.store().start_year(),
        engine.store().current_year()
    );
    for id in engine.food_web().species_ids() {
        let population = engine.store().get_series_value(id, None).unwrap_or(0);
        println!("  {id:>10}: {population}");
    }
    Ok(())
}
