pub mod config;
pub mod error;
pub mod runner;
pub mod scenario;

use anyhow::Context;
use std::fs;

use crate::config::Config;
use crate::runner::{lit_channels, Runner};
use crate::scenario::Scenario;

/// Run the scenario named by `config`, print its report as JSON and save
/// the wire layer if asked to
pub fn run(config: Config) -> anyhow::Result<()> {
    let text = fs::read_to_string(&config.scenario)
        .with_context(|| format!("reading scenario {}", config.scenario.display()))?;
    let scenario = Scenario::from_json(&text)?;

    let mut runner = Runner::new(config.engine.clone());
    let report = runner.run(scenario)?;

    tracing::info!(
        steps = report.steps.len(),
        tiles = report.tiles.len(),
        lit = %lit_channels(&report),
        "scenario finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = &config.save_path {
        let bytes = runner.world().save_wires()?;
        fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("Saved {} bytes of wire data to {}", bytes.len(), path.display());
    }

    Ok(())
}
