use std::env;
use std::path::PathBuf;

use wiregrid_world::EngineConfig;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Scenario document to run
    pub scenario: PathBuf,
    /// Where to write the encoded wire layer afterwards, if anywhere
    pub save_path: Option<PathBuf>,
    /// Engine tuning
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = EngineConfig::default();

        let scenario = env::var("WIREGRID_SCENARIO")
            .unwrap_or_else(|_| "scenario.json".to_string())
            .into();
        let save_path = env::var("WIREGRID_SAVE").ok().map(PathBuf::from);
        let path_budget_ms = env::var("WIREGRID_PATH_BUDGET_MS")
            .unwrap_or_else(|_| defaults.path_budget_ms.to_string())
            .parse()?;
        let max_cascade = env::var("WIREGRID_MAX_CASCADE")
            .unwrap_or_else(|_| defaults.max_cascade.to_string())
            .parse()?;
        let route_margin = env::var("WIREGRID_ROUTE_MARGIN")
            .unwrap_or_else(|_| defaults.route_margin.to_string())
            .parse()?;

        Ok(Self {
            scenario,
            save_path,
            engine: EngineConfig {
                max_cascade,
                path_budget_ms,
                route_margin,
            },
        })
    }
}
