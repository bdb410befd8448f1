use tracing_subscriber::EnvFilter;

use wiregrid_sim::config::Config;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Running scenario {}", config.scenario.display());

    wiregrid_sim::run(config)
}
