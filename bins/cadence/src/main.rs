use anyhow::Context;
use cadence_config::CadenceConfig;
use cadence_engine::CadenceEngine;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "cadence.toml";

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = CadenceConfig::load_or_default(path.clone())
        .with_context(|| format!("loading config from {path}"))?;

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();

    info!(?config, "starting cadence");

    let engine = CadenceEngine::new(config)?;
    let report = engine.run().context("cadence run aborted")?;

    for worker in &report.workers {
        info!(
            worker = %worker.role,
            turns = worker.turns,
            published = worker.published,
            received = worker.received,
            "worker summary"
        );
    }
    info!(cycles = report.phase.cycles, "all done");
    Ok(())
}
