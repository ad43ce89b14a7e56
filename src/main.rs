use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use leadflow::{LeadflowConfig, Pipeline};

/// How long to idle between polls when the queue has nothing due.
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cfg = LeadflowConfig::load().context("loading configuration")?;
    init_tracing(&cfg);
    cfg.validate().context("validating configuration")?;

    let pipeline = Pipeline::from_config(&cfg).context("assembling pipeline")?;
    let store_display = if cfg.store_path.is_empty() {
        "<in-memory>"
    } else {
        cfg.store_path.as_str()
    };
    info!(
        store_path = store_display,
        delay_seconds = cfg.delay_seconds,
        batch_size = cfg.batch_size,
        skip_lookup = cfg.skip_lookup,
        "leadflow worker starting"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            batch = pipeline.run_batch() => {
                match batch {
                    Ok(results) if results.is_empty() => {
                        tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                    }
                    Ok(results) => {
                        info!(settled = results.len(), "batch settled");
                    }
                    Err(err) => {
                        error!(error = %err, "batch processing failed");
                        tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                    }
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(cfg: &LeadflowConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if cfg.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
