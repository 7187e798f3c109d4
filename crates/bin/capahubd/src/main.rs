//! # capahubd: capahub daemon
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging
//! - Build the simulated fleet and compose its devices
//! - Run a full update, then refresh at the configured interval
//! - Stop on Ctrl-C

use anyhow::Context;
use capahub_app::composer::Composer;
use capahubd::config::Config;
use capahubd::fleet::Fleet;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading capahub.toml")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let fleet = Fleet::build(&config, Composer::global()).context("building the fleet")?;

    let mut events = fleet.events().stream();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => tracing::debug!(
                    device = %event.device,
                    namespace = %event.namespace,
                    source = ?event.source,
                    handled = event.handled,
                    "device event"
                ),
                Err(err) => tracing::warn!(error = %err, "event stream lagged"),
            }
        }
    });

    let failures = fleet.update_all().await;
    tracing::info!(devices = fleet.devices().len(), failures, "initial update done");
    fleet.log_summary();

    if !config.polling.enabled {
        tracing::info!("polling disabled, waiting for Ctrl-C");
        tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.poll_interval());
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let failures = fleet.update_all().await;
                if failures > 0 {
                    tracing::warn!(failures, "refresh incomplete");
                }
                fleet.log_summary();
            }
            result = tokio::signal::ctrl_c() => {
                result.context("waiting for Ctrl-C")?;
                tracing::info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}
