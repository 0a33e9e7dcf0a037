// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Grafana Init - container entrypoint
//!
//! Loads configuration from the environment, runs the selected mode once and
//! exits. A non-zero exit marks the init container as failed.

use tracing::{error, info, warn};

use lakerunner_grafana_init::{Bootstrap, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lakerunner_grafana_init=info,grafana_init=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(mode = config.mode.name(), "Configuration loaded");

    let report = Bootstrap::new(config).run().await.map_err(|e| {
        error!("Initialization failed: {}", e);
        e
    })?;

    info!(report = ?report, "Grafana init finished");

    Ok(())
}
