// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bootstrap controller.
//!
//! Runs the selected [`Mode`] once, in order, stopping at the first error.

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::Connection;
use tracing::{info, warn};

use crate::config::{Config, DatabaseSetup, DatasourceProvisioning, Mode};
use crate::database::{self, DatabaseOutcome, RoleOutcome};
use crate::datasource::DatasourceProvisioner;
use crate::error::Result;
use crate::grants;
use crate::reset::{AdminIdentityReset, DataWipe};
use crate::token::{FileTokenStore, ResetTracker, TableTokenStore, TrackerOutcome};

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapReport {
    /// Database mode finished.
    DatabaseSetup {
        database: DatabaseOutcome,
        role: RoleOutcome,
        /// `None` when a token was given but no admin login to reset.
        reset: Option<TrackerOutcome>,
    },
    /// Datasource mode finished.
    DatasourceProvisioning {
        reset: TrackerOutcome,
        /// Path written, `None` when no datasource config was supplied.
        datasource: Option<PathBuf>,
    },
}

/// Runs the init sequence for a loaded [`Config`].
pub struct Bootstrap {
    config: Config,
}

impl Bootstrap {
    /// Create a controller for `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Execute the configured mode to completion.
    pub async fn run(&self) -> Result<BootstrapReport> {
        if !self.config.incomplete_database_vars.is_empty() {
            warn!(
                missing = ?self.config.incomplete_database_vars,
                "Database variables partially set - skipping database setup"
            );
        }

        info!(mode = self.config.mode.name(), "Starting Grafana initialization");

        let report = match &self.config.mode {
            Mode::DatabaseSetup(setup) => run_database_setup(setup).await?,
            Mode::DatasourceProvisioning(ds) => run_datasource_provisioning(ds).await?,
        };

        info!("Grafana initialization complete");
        Ok(report)
    }
}

/// Ensure database, role and grants, then apply the admin reset token.
pub async fn run_database_setup(setup: &DatabaseSetup) -> Result<BootstrapReport> {
    let target = &setup.target;

    info!(
        host = %setup.admin.host,
        port = setup.admin.port,
        admin_database = %setup.admin.database,
        database = %target.name,
        role = %target.user,
        "Connecting to database server"
    );
    let mut admin = database::connect(setup.admin.admin_options()).await?;

    let database = database::ensure_database(&mut admin, &target.name).await?;
    let role = database::ensure_role(&mut admin, &target.user, &target.password).await?;
    admin.close().await?;

    info!(database = %target.name, "Connecting to application database");
    let mut app = database::connect(setup.admin.connect_options(&target.name)).await?;

    grants::grant_privileges(&mut app, &target.name, &target.user).await?;

    let app = database::share(app);
    let reset = match &setup.admin_login {
        Some(login) => {
            let tracker = ResetTracker::new(
                Arc::new(TableTokenStore::new(app.clone())),
                Arc::new(AdminIdentityReset::new(app.clone(), login.clone())),
            );
            let outcome = tracker.run(setup.reset_token.as_ref()).await?;
            if outcome.is_reset() && !setup.admin_password_set {
                warn!(
                    admin_login = %login,
                    "GF_SECURITY_ADMIN_PASSWORD not set - Grafana will recreate the admin with its default password"
                );
            }
            Some(outcome)
        }
        None if setup.reset_token.is_some() => {
            warn!("RESET_TOKEN set but GF_SECURITY_ADMIN_USER missing - skipping admin reset");
            None
        }
        None => {
            info!("No reset token provided - skipping reset logic");
            Some(TrackerOutcome::NoTokenProvided)
        }
    };

    database::close_shared(app).await?;

    Ok(BootstrapReport::DatabaseSetup {
        database,
        role,
        reset,
    })
}

/// Apply the data reset token, then write the datasource file.
pub async fn run_datasource_provisioning(ds: &DatasourceProvisioning) -> Result<BootstrapReport> {
    info!(
        provisioning_dir = %ds.provisioning_dir.display(),
        data_dir = %ds.data_dir.display(),
        token_file = %ds.token_file.display(),
        "Datasource provisioning paths"
    );

    let tracker = ResetTracker::new(
        Arc::new(FileTokenStore::new(&ds.token_file)),
        Arc::new(DataWipe::new(&ds.data_dir)),
    );
    let reset = tracker.run(ds.reset_token.as_ref()).await?;

    let datasource = match &ds.datasource_config {
        Some(config) => Some(
            DatasourceProvisioner::new(&ds.provisioning_dir)
                .write(config)
                .await?,
        ),
        None => {
            warn!("GRAFANA_DATASOURCE_CONFIG not set - skipping datasource provisioning");
            None
        }
    };

    Ok(BootstrapReport::DatasourceProvisioning { reset, datasource })
}
