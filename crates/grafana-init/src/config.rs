// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.
//!
//! The init container runs in one of two modes, chosen once from the presence
//! of the `GRAFANA_DB_*` variables:
//!
//! - [`Mode::DatabaseSetup`]: create the Grafana database and role, grant
//!   privileges, and apply the admin reset token (table-tracked).
//! - [`Mode::DatasourceProvisioning`]: apply the data reset token
//!   (file-tracked) and write the datasource provisioning file.

use std::fmt;
use std::path::PathBuf;

use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::token::ResetToken;

/// Default provisioning directory used by Grafana.
pub const DEFAULT_PROVISIONING_DIR: &str = "/etc/grafana/provisioning";

/// Default Grafana data directory.
pub const DEFAULT_DATA_DIR: &str = "/var/lib/grafana";

/// Default location of the file-mode reset token.
pub const DEFAULT_TOKEN_FILE: &str = "/var/lib/grafana/.grafana_reset_token";

const DATABASE_VARS: [&str; 3] = ["GRAFANA_DB_NAME", "GRAFANA_DB_USER", "GRAFANA_DB_PASSWORD"];

/// Init container configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected execution mode.
    pub mode: Mode,
    /// `GRAFANA_DB_*` variables that were missing when only some were set.
    ///
    /// Non-empty means database setup was skipped even though it looked intended.
    pub incomplete_database_vars: Vec<&'static str>,
}

/// Execution mode, selected once at startup.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Ensure the Grafana database, role, and privileges; apply the admin reset.
    DatabaseSetup(DatabaseSetup),
    /// Apply the data reset and write the datasource configuration.
    DatasourceProvisioning(DatasourceProvisioning),
}

impl Mode {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DatabaseSetup(_) => "database-setup",
            Self::DatasourceProvisioning(_) => "datasource-provisioning",
        }
    }
}

/// Settings for [`Mode::DatabaseSetup`].
#[derive(Debug, Clone)]
pub struct DatabaseSetup {
    /// Administrative connection.
    pub admin: PgConfig,
    /// Database and role to ensure.
    pub target: DatabaseTarget,
    /// Candidate reset token for the admin identity.
    pub reset_token: Option<ResetToken>,
    /// Grafana admin login to invalidate when the token changes.
    pub admin_login: Option<String>,
    /// Whether `GF_SECURITY_ADMIN_PASSWORD` was supplied.
    pub admin_password_set: bool,
}

/// Settings for [`Mode::DatasourceProvisioning`].
#[derive(Debug, Clone)]
pub struct DatasourceProvisioning {
    /// Candidate reset token for the data directory.
    pub reset_token: Option<ResetToken>,
    /// Directory wiped on a token change.
    pub data_dir: PathBuf,
    /// File holding the last applied token.
    pub token_file: PathBuf,
    /// Base provisioning directory.
    pub provisioning_dir: PathBuf,
    /// Opaque datasource YAML. `None` when unset.
    pub datasource_config: Option<String>,
}

/// PostgreSQL connection parameters following libpq `PG*` conventions.
#[derive(Clone)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Database used for the administrative connection.
    pub database: String,
    pub ssl_mode: PgSslMode,
}

impl PgConfig {
    /// Connect options for `database` using these credentials.
    pub fn connect_options(&self, database: &str) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(database)
            .ssl_mode(self.ssl_mode);

        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    /// Connect options for the administrative database.
    ///
    /// Statement logging is off: role passwords travel as SQL text here.
    pub fn admin_options(&self) -> PgConnectOptions {
        self.connect_options(&self.database)
            .disable_statement_logging()
    }
}

impl fmt::Debug for PgConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// The application database and the login role scoped to it.
#[derive(Clone)]
pub struct DatabaseTarget {
    pub name: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseTarget")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Database mode (all three required together):
    /// - `GRAFANA_DB_NAME`, `GRAFANA_DB_USER`, `GRAFANA_DB_PASSWORD`
    /// - `PGHOST`, `PGUSER` (required), `PGPASSWORD`
    /// - `PGPORT` (default: 5432), `PGDATABASE` (default: postgres),
    ///   `PGSSLMODE` (default: require)
    /// - `GF_SECURITY_ADMIN_USER`, `GF_SECURITY_ADMIN_PASSWORD`
    ///
    /// Datasource mode:
    /// - `GRAFANA_DATASOURCE_CONFIG`
    /// - `GF_PATHS_PROVISIONING` (default: /etc/grafana/provisioning)
    /// - `GF_PATHS_DATA` (default: /var/lib/grafana)
    /// - `GRAFANA_RESET_TOKEN_FILE` (default: /var/lib/grafana/.grafana_reset_token)
    ///
    /// Both modes read `RESET_TOKEN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let reset_token = lookup("RESET_TOKEN").and_then(ResetToken::new);

        let present: Vec<_> = DATABASE_VARS.iter().map(|k| non_empty(*k)).collect();
        let incomplete_database_vars: Vec<&'static str> =
            if present.iter().all(Option::is_some) || present.iter().all(Option::is_none) {
                Vec::new()
            } else {
                DATABASE_VARS
                    .iter()
                    .zip(&present)
                    .filter(|(_, v)| v.is_none())
                    .map(|(k, _)| *k)
                    .collect()
            };

        if let [Some(name), Some(user), Some(password)] = present.as_slice() {
            let admin = pg_config(&lookup)?;
            let admin_password_set = non_empty("GF_SECURITY_ADMIN_PASSWORD").is_some();

            return Ok(Self {
                mode: Mode::DatabaseSetup(DatabaseSetup {
                    admin,
                    target: DatabaseTarget {
                        name: name.clone(),
                        user: user.clone(),
                        password: password.clone(),
                    },
                    reset_token,
                    admin_login: non_empty("GF_SECURITY_ADMIN_USER"),
                    admin_password_set,
                }),
                incomplete_database_vars,
            });
        }

        let provisioning_dir = PathBuf::from(
            non_empty("GF_PATHS_PROVISIONING").unwrap_or_else(|| DEFAULT_PROVISIONING_DIR.into()),
        );
        let data_dir =
            PathBuf::from(non_empty("GF_PATHS_DATA").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let token_file = PathBuf::from(
            non_empty("GRAFANA_RESET_TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.into()),
        );

        Ok(Self {
            mode: Mode::DatasourceProvisioning(DatasourceProvisioning {
                reset_token,
                data_dir,
                token_file,
                provisioning_dir,
                // Set-but-empty is still a config to write.
                datasource_config: lookup("GRAFANA_DATASOURCE_CONFIG"),
            }),
            incomplete_database_vars,
        })
    }
}

fn pg_config<F>(lookup: &F) -> Result<PgConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

    let host = non_empty("PGHOST").ok_or(ConfigError::Missing("PGHOST"))?;
    let user = non_empty("PGUSER").ok_or(ConfigError::Missing("PGUSER"))?;

    let port: u16 = non_empty("PGPORT")
        .unwrap_or_else(|| "5432".to_string())
        .parse()
        .map_err(|_| ConfigError::Invalid("PGPORT", "must be a valid port number"))?;

    let ssl_mode: PgSslMode = non_empty("PGSSLMODE")
        .unwrap_or_else(|| "require".to_string())
        .parse()
        .map_err(|_| {
            ConfigError::Invalid(
                "PGSSLMODE",
                "must be one of disable, allow, prefer, require, verify-ca, verify-full",
            )
        })?;

    Ok(PgConfig {
        host,
        port,
        user,
        password: non_empty("PGPASSWORD"),
        database: non_empty("PGDATABASE").unwrap_or_else(|| "postgres".to_string()),
        ssl_mode,
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
