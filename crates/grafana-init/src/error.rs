// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for grafana-init.

use std::path::PathBuf;

use thiserror::Error;

/// Init container errors.
///
/// Every variant is fatal for the current run. Best-effort operations never
/// surface their "nothing to do" cases through this type; see
/// [`crate::reset::DeleteOutcome`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Database operation failed (connectivity, authentication, permissions).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The datasource file was not present after writing it.
    #[error("Datasource file not present after write: {}", .0.display())]
    DatasourceNotWritten(PathBuf),

    /// A database or role name cannot be used as a SQL identifier.
    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Result type using the init container Error.
pub type Result<T> = std::result::Result<T, Error>;

/// SQLSTATE for a reference to a table that does not exist.
pub(crate) const UNDEFINED_TABLE: &str = "42P01";

/// Returns true if `err` is a PostgreSQL `undefined_table` error.
pub(crate) fn is_undefined_table(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNDEFINED_TABLE)
}
