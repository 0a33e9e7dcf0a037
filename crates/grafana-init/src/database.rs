// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database and role provisioning.
//!
//! Both operations check the system catalog first and only then act, so they
//! are safe to repeat. `CREATE DATABASE` has no `IF NOT EXISTS` form and
//! cannot run inside a transaction block, which rules out doing it atomically.

use std::sync::Arc;

use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Error, Result};

/// One connection shared by the token store and reset executor of a run.
pub type SharedConnection = Arc<Mutex<PgConnection>>;

/// Result of [`ensure_database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseOutcome {
    /// The database was created.
    Created,
    /// The database already existed.
    AlreadyExists,
}

/// Result of [`ensure_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOutcome {
    /// The role was created with the given password.
    Created,
    /// The role existed; its password was re-applied.
    PasswordUpdated,
}

/// Open a connection and verify it with a round trip.
///
/// Exactly one attempt is made and failures are returned with their cause.
/// Restarts are left to the container orchestrator.
pub async fn connect(options: PgConnectOptions) -> Result<PgConnection> {
    let mut conn = PgConnection::connect_with(&options).await?;

    let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&mut conn).await?;
    info!(result = row.0, "Database health check passed");

    Ok(conn)
}

/// Wrap `conn` so several components can use it in turn.
pub fn share(conn: PgConnection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// Close `conn` if no other component still holds it.
pub async fn close_shared(conn: SharedConnection) -> Result<()> {
    if let Ok(conn) = Arc::try_unwrap(conn) {
        conn.into_inner().close().await?;
    }
    Ok(())
}

/// Create database `name` if it does not exist. Never drops anything.
pub async fn ensure_database(conn: &mut PgConnection, name: &str) -> Result<DatabaseOutcome> {
    let ident = quote_ident(name)?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

    if exists {
        info!(database = name, "Database already exists");
        return Ok(DatabaseOutcome::AlreadyExists);
    }

    info!(database = name, "Creating database");
    sqlx::raw_sql(&format!("CREATE DATABASE {}", ident))
        .execute(&mut *conn)
        .await?;
    info!(database = name, "Database created");

    Ok(DatabaseOutcome::Created)
}

/// Create login role `name` or, if it exists, reset its password.
///
/// The password is always written, never compared, so rotating the secret
/// outside this process takes effect on the next run.
pub async fn ensure_role(
    conn: &mut PgConnection,
    name: &str,
    password: &str,
) -> Result<RoleOutcome> {
    let ident = quote_ident(name)?;
    let literal = quote_literal(password);

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = $1)")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

    if exists {
        info!(role = name, "Role exists, updating password");
        sqlx::raw_sql(&format!("ALTER ROLE {} WITH LOGIN PASSWORD {}", ident, literal))
            .execute(&mut *conn)
            .await?;
        info!(role = name, "Role password updated");
        return Ok(RoleOutcome::PasswordUpdated);
    }

    info!(role = name, "Creating role");
    sqlx::raw_sql(&format!("CREATE ROLE {} WITH LOGIN PASSWORD {}", ident, literal))
        .execute(&mut *conn)
        .await?;
    info!(role = name, "Role created");

    Ok(RoleOutcome::Created)
}

/// Quote `name` as a SQL identifier.
pub fn quote_ident(name: &str) -> Result<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(Error::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote `value` as a SQL string literal.
///
/// Values containing backslashes use the `E''` form so the result is the same
/// whatever `standard_conforming_strings` is set to.
pub fn quote_literal(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    if value.contains('\\') {
        format!("E'{}'", escaped.replace('\\', "\\\\"))
    } else {
        format!("'{}'", escaped)
    }
}
