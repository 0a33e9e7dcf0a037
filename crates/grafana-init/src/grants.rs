// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Privilege grants for the application role.
//!
//! Schema-level grants only affect the database the connection is on, so the
//! connection passed here must be open on the application database itself.

use sqlx::PgConnection;
use tracing::{debug, info};

use crate::database::quote_ident;
use crate::error::Result;

/// Statements issued by [`grant_privileges`], in order.
pub fn grant_statements(database: &str, role: &str) -> Result<Vec<String>> {
    let db = quote_ident(database)?;
    let role = quote_ident(role)?;

    Ok(vec![
        format!("GRANT ALL PRIVILEGES ON DATABASE {db} TO {role}"),
        format!("GRANT ALL ON SCHEMA public TO {role}"),
        format!("GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA public TO {role}"),
        format!("GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA public TO {role}"),
        format!("ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL ON TABLES TO {role}"),
        format!("ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL ON SEQUENCES TO {role}"),
    ])
}

/// Grant `role` full access to `database` and to current and future objects
/// in its `public` schema. GRANT is idempotent, so this is safe to repeat.
pub async fn grant_privileges(conn: &mut PgConnection, database: &str, role: &str) -> Result<()> {
    info!(database = database, role = role, "Granting privileges");

    for statement in grant_statements(database, role)? {
        debug!(statement = %statement, "Executing grant");
        sqlx::raw_sql(&statement).execute(&mut *conn).await?;
    }

    info!(database = database, role = role, "Privileges granted");
    Ok(())
}
