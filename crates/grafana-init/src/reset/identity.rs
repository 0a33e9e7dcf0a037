// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Admin identity invalidation.
//!
//! Grafana only applies `GF_SECURITY_ADMIN_PASSWORD` when it creates the admin
//! user. Deleting the user (and its login sessions) makes Grafana recreate it
//! with the configured password on its next start.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{DeleteOutcome, ResetExecutor, ResetReport};
use crate::database::SharedConnection;
use crate::error::{Result, is_undefined_table};

/// Deletes Grafana's admin user and every auth token referencing it.
#[derive(Clone)]
pub struct AdminIdentityReset {
    conn: SharedConnection,
    admin_login: String,
}

impl AdminIdentityReset {
    /// Create an executor for `admin_login` using a connection to the Grafana database.
    pub fn new(conn: SharedConnection, admin_login: impl Into<String>) -> Self {
        Self {
            conn,
            admin_login: admin_login.into(),
        }
    }

    /// Run a delete bound to the admin login, treating a missing table as nothing to delete.
    async fn delete_best_effort(&self, what: &str, sql: &str) -> Result<DeleteOutcome> {
        let mut conn = self.conn.lock().await;
        match sqlx::query(sql)
            .bind(&self.admin_login)
            .execute(&mut *conn)
            .await
        {
            Ok(result) => Ok(DeleteOutcome::from_count(result.rows_affected())),
            Err(e) if is_undefined_table(&e) => {
                debug!(target_rows = what, "Table does not exist, nothing to delete");
                Ok(DeleteOutcome::NothingToDelete)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ResetExecutor for AdminIdentityReset {
    fn name(&self) -> &'static str {
        "admin-identity-reset"
    }

    async fn execute(&self) -> Result<ResetReport> {
        info!(admin_login = %self.admin_login, "Invalidating admin user");

        // Sessions first so none are left pointing at a deleted user.
        let sessions = self
            .delete_best_effort(
                "sessions",
                r#"
                DELETE FROM user_auth_token
                WHERE user_id IN (SELECT id FROM "user" WHERE login = $1)
                "#,
            )
            .await?;

        let user = self
            .delete_best_effort("user", r#"DELETE FROM "user" WHERE login = $1"#)
            .await?;

        info!(
            admin_login = %self.admin_login,
            sessions_deleted = sessions.count(),
            users_deleted = user.count(),
            "Admin user invalidated"
        );

        Ok(ResetReport::IdentityInvalidated { sessions, user })
    }
}
