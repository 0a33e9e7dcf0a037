// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Table-backed token store.
//!
//! Applied tokens are appended to `reset_token` in the Grafana database. A
//! token is "stored" when a row with exactly that value exists, so every
//! distinct token resets once no matter how often tokens alternate.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::Executor;
use tracing::debug;

use super::{ResetToken, TokenStore};
use crate::database::SharedConnection;
use crate::error::Result;

/// DDL for the tracking table, safe to run repeatedly.
const SCHEMA: &str = include_str!("../../migrations/reset_token.sql");

/// A token recorded in the tracking table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AppliedToken {
    /// The token value.
    pub token: String,
    /// When the token was recorded.
    pub applied_at: Option<NaiveDateTime>,
}

/// Stores applied tokens as rows of the `reset_token` table.
#[derive(Clone)]
pub struct TableTokenStore {
    conn: SharedConnection,
}

impl TableTokenStore {
    /// Create a store on a connection to the application database.
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Create the tracking table if it does not exist.
    pub async fn ensure_table(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        conn.execute(sqlx::raw_sql(SCHEMA)).await?;
        Ok(())
    }

    /// All recorded tokens, newest first. Empty if the table does not exist.
    pub async fn history(&self) -> Result<Vec<AppliedToken>> {
        if !self.table_exists("public.reset_token").await? {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.lock().await;
        let rows = sqlx::query_as::<_, AppliedToken>(
            r#"
            SELECT token, applied_at
            FROM reset_token
            ORDER BY applied_at DESC NULLS LAST, token
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    async fn table_exists(&self, qualified_name: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(qualified_name)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl TokenStore for TableTokenStore {
    fn describe(&self) -> String {
        "table:reset_token".to_string()
    }

    /// Grafana's `user` table marks an initialized installation.
    async fn application_initialized(&self) -> Result<bool> {
        self.table_exists(r#"public."user""#).await
    }

    async fn get(&self, candidate: &ResetToken) -> Result<Option<ResetToken>> {
        if !self.table_exists("public.reset_token").await? {
            debug!("reset_token table does not exist yet");
            return Ok(None);
        }

        let mut conn = self.conn.lock().await;
        let found: Option<String> =
            sqlx::query_scalar("SELECT token FROM reset_token WHERE token = $1")
                .bind(candidate.as_str())
                .fetch_optional(&mut *conn)
                .await?;

        Ok(found.and_then(ResetToken::new))
    }

    async fn set(&self, token: &ResetToken) -> Result<()> {
        self.ensure_table().await?;

        let mut conn = self.conn.lock().await;
        sqlx::query(
            r#"
            INSERT INTO reset_token (token)
            VALUES ($1)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(token.as_str())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
