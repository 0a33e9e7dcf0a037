// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! File-backed token store.
//!
//! The file holds the literal token text and nothing else. Trailing line
//! terminators are ignored on read so a file written with `echo` matches the
//! bare token.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{ResetToken, TokenStore};
use crate::error::Result;

/// Stores the last applied token in a single plain-text file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn get(&self, _candidate: &ResetToken) -> Result<Option<ResetToken>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(ResetToken::new(content.trim_end_matches(['\r', '\n']))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Token file does not exist");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, token: &ResetToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, token.as_str()).await?;
        debug!(path = %self.path.display(), "Token file written");
        Ok(())
    }
}
