// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Destructive reset actions run when the reset token changes.
//!
//! Two variants exist:
//! - [`DataWipe`]: empty the Grafana data directory so Grafana starts fresh.
//! - [`AdminIdentityReset`]: delete the admin user and its sessions so Grafana
//!   recreates the admin from `GF_SECURITY_ADMIN_*` on its next start.
//!
//! Deletions are best-effort: a missing target is [`DeleteOutcome::NothingToDelete`],
//! not an error. Only unexpected failures (lost connection, permissions) propagate.

mod data_wipe;
mod identity;
mod mock;

pub use self::data_wipe::DataWipe;
pub use self::identity::AdminIdentityReset;
pub use self::mock::RecordingExecutor;

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of a best-effort delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// This many rows or entries were removed.
    Deleted(u64),
    /// The target was absent or empty.
    NothingToDelete,
}

impl DeleteOutcome {
    /// Build an outcome from an affected count.
    pub fn from_count(count: u64) -> Self {
        if count == 0 {
            Self::NothingToDelete
        } else {
            Self::Deleted(count)
        }
    }

    /// Number of items removed.
    pub fn count(&self) -> u64 {
        match self {
            Self::Deleted(n) => *n,
            Self::NothingToDelete => 0,
        }
    }
}

/// What a reset executor did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetReport {
    /// The data directory was emptied.
    DataWiped {
        /// Top-level entries removed.
        entries: DeleteOutcome,
        /// Entries that could not be removed.
        failed: u64,
    },
    /// The admin identity was deleted.
    IdentityInvalidated {
        /// Session/auth-token rows removed.
        sessions: DeleteOutcome,
        /// User rows removed.
        user: DeleteOutcome,
    },
}

/// A destructive action triggered by a changed reset token.
#[async_trait]
pub trait ResetExecutor: Send + Sync {
    /// Name of the executor, for logging.
    fn name(&self) -> &'static str;

    /// Perform the reset.
    async fn execute(&self) -> Result<ResetReport>;
}
