// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Recording executor for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{DeleteOutcome, ResetExecutor, ResetReport};
use crate::error::{Error, Result};

/// Executor that only counts how often it ran.
pub struct RecordingExecutor {
    executions: AtomicUsize,
    /// If true, every execution returns an error.
    pub fail: bool,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingExecutor {
    /// Create an executor that succeeds.
    pub fn new() -> Self {
        Self {
            executions: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Create an executor that fails every time.
    pub fn failing() -> Self {
        Self {
            executions: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Number of executions so far.
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResetExecutor for RecordingExecutor {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn execute(&self) -> Result<ResetReport> {
        self.executions.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(Error::Io(std::io::Error::other("simulated reset failure")));
        }

        Ok(ResetReport::DataWiped {
            entries: DeleteOutcome::NothingToDelete,
            failed: 0,
        })
    }
}
