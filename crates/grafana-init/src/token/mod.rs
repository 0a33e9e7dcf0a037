// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reset token tracking.
//!
//! An operator-supplied reset token requests a destructive reset whenever it
//! differs from the last token applied. The tracker compares the candidate
//! token against a [`TokenStore`], runs a [`ResetExecutor`] on change, and
//! records the candidate afterwards, so each distinct token value triggers
//! at most one reset.
//!
//! ```text
//!   candidate ──► empty? ──yes──► NoTokenProvided
//!                   │no
//!                   ▼
//!   store.get() ──► equal? ──yes──► TokenUnchanged
//!                   │no / absent
//!                   ▼
//!              TokenChanged ──► executor.execute() ──► store.set(candidate)
//! ```

mod file;
mod memory;
mod table;

pub use self::file::FileTokenStore;
pub use self::memory::MemoryTokenStore;
pub use self::table::{AppliedToken, TableTokenStore};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::reset::{ResetExecutor, ResetReport};

/// A non-empty reset token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResetToken(String);

impl ResetToken {
    /// Create a token, returning `None` when the value is empty.
    ///
    /// The value is kept byte for byte.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistent record of the last applied reset token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Human-readable location of the store, for logging.
    fn describe(&self) -> String;

    /// Whether the host application has initialized its own state.
    ///
    /// When false the application's first-run bootstrap sets the initial
    /// state and no reset is performed.
    async fn application_initialized(&self) -> Result<bool> {
        Ok(true)
    }

    /// Look up the stored token relevant to `candidate`.
    ///
    /// Single-value stores return whatever they hold. Keyed stores return
    /// `Some(candidate)` when it has been applied before and `None` otherwise.
    async fn get(&self, candidate: &ResetToken) -> Result<Option<ResetToken>>;

    /// Record `token` as applied.
    async fn set(&self, token: &ResetToken) -> Result<()>;
}

/// The three states of the reset token state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No candidate token; nothing is read or written.
    NoTokenProvided,
    /// Candidate equals the stored token.
    TokenUnchanged,
    /// Candidate differs from the stored token, or nothing is stored yet.
    TokenChanged,
}

impl TokenState {
    /// Decide the state from a candidate and the stored value.
    pub fn evaluate(candidate: Option<&ResetToken>, stored: Option<&ResetToken>) -> Self {
        match (candidate, stored) {
            (None, _) => Self::NoTokenProvided,
            (Some(c), Some(s)) if c == s => Self::TokenUnchanged,
            (Some(_), _) => Self::TokenChanged,
        }
    }
}

/// Result of one tracker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerOutcome {
    /// No token was supplied.
    NoTokenProvided,
    /// The application has no state yet; its own bootstrap is trusted.
    ApplicationNotInitialized,
    /// The token was already applied.
    Unchanged,
    /// The reset ran and the token was recorded.
    Reset {
        /// Previously stored token, if the store holds one.
        previous: Option<ResetToken>,
        /// What the executor did.
        report: ResetReport,
    },
}

impl TrackerOutcome {
    /// Returns true if a reset was performed.
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset { .. })
    }
}

/// Drives the reset token state machine against a store and an executor.
pub struct ResetTracker {
    store: Arc<dyn TokenStore>,
    executor: Arc<dyn ResetExecutor>,
}

impl ResetTracker {
    /// Create a tracker.
    pub fn new(store: Arc<dyn TokenStore>, executor: Arc<dyn ResetExecutor>) -> Self {
        Self { store, executor }
    }

    /// Run the state machine once for `candidate`.
    ///
    /// The executor runs before the token is recorded: if the reset fails the
    /// error propagates and the next run retries it.
    pub async fn run(&self, candidate: Option<&ResetToken>) -> Result<TrackerOutcome> {
        let Some(candidate) = candidate else {
            info!("No reset token provided - skipping reset logic");
            return Ok(TrackerOutcome::NoTokenProvided);
        };

        info!(
            token = %candidate,
            store = %self.store.describe(),
            "Reset token provided"
        );

        if !self.store.application_initialized().await? {
            info!("Application not initialized yet - skipping reset, first-run bootstrap applies");
            return Ok(TrackerOutcome::ApplicationNotInitialized);
        }

        let stored = self.store.get(candidate).await?;

        match TokenState::evaluate(Some(candidate), stored.as_ref()) {
            TokenState::NoTokenProvided => return Ok(TrackerOutcome::NoTokenProvided),
            TokenState::TokenUnchanged => {
                info!(token = %candidate, "Reset token unchanged - no reset needed");
                return Ok(TrackerOutcome::Unchanged);
            }
            TokenState::TokenChanged => match &stored {
                Some(previous) => info!(
                    previous = %previous,
                    token = %candidate,
                    executor = self.executor.name(),
                    "Reset token changed - running reset"
                ),
                None => info!(
                    token = %candidate,
                    executor = self.executor.name(),
                    "First time with reset token - running reset"
                ),
            },
        }

        let report = self.executor.execute().await?;
        self.store.set(candidate).await?;

        info!(token = %candidate, report = ?report, "Reset complete, token recorded");

        Ok(TrackerOutcome::Reset {
            previous: stored,
            report,
        })
    }
}
