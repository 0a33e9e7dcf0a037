// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory token store for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ResetToken, TokenStore};
use crate::error::Result;

/// Token store holding a single value in memory.
///
/// Counts reads and writes so tests can assert that no-op paths leave the
/// store untouched.
pub struct MemoryTokenStore {
    token: Mutex<Option<ResetToken>>,
    initialized: bool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            token: Mutex::new(None),
            initialized: true,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Create a store already holding `token`.
    pub fn with_token(token: ResetToken) -> Self {
        let store = Self::new();
        *store.lock() = Some(token);
        store
    }

    /// Report the host application as not yet initialized.
    pub fn uninitialized(mut self) -> Self {
        self.initialized = false;
        self
    }

    /// Currently stored token.
    pub fn current(&self) -> Option<ResetToken> {
        self.lock().clone()
    }

    /// Number of `get` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ResetToken>> {
        // A poisoned lock only means another test thread panicked.
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn application_initialized(&self) -> Result<bool> {
        Ok(self.initialized)
    }

    async fn get(&self, _candidate: &ResetToken) -> Result<Option<ResetToken>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.current())
    }

    async fn set(&self, token: &ResetToken) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.lock() = Some(token.clone());
        Ok(())
    }
}
