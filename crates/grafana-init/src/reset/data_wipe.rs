// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Data directory wipe.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{DeleteOutcome, ResetExecutor, ResetReport};
use crate::error::Result;

/// Removes everything inside a data directory, keeping the directory itself.
#[derive(Debug, Clone)]
pub struct DataWipe {
    data_dir: PathBuf,
}

impl DataWipe {
    /// Create a wipe for `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    async fn remove_entry(path: &Path) -> std::io::Result<()> {
        // symlink_metadata so a link to a directory is unlinked, not followed.
        let metadata = tokio::fs::symlink_metadata(path).await?;
        if metadata.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        }
    }
}

#[async_trait]
impl ResetExecutor for DataWipe {
    fn name(&self) -> &'static str {
        "data-wipe"
    }

    async fn execute(&self) -> Result<ResetReport> {
        info!(data_dir = %self.data_dir.display(), "Wiping data directory");

        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(data_dir = %self.data_dir.display(), "Data directory does not exist, nothing to wipe");
                return Ok(ResetReport::DataWiped {
                    entries: DeleteOutcome::NothingToDelete,
                    failed: 0,
                });
            }
            Err(e) => {
                warn!(
                    data_dir = %self.data_dir.display(),
                    error = %e,
                    "Failed to read data directory, skipping wipe"
                );
                return Ok(ResetReport::DataWiped {
                    entries: DeleteOutcome::NothingToDelete,
                    failed: 1,
                });
            }
        };

        let mut removed = 0u64;
        let mut failed = 0u64;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read directory entry");
                    failed += 1;
                    break;
                }
            };

            let path = entry.path();
            match Self::remove_entry(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Already gone");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove");
                    failed += 1;
                }
            }
        }

        info!(
            data_dir = %self.data_dir.display(),
            removed = removed,
            failed = failed,
            "Data directory wiped"
        );

        Ok(ResetReport::DataWiped {
            entries: DeleteOutcome::from_count(removed),
            failed,
        })
    }
}
