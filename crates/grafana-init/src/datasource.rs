// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Datasource provisioning file.
//!
//! The datasource YAML is owned by Grafana and written verbatim; nothing here
//! parses or validates it.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};

/// File name of the provisioned datasource.
pub const DATASOURCE_FILE: &str = "cardinal.yaml";

/// Lines of the written file echoed to the log.
const PREVIEW_LINES: usize = 10;

/// Writes the datasource configuration under a Grafana provisioning directory.
#[derive(Debug, Clone)]
pub struct DatasourceProvisioner {
    provisioning_dir: PathBuf,
}

impl DatasourceProvisioner {
    /// Create a provisioner for `provisioning_dir`.
    pub fn new(provisioning_dir: impl Into<PathBuf>) -> Self {
        Self {
            provisioning_dir: provisioning_dir.into(),
        }
    }

    /// `<provisioning_dir>/datasources`.
    pub fn datasources_dir(&self) -> PathBuf {
        self.provisioning_dir.join("datasources")
    }

    /// Full path of the datasource file.
    pub fn target_path(&self) -> PathBuf {
        self.datasources_dir().join(DATASOURCE_FILE)
    }

    /// Write `config` to the datasource file, replacing any previous content.
    ///
    /// Returns the path written. Fails if the file is not present afterwards.
    pub async fn write(&self, config: &str) -> Result<PathBuf> {
        let dir = self.datasources_dir();
        let path = self.target_path();

        info!(
            provisioning_dir = %self.provisioning_dir.display(),
            datasources_dir = %dir.display(),
            "Writing Grafana datasource configuration"
        );

        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&path, config).await?;
        ensure_present(&path).await?;

        log_preview(&path).await;

        info!(path = %path.display(), bytes = config.len(), "Datasource configuration written");
        Ok(path)
    }
}

/// Confirm `path` exists after a write.
///
/// The provisioning directory is usually a network-backed volume shared with
/// the Grafana container, so the file must be visible by lookup before the
/// write counts. Lookup errors are returned unchanged.
async fn ensure_present(path: &Path) -> Result<()> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(Error::DatasourceNotWritten(path.to_path_buf()))
    }
}

async fn log_preview(path: &Path) {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            for (n, line) in content.lines().take(PREVIEW_LINES).enumerate() {
                info!(line = n + 1, "{}", line);
            }
        }
        Err(e) => info!(path = %path.display(), error = %e, "Could not read back datasource file"),
    }
}
