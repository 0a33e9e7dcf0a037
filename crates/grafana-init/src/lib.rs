// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lakerunner Grafana Init - one-shot bootstrap for the Grafana ECS task
//!
//! Runs as an init container before Grafana starts and exits. It is safe to
//! run on every task start: every step either checks before acting or is
//! idempotent by nature.
//!
//! # Modes
//!
//! ```text
//! GRAFANA_DB_NAME/USER/PASSWORD set?
//!        │ yes                                   │ no
//!        ▼                                       ▼
//! ┌──────────────────────────┐        ┌──────────────────────────────┐
//! │      DatabaseSetup       │        │    DatasourceProvisioning    │
//! │ ensure database          │        │ reset token (file)           │
//! │ ensure role + password   │        │   └─ wipe /var/lib/grafana   │
//! │ grant privileges         │        │ write datasources/           │
//! │ reset token (table)      │        │       cardinal.yaml          │
//! │   └─ delete admin user   │        └──────────────────────────────┘
//! └──────────────────────────┘
//! ```
//!
//! # Reset tokens
//!
//! | Stored        | Candidate | Action                     |
//! |---------------|-----------|----------------------------|
//! | any           | empty     | none                       |
//! | absent        | `T`       | reset, record `T`          |
//! | `T`           | `T`       | none                       |
//! | `S` (≠ `T`)   | `T`       | reset, record `T`          |
//!
//! # Errors
//!
//! Connectivity, authentication and unexpected I/O failures abort the run
//! with a non-zero exit code. Deleting things that are already gone is not an
//! error. Nothing is retried; restarts are up to the orchestrator.

pub mod config;
pub mod database;
pub mod datasource;
pub mod error;
pub mod grants;
pub mod reset;
pub mod runtime;
pub mod token;

pub use config::{Config, ConfigError, Mode};
pub use error::{Error, Result};
pub use runtime::{Bootstrap, BootstrapReport};
