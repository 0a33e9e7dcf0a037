// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end tests of the database setup mode.
//!
//! Configuration is built from the same variables the init container reads,
//! pointed at the server in `TEST_DATABASE_URL`.

#[macro_use]
mod common;

use std::collections::HashMap;
use std::time::Duration;

use common::*;
use lakerunner_grafana_init::database::{DatabaseOutcome, RoleOutcome};
use lakerunner_grafana_init::reset::{DeleteOutcome, ResetReport};
use lakerunner_grafana_init::token::TrackerOutcome;
use lakerunner_grafana_init::{Bootstrap, BootstrapReport, Config, Mode};

struct Setup {
    server: TestServer,
    db: String,
    role: String,
    env: HashMap<String, String>,
}

impl Setup {
    fn new() -> Self {
        let server = TestServer::from_env().unwrap();
        let db = unique_name("grafana");
        let role = unique_name("grafana_user");

        let mut env = server.pg_env();
        env.insert("GRAFANA_DB_NAME".to_string(), db.clone());
        env.insert("GRAFANA_DB_USER".to_string(), role.clone());
        env.insert("GRAFANA_DB_PASSWORD".to_string(), "grafana-pw".to_string());
        env.insert("GF_SECURITY_ADMIN_USER".to_string(), "lakerunner".to_string());
        env.insert(
            "GF_SECURITY_ADMIN_PASSWORD".to_string(),
            "admin-pw".to_string(),
        );

        Self {
            server,
            db,
            role,
            env,
        }
    }

    fn config(&self) -> Config {
        let config = Config::from_lookup(|key| self.env.get(key).cloned()).unwrap();
        assert!(matches!(config.mode, Mode::DatabaseSetup(_)));
        config
    }

    async fn run(&self) -> BootstrapReport {
        Bootstrap::new(self.config()).run().await.unwrap()
    }

    async fn cleanup(self) {
        drop_database(&self.server, &self.db).await;
        drop_role(&self.server, &self.role).await;
    }
}

#[tokio::test]
async fn test_database_setup_is_idempotent() {
    skip_if_no_db!();

    let setup = Setup::new();

    let first = setup.run().await;
    assert_eq!(
        first,
        BootstrapReport::DatabaseSetup {
            database: DatabaseOutcome::Created,
            role: RoleOutcome::Created,
            reset: Some(TrackerOutcome::NoTokenProvided),
        }
    );

    let second = setup.run().await;
    assert_eq!(
        second,
        BootstrapReport::DatabaseSetup {
            database: DatabaseOutcome::AlreadyExists,
            role: RoleOutcome::PasswordUpdated,
            reset: Some(TrackerOutcome::NoTokenProvided),
        }
    );

    // The application role can log in to its database.
    let as_role = pool(setup.server.options_as(&setup.db, &setup.role, "grafana-pw")).await;
    as_role.close().await;

    setup.cleanup().await;
}

#[tokio::test]
async fn test_database_setup_applies_admin_reset() {
    skip_if_no_db!();

    let mut setup = Setup::new();
    setup
        .env
        .insert("RESET_TOKEN".to_string(), "reset-1700000000".to_string());

    // Fresh install: Grafana has not created its tables yet.
    let report = setup.run().await;
    assert!(matches!(
        report,
        BootstrapReport::DatabaseSetup {
            reset: Some(TrackerOutcome::ApplicationNotInitialized),
            ..
        }
    ));

    // Grafana starts, migrates, and creates its admin.
    let app = pool(setup.server.options(&setup.db)).await;
    create_grafana_tables(&app).await;
    insert_user(&app, "lakerunner", 2).await;

    let report = setup.run().await;
    assert_eq!(
        report,
        BootstrapReport::DatabaseSetup {
            database: DatabaseOutcome::AlreadyExists,
            role: RoleOutcome::PasswordUpdated,
            reset: Some(TrackerOutcome::Reset {
                previous: None,
                report: ResetReport::IdentityInvalidated {
                    sessions: DeleteOutcome::Deleted(2),
                    user: DeleteOutcome::Deleted(1),
                },
            }),
        }
    );
    assert_eq!(count_users(&app, "lakerunner").await, 0);

    insert_user(&app, "lakerunner", 0).await;
    let report = setup.run().await;
    assert!(matches!(
        report,
        BootstrapReport::DatabaseSetup {
            reset: Some(TrackerOutcome::Unchanged),
            ..
        }
    ));
    assert_eq!(count_users(&app, "lakerunner").await, 1);

    app.close().await;
    setup.cleanup().await;
}

#[tokio::test]
async fn test_token_without_admin_login_skips_reset() {
    skip_if_no_db!();

    let mut setup = Setup::new();
    setup.env.remove("GF_SECURITY_ADMIN_USER");
    setup
        .env
        .insert("RESET_TOKEN".to_string(), "reset-1".to_string());

    let report = setup.run().await;
    assert!(matches!(
        report,
        BootstrapReport::DatabaseSetup { reset: None, .. }
    ));

    setup.cleanup().await;
}

#[tokio::test]
async fn test_unreachable_server_is_fatal() {
    skip_if_no_db!();

    let mut setup = Setup::new();
    // Nothing listens on port 1.
    setup.env.insert("PGHOST".to_string(), "127.0.0.1".to_string());
    setup.env.insert("PGPORT".to_string(), "1".to_string());

    let result = tokio::time::timeout(Duration::from_secs(5), Bootstrap::new(setup.config()).run())
        .await
        .expect("unreachable server should fail without retrying");
    assert!(matches!(
        result,
        Err(lakerunner_grafana_init::Error::Database(sqlx::Error::Io(_)))
    ));
}

#[tokio::test]
async fn test_role_password_is_not_logged() {
    skip_if_no_db!();

    let mut setup = Setup::new();
    let password = format!("pw-{}", uuid::Uuid::new_v4().simple());
    setup
        .env
        .insert("GRAFANA_DB_PASSWORD".to_string(), password.clone());

    let logs = CapturedLogs::default();
    {
        let _guard = tracing::subscriber::set_default(logs.subscriber());
        // Created on the first run, updated on the second.
        setup.run().await;
        setup.run().await;
    }

    let output = logs.contents();
    assert!(output.contains("Creating role"));
    assert!(output.contains("Role password updated"));
    assert!(
        !output.contains(&password),
        "role password appeared in log output"
    );

    setup.cleanup().await;
}
