//! Common test utilities for database-backed integration tests
//!
//! `TestDatabase` creates a uniquely named PostgreSQL database for each test
//! from the `airspace_intel_test_template` template database, which has the
//! embedded migrations applied once per test session. Tests using it are
//! marked `#[serial]`. Point them at a server with `TEST_DATABASE_URL`
//! (defaults to `postgresql://localhost/airspace_intel_test`).

#![allow(dead_code)]

use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::MigrationHarness;
use std::sync::Once;

use airspace_intel::db::MIGRATIONS;

const BASE_NAME: &str = "airspace_intel_test";
const TEMPLATE_NAME: &str = "airspace_intel_test_template";

static MIGRATIONS_RUN: Once = Once::new();

type PgPool = Pool<ConnectionManager<PgConnection>>;

fn base_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| format!("postgresql://localhost/{BASE_NAME}"))
}

fn with_database(base_url: &str, db_name: &str) -> String {
    match base_url.rsplit_once('/') {
        Some((prefix, _)) => format!("{prefix}/{db_name}"),
        None => base_url.to_string(),
    }
}

#[derive(QueryableByName)]
struct TemplateExists {
    #[diesel(sql_type = diesel::sql_types::Bool)]
    exists: bool,
}

/// Create the template database if needed and apply pending migrations to it.
fn ensure_template_migrated() {
    MIGRATIONS_RUN.call_once(|| {
        let base_url = base_url();
        let admin_url = with_database(&base_url, "postgres");
        let template_url = with_database(&base_url, TEMPLATE_NAME);

        if let Ok(mut admin_conn) = PgConnection::establish(&admin_url) {
            let exists = diesel::sql_query(format!(
                "SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = '{TEMPLATE_NAME}') AS exists"
            ))
            .get_result::<TemplateExists>(&mut admin_conn)
            .map(|r| r.exists);

            if exists != Ok(true) {
                let _ = diesel::sql_query(format!("CREATE DATABASE {TEMPLATE_NAME}"))
                    .execute(&mut admin_conn);
            }

            // Allow connections while migrating
            let _ = diesel::sql_query(format!(
                "UPDATE pg_database SET datistemplate = FALSE, datallowconn = TRUE \
                 WHERE datname = '{TEMPLATE_NAME}'"
            ))
            .execute(&mut admin_conn);
        }

        if let Ok(mut template_conn) = PgConnection::establish(&template_url) {
            match template_conn.run_pending_migrations(MIGRATIONS) {
                Ok(applied) if !applied.is_empty() => {
                    eprintln!("Applied {} migration(s) to test template", applied.len());
                }
                Ok(_) => {}
                Err(e) => eprintln!("Warning: Failed to run migrations on template: {}", e),
            }
        }

        if let Ok(mut admin_conn) = PgConnection::establish(&admin_url) {
            let _ = diesel::sql_query(format!(
                "UPDATE pg_database SET datistemplate = TRUE, datallowconn = FALSE \
                 WHERE datname = '{TEMPLATE_NAME}'"
            ))
            .execute(&mut admin_conn);
        }
    });
}

/// An isolated database cloned from the template, dropped with `WITH (FORCE)`
/// when this value goes out of scope (PostgreSQL 13+).
pub struct TestDatabase {
    db_name: String,
    pool: PgPool,
    admin_url: String,
}

impl TestDatabase {
    pub async fn new() -> Result<Self> {
        ensure_template_migrated();

        let base_url = base_url();
        let admin_url = with_database(&base_url, "postgres");
        let db_name = Self::generate_name();

        Self::create_database(&admin_url, &db_name)
            .await
            .context("Failed to create test database from template")?;

        let manager = ConnectionManager::<PgConnection>::new(with_database(&base_url, &db_name));
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .with_context(|| format!("Failed to create connection pool for {}", db_name))?;

        Ok(TestDatabase {
            db_name,
            pool,
            admin_url,
        })
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn name(&self) -> &str {
        &self.db_name
    }

    fn generate_name() -> String {
        let suffix = rand::random::<u64>();
        format!("{BASE_NAME}_{suffix:016x}")
    }

    async fn create_database(admin_url: &str, db_name: &str) -> Result<()> {
        let admin_url = admin_url.to_string();
        let db_name = db_name.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conn = PgConnection::establish(&admin_url).context(
                "Failed to connect to PostgreSQL for database creation. Is PostgreSQL running?",
            )?;

            // db_name is generated hex, safe to interpolate
            diesel::sql_query(format!(
                "CREATE DATABASE \"{db_name}\" TEMPLATE {TEMPLATE_NAME}"
            ))
            .execute(&mut conn)
            .with_context(|| format!("Failed to create database '{}'", db_name))?;

            Ok::<(), anyhow::Error>(())
        })
        .await
        .context("Database creation task panicked")?
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.db_name);
        let dropped = PgConnection::establish(&self.admin_url)
            .ok()
            .and_then(|mut conn| diesel::sql_query(&drop_sql).execute(&mut conn).ok());

        if dropped.is_none() {
            eprintln!(
                "Warning: Failed to drop test database '{}'. \
                 You may need to manually clean up: DROP DATABASE {};",
                self.db_name, self.db_name
            );
        }
    }
}
