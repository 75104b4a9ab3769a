use anyhow::{Context, Result};
use std::env;

use crate::ingest::DemoAircraft;

/// Runtime configuration read from the environment (after `.env` is loaded)
#[derive(Debug, Clone)]
pub struct Config {
    /// `DATABASE_URL`; only required by commands that touch the database
    pub database_url: Option<String>,
    /// `AIRSPACE_ENV`: "production", "staging", or anything else for development
    pub environment: String,
    pub web_interface: String,
    pub web_port: u16,
    pub db_pool_size: u32,
    pub demo_aircraft: DemoAircraft,
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let web_port = match env::var("WEB_PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("WEB_PORT must be a port number, got {port:?}"))?,
            Err(_) => 3000,
        };
        let db_pool_size = match env::var("DB_POOL_SIZE") {
            Ok(size) => size
                .parse()
                .with_context(|| format!("DB_POOL_SIZE must be a number, got {size:?}"))?,
            Err(_) => 10,
        };

        let defaults = DemoAircraft::default();
        let demo_aircraft = DemoAircraft {
            icao24: env::var("DEMO_ICAO24").unwrap_or(defaults.icao24),
            callsign: env::var("DEMO_CALLSIGN").ok().or(defaults.callsign),
        };

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            environment: env::var("AIRSPACE_ENV").unwrap_or_else(|_| "development".to_string()),
            web_interface: env::var("WEB_INTERFACE").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port,
            db_pool_size,
            demo_aircraft,
            sentry_dsn: non_empty_var("SENTRY_DSN"),
        })
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set in environment variables")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
