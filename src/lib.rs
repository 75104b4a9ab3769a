//! Airspace Intel - minimal aircraft observation ingest and health service
//!
//! The library holds the ingest-run lifecycle, the read-side health queries,
//! the PostgreSQL and in-memory stores behind the `Store` trait, and the HTTP
//! router that serves the dashboard and its JSON endpoints.

pub mod actions;
pub mod aircraft;
pub mod aircraft_repo;
pub mod config;
pub mod db;
pub mod error;
pub mod health;
pub mod ingest;
pub mod ingest_runs;
pub mod ingest_runs_repo;
pub mod log_format;
pub mod memory_store;
pub mod metrics;
pub mod observations;
pub mod observations_repo;
pub mod pings;
pub mod pings_repo;
pub mod schema;
pub mod store;
pub mod web;

pub use error::StoreError;
pub use ingest::{IngestError, IngestRunner, RunResult, run_ingest};
pub use memory_store::MemoryStore;
pub use store::{PgStore, Store};
