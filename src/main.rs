mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, prelude::*};

use airspace_intel::config::Config;
use airspace_intel::db::build_pool;
use airspace_intel::health::SystemStatus;
use airspace_intel::log_format::TargetFirstFormat;
use airspace_intel::store::{PgStore, Store};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(name = "airspace-intel")]
#[command(about = "Aircraft observation ingest worker and health dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard and the health/observation JSON endpoints
    Web {
        /// Interface to bind to (defaults to WEB_INTERFACE or 0.0.0.0)
        #[arg(long)]
        interface: Option<String>,
        /// Port to listen on (defaults to WEB_PORT or 3000)
        #[arg(long)]
        port: Option<u16>,
        /// Skip applying pending migrations on startup
        #[arg(long, default_value_t = false)]
        skip_migrations: bool,
    },
    /// Execute a single ingest run and exit
    Ingest,
    /// Insert a ping row to verify database connectivity
    Ping {
        #[arg(long, default_value = "ping")]
        message: String,
    },
    /// Print the aggregate health check; exits non-zero unless status is OK
    Status,
    /// Apply pending database migrations
    Migrate,
}

fn init_tracing(sentry_enabled: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().event_format(TargetFirstFormat);

    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);
    if sentry_enabled {
        registry.with(sentry_tracing::layer()).init();
    } else {
        registry.init();
    }
}

fn init_sentry(config: &Config) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            sample_rate: 1.0,
            traces_sample_rate: if config.is_production() { 0.05 } else { 1.0 },
            ..Default::default()
        },
    )))
}

async fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let pool = build_pool(config.database_url()?, config.db_pool_size)?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));

    match cli.command {
        Commands::Web {
            interface,
            port,
            skip_migrations,
        } => {
            if !skip_migrations {
                commands::handle_migrate(&pool).await?;
            }
            let interface = interface.unwrap_or_else(|| config.web_interface.clone());
            let port = port.unwrap_or(config.web_port);
            commands::handle_web(interface, port, store).await?;
        }
        Commands::Ingest => {
            commands::handle_ingest(store.as_ref(), &config.demo_aircraft).await?;
        }
        Commands::Ping { message } => {
            commands::handle_ping(store.as_ref(), message).await?;
        }
        Commands::Status => {
            if commands::handle_status(store).await? == SystemStatus::Attn {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Migrate => {
            commands::handle_migrate(&pool).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let sentry_guard = init_sentry(&config);
    init_tracing(sentry_guard.is_some());
    info!(
        "airspace-intel {} starting (env={})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
