//! slotdb server daemon
//!
//! Loads a catalog (the built-in demo or a JSON seed) and serves it over
//! the PostgreSQL wire protocol until SIGINT/SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! # Serve the demo catalog on 127.0.0.1:2000
//! slotdb
//!
//! # Serve a seed file on another port
//! slotdb --seed catalog.json --port 5433
//!
//! # Run one query and exit
//! slotdb -e "SELECT email FROM users WHERE user_type = 'driver'"
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use slotdb::catalog::{demo_database, CatalogSeed, Database, SharedDatabase};
use slotdb::executor::{QueryExecutor, ResultSet};
use slotdb::server::{Server, ServerConfig};

/// slotdb server
#[derive(Parser, Debug)]
#[command(
    name = "slotdb",
    version,
    about = "Minimal in-memory SQL server speaking the PostgreSQL wire protocol"
)]
struct Args {
    /// Host address to bind to [default: 127.0.0.1]
    #[arg(short = 'H', long, env = "SLOTDB_HOST")]
    host: Option<String>,

    /// Port to listen on [default: 2000]
    #[arg(short = 'p', long, env = "SLOTDB_PORT")]
    port: Option<u16>,

    /// JSON configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON catalog seed (defaults to the built-in demo catalog)
    #[arg(short = 's', long, value_name = "FILE")]
    seed: Option<PathBuf>,

    /// Largest accepted frame in bytes [default: 1048576]
    #[arg(long)]
    max_message_size: Option<usize>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info", env = "SLOTDB_LOG_LEVEL")]
    log_level: String,

    /// Execute one SQL statement against the catalog and exit
    #[arg(short = 'e', long, value_name = "SQL")]
    execute: Option<String>,

    /// With --execute, print the query plan instead of the rows
    #[arg(long, requires = "execute")]
    explain: bool,

    /// Print configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = load_config(&args)?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let database = load_database(&config)?.into_shared();

    if let Some(sql) = &args.execute {
        return execute_command(database, sql, args.explain);
    }

    run_server(config, database).await
}

fn init_logging(args: &Args) {
    let level = if args.verbose { "debug" } else { args.log_level.as_str() };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("slotdb={level}")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => ServerConfig::default(),
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(size) = args.max_message_size {
        config.max_message_size = size;
    }
    if let Some(seed) = &args.seed {
        config.seed = Some(seed.clone());
    }

    Ok(config)
}

fn load_database(config: &ServerConfig) -> Result<Database> {
    match &config.seed {
        Some(path) => {
            info!(seed = %path.display(), "loading catalog seed");
            let seed = CatalogSeed::from_file(path)
                .with_context(|| format!("Failed to read seed {}", path.display()))?;
            seed.into_database().context("Invalid catalog seed")
        }
        None => {
            info!("no seed given, serving demo catalog");
            demo_database().context("Failed to build demo catalog")
        }
    }
}

fn execute_command(database: SharedDatabase, sql: &str, explain: bool) -> Result<()> {
    let executor = QueryExecutor::new(database);
    if explain {
        println!("{}", executor.explain(sql)?);
    } else {
        print_result(&executor.execute(sql)?);
    }
    Ok(())
}

fn print_result(rs: &ResultSet) {
    println!("{}", rs.column_names().join("\t"));
    for row in rs.iter() {
        let values: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
        println!("{}", values.join("\t"));
    }
    println!("({} rows)", rs.len());
}

async fn run_server(config: ServerConfig, database: SharedDatabase) -> Result<()> {
    let bind_addr = config.bind_addr();
    let server = Server::bind(config, database)
        .await
        .with_context(|| format!("Failed to start server on {bind_addr}"))?;
    let handle = server.spawn()?;

    info!(addr = %handle.local_addr(), "slotdb v{} ready", env!("CARGO_PKG_VERSION"));
    info!("Press Ctrl+C to shutdown");

    shutdown_signal().await.context("Failed to install signal handler")?;
    info!("Shutdown signal received, closing connections");

    handle.shutdown().await?;
    info!("Server stopped. Goodbye!");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    signal::ctrl_c().await
}
