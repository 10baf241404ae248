//! cmdwire Server Binary
//!
//! Starts the reference TCP server with a fixed user list.

use std::sync::Arc;

use clap::Parser;
use cmdwire::network::{Server, StaticUsers};
use cmdwire::{CommandTable, ServerConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// cmdwire Server
#[derive(Parser, Debug)]
#[command(name = "cmdwire-server")]
#[command(about = "Reference server for the cmdwire binary protocol")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = cmdwire::config::DEFAULT_ADDR)]
    listen: String,

    /// Connection worker threads
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Connection read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "30000")]
    read_timeout_ms: u64,

    /// User accepted by LOGIN, as name:password (repeatable)
    #[arg(short, long = "user", value_name = "NAME:PASSWORD")]
    users: Vec<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cmdwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("cmdwire Server v{}", cmdwire::VERSION);

    let mut handler = StaticUsers::new();
    for entry in &args.users {
        match StaticUsers::parse_user(entry) {
            Ok((name, password)) => handler = handler.with_user(name, password),
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(2);
            }
        }
    }
    if handler.is_empty() {
        tracing::warn!("No users configured, every LOGIN will be rejected");
    } else {
        tracing::info!("{} users configured", handler.len());
    }

    let config = ServerConfig::builder()
        .listen_addr(&args.listen)
        .workers(args.workers)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let table = Arc::new(CommandTable::standard());
    for command in table.iter() {
        tracing::debug!("Serving {} (code {})", command.name, command.code);
    }

    let server = match Server::bind(config, table, Arc::new(handler.into_router())) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
