//! cmdwire CLI Client
//!
//! Command-line interface for talking to a cmdwire server.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use cmdwire::network::Client;
use cmdwire::{ClientConfig, CommandTable, LoginRequest};
use tracing_subscriber::{fmt, EnvFilter};

/// cmdwire CLI
#[derive(Parser, Debug)]
#[command(name = "cmdwire-cli")]
#[command(about = "CLI for the cmdwire binary protocol")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = cmdwire::config::DEFAULT_ADDR)]
    server: String,

    /// Reply timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and print the user id
    Login {
        username: String,

        password: String,

        /// Client version reported to the server
        #[arg(long)]
        client_version: Option<String>,

        /// Application context string
        #[arg(long)]
        context: Option<String>,

        /// Send LOGOUT after a successful login
        #[arg(long)]
        logout: bool,
    },

    /// Ping the server
    Ping,

    /// End the session on this connection
    Logout,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> cmdwire::Result<()> {
    let config = ClientConfig::builder()
        .server_addr(&args.server)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build();
    let mut client = Client::connect(config, Arc::new(CommandTable::standard()))?;

    match args.command {
        Commands::Login {
            username,
            password,
            client_version,
            context,
            logout,
        } => {
            let mut request = LoginRequest::new(username, password);
            if let Some(version) = client_version {
                request = request.with_version(version);
            }
            if let Some(context) = context {
                request = request.with_context(context);
            }

            let response = client.login(&request)?;
            println!("user_id: {}", response.user_id);

            if logout {
                client.logout()?;
                println!("logged out");
            }
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
        Commands::Logout => {
            client.logout()?;
            println!("logged out");
        }
    }

    Ok(())
}
