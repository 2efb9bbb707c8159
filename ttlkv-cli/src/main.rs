//! ttlkv CLI
//!
//! Runs the ttlkv server, or reads and writes keys on a running one.

mod client;

use std::net::{IpAddr, SocketAddr};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ttlkv_api::{ApiConfig, ApiServer};
use ttlkv_core::constants::{DEFAULT_BIND, DEFAULT_PORT, DEFAULT_SERVER_URL};
use ttlkv_core::parse_duration;

use crate::client::{parse_value, CacheClient, Lookup};

/// ttlkv - in-memory key/value store with per-entry expiration
#[derive(Parser)]
#[command(name = "ttlkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = DEFAULT_BIND)]
        bind: String,
    },

    /// Fetch a key from a running server
    Get {
        /// Key to fetch
        key: String,
        /// Server base URL
        #[arg(long, env = "TTLKV_SERVER", default_value = DEFAULT_SERVER_URL)]
        server: String,
    },

    /// Store a key on a running server
    Set {
        /// Key to store
        key: String,
        /// Value (JSON, or plain text)
        value: String,
        /// Time-to-live, e.g. 30s, 5m, 1h30m
        #[arg(short, long)]
        ttl: String,
        /// Server base URL
        #[arg(long, env = "TTLKV_SERVER", default_value = DEFAULT_SERVER_URL)]
        server: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ttlkv=debug,tower_http=debug,info"
    } else {
        "ttlkv=info,warn"
    };
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()));
    if cli.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
        Commands::Get { key, server } => cmd_get(&key, &server).await,
        Commands::Set {
            key,
            value,
            ttl,
            server,
        } => cmd_set(&key, &value, &ttl, &server).await,
    }
}

/// Run API server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    println!("{}", "🚀 Starting ttlkv server...".cyan().bold());

    let config = ApiConfig::from_env().context("Invalid server configuration")?;
    let addr = bind_addr(bind, port)?;

    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} {}", "Capacity:".dimmed(), config.max_entries);
    println!("   {} {:?}", "Sweep interval:".dimmed(), config.sweep_interval);
    println!("\n   Press Ctrl+C to stop.\n");

    let server = ApiServer::new(config).context("Failed to start cache engine")?;
    server.run(addr).await.context("Server error")?;

    Ok(())
}

/// Parses the bind IP separately so IPv6 hosts like `::` need no brackets.
fn bind_addr(bind: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", bind))?;
    Ok(SocketAddr::new(ip, port))
}

/// Fetch a key
async fn cmd_get(key: &str, server: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Key must not be empty");
    }

    let client = CacheClient::new(server);
    match client.get(key).await? {
        Lookup::Found(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Lookup::NotFound => bail!("Key '{}' not found or expired", key),
    }
}

/// Store a key
async fn cmd_set(key: &str, raw_value: &str, ttl: &str, server: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Key must not be empty");
    }
    parse_duration(ttl).with_context(|| format!("Invalid --ttl '{}'", ttl))?;

    let value = parse_value(raw_value);
    let client = CacheClient::new(server);
    let receipt = client.set(key, &value, ttl).await?;

    println!(
        "{} {} {} {} ({} ms)",
        "✅ Stored".green(),
        receipt.key.bold(),
        "for".dimmed(),
        receipt.expiration,
        receipt.ttl_ms
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr_ipv4() {
        let addr = bind_addr("0.0.0.0", 8080).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_bind_addr_ipv6() {
        let addr = bind_addr("::", 8080).unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.to_string(), "[::]:8080");

        let loopback = bind_addr("::1", 9000).unwrap();
        assert_eq!(loopback.to_string(), "[::1]:9000");
    }

    #[test]
    fn test_bind_addr_rejects_garbage() {
        assert!(bind_addr("not-an-ip", 8080).is_err());
        assert!(bind_addr("127.0.0.1:80", 8080).is_err());
    }
}
