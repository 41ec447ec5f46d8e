//! Standalone VFS backend serving an in-memory filesystem.
//!
//! ```bash
//! RUST_LOG=debug fskitty-server --listen 127.0.0.1:10001
//! fskitty-server --listen unix:///tmp/fskitty.sock --max-write-chunk 4096
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fskitty_proto::{DEFAULT_MAX_FRAME_LEN, Endpoint};
use fskitty_server::{DEFAULT_MAX_IN_FLIGHT, MemoryVfs, MemoryVfsOptions, Server, ServerConfig};
use tracing_subscriber::EnvFilter;

/// In-memory VFS backend for fskitty
#[derive(Parser, Debug)]
#[command(name = "fskitty-server", version, about)]
struct Args {
    /// Address to listen on (host:port, tcp://host[:port] or unix:///path)
    #[arg(short, long, env = "FSKITTY_LISTEN", default_value = "127.0.0.1:10001")]
    listen: String,

    /// Maximum entries returned per directory page
    #[arg(long, default_value_t = 100)]
    page_size: usize,

    /// Accept at most this many bytes per write (simulates backpressure)
    #[arg(long)]
    max_write_chunk: Option<usize>,

    /// Return at most this many bytes per read
    #[arg(long)]
    max_read_len: Option<u64>,

    /// Largest frame accepted or sent, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LEN)]
    max_frame_len: usize,

    /// Requests handled at once per connection
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    max_in_flight: usize,

    /// Start with an empty filesystem instead of the demo files
    #[arg(long)]
    empty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let vfs = MemoryVfs::with_options(MemoryVfsOptions {
        page_size: args.page_size,
        max_write_chunk: args.max_write_chunk,
        max_read_len: args.max_read_len,
        ..MemoryVfsOptions::default()
    });
    if !args.empty {
        vfs.seed_demo().context("failed to seed demo content")?;
    }

    let endpoint = Endpoint::parse(&args.listen)?;
    let config = ServerConfig {
        max_frame_len: args.max_frame_len,
        max_in_flight: args.max_in_flight,
        ..ServerConfig::default()
    };
    let server = Server::bind(&endpoint, Arc::new(vfs), config).await?;
    if let Some(addr) = server.local_addr() {
        tracing::info!(%addr, "fskitty-server ready");
    }

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
