//! Page view counter service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ counter service ──▶ storage backend
//!                         │                 │               ├─ networked KV (REST or direct)
//!                         │                 │               ├─ JSON file (development)
//!                         │                 │               └─ in-process memory
//!                         │                 └─ dev-only fallback to file on KV failure
//!                         └─ /pages ──▶ content fetcher (retry with backoff) ──▶ upstream
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;

use view_counter::config::{loader, StorageEnv};
use view_counter::lifecycle::{self, Shutdown};
use view_counter::observability::logging;

#[derive(Parser)]
#[command(name = "view-counter")]
#[command(about = "Page view counter HTTP service", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long, env = "VIEWS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = loader::load_or_default(args.config.as_deref())?;
    let env = StorageEnv::from_env();
    logging::init_logging(&config.observability, env.environment());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %env.environment(),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "view-counter starting"
    );

    let shutdown = Shutdown::new();
    lifecycle::run(config, env, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
