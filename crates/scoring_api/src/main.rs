// Rust guideline compliant 2026-10-18

//! Scoring API server entry point.
//!
//! Wires the store (Redis or in-memory adapter behind the retry wrapper) and
//! the auth secrets into the HTTP boundary, then serves `POST /method` until
//! CTRL+C. The store is connected once at startup and closed on shutdown.
//!
//! # Usage
//!
//! ```text
//! # Against a local Redis
//! RUST_LOG=info cargo run -- --port 8080 --store-host localhost
//!
//! # Without Redis, logging to a file
//! cargo run -- --in-memory --log scoring_api.log
//! ```

mod adapters;
mod http;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adapters::Backend;
use adapters::in_memory_storage::InMemoryStorage;
use adapters::redis_storage::{RedisConfig, RedisStorage};
use anyhow::Context as _;
use api::AuthConfig;
use clap::Parser;
use http::AppState;
use store::{Store, StoreConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Scoring API HTTP server.
#[derive(Parser, Debug)]
#[command(name = "scoring_api", version, about, long_about = None)]
struct Args {
    /// Port to listen on.
    #[arg(short, long, env = "SCORING_PORT", default_value_t = 8080)]
    port: u16,

    /// Address to bind.
    #[arg(long, env = "SCORING_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Append logs to this file instead of stderr.
    #[arg(short, long, env = "SCORING_LOG")]
    log: Option<PathBuf>,

    /// Redis host.
    #[arg(long, env = "SCORING_STORE_HOST", default_value = "localhost")]
    store_host: String,

    /// Redis port.
    #[arg(long, env = "SCORING_STORE_PORT", default_value_t = 6379)]
    store_port: u16,

    /// Per-step Redis timeout, in seconds.
    #[arg(long, env = "SCORING_STORE_TIMEOUT_SECS", default_value_t = 3)]
    store_timeout_secs: u64,

    /// Attempts per durable store operation.
    #[arg(long, env = "SCORING_STORE_ATTEMPTS", default_value_t = store::DEFAULT_ATTEMPTS)]
    store_attempts: u32,

    /// Delay between store attempts, in milliseconds.
    #[arg(long, env = "SCORING_STORE_DELAY_MS", default_value_t = 500)]
    store_delay_ms: u64,

    /// Shared secret for regular callers.
    #[arg(long, env = "SCORING_SALT", default_value = api::auth::SALT)]
    salt: String,

    /// Admin-only secret.
    #[arg(long, env = "SCORING_ADMIN_SALT", default_value = api::auth::ADMIN_SALT)]
    admin_salt: String,

    /// Login that identifies the admin.
    #[arg(long, env = "SCORING_ADMIN_LOGIN", default_value = api::auth::ADMIN_LOGIN)]
    admin_login: String,

    /// Use the process-local store instead of Redis.
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    // Initialize tracing before any async work.
    init_tracing(args.log.as_deref())?;

    let store_config = StoreConfig::builder()
        .attempts(args.store_attempts)
        .delay(Duration::from_millis(args.store_delay_ms))
        .build()
        .context("failed to build store config")?;
    let auth = AuthConfig::builder()
        .salt(args.salt)
        .admin_login(args.admin_login)
        .admin_salt(args.admin_salt)
        .build()
        .context("failed to build auth config")?;

    let backend = if args.in_memory {
        Backend::Memory(InMemoryStorage::new())
    } else {
        let redis_config = RedisConfig::builder(args.store_host, args.store_port)
            .timeout(Duration::from_secs(args.store_timeout_secs))
            .build()
            .context("failed to build redis config")?;
        Backend::Redis(RedisStorage::new(redis_config))
    };

    // An unreachable store is not fatal: calls redial and the cache path
    // degrades to "no value".
    let store = Store::new(backend, store_config);
    if let Err(e) = store.connect().await {
        tracing::warn!(adapter = store.storage().name(), error = %e, "main.store.unavailable");
    }
    let state = Arc::new(AppState { store, auth });

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, adapter = state.store.storage().name(), "main.listening");

    axum::serve(listener, http::router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    state.store.close().await;
    tracing::info!("main.stopped");
    Ok(())
}

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`),
/// writing to `log_file` in append mode when given, stderr otherwise.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .try_init()
            .context("failed to install tracing subscriber")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("failed to install tracing subscriber")?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "main.shutdown.signal_failed");
        return;
    }
    tracing::info!("main.shutdown: ctrl_c received");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser as _;

    #[test]
    fn defaults_match_documented_values() {
        let args = Args::try_parse_from(["scoring_api"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.store_host, "localhost");
        assert_eq!(args.store_port, 6379);
        assert_eq!(args.store_timeout_secs, 3);
        assert_eq!(args.store_attempts, 5);
        assert_eq!(args.store_delay_ms, 500);
        assert_eq!(args.salt, "Otus");
        assert_eq!(args.admin_login, "admin");
        assert_eq!(args.admin_salt, "42");
        assert!(args.log.is_none());
        assert!(!args.in_memory);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from(["scoring_api", "-p", "9000", "-l", "out.log", "--in-memory"]).unwrap();
        assert_eq!(args.port, 9000);
        assert_eq!(args.log.as_deref(), Some(std::path::Path::new("out.log")));
        assert!(args.in_memory);
    }
}
