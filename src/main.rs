use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use biblenames_db::{BibleNames, LoadMode};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use biblenames::{AppState, RateLimiterLayer, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// Resolve free-form Bible book names over HTTP.
#[derive(Debug, Clone, Parser)]
#[command(name = "biblenames", version)]
struct Config {
    /// Directory holding catalog.json, locales/ and orders/.
    #[arg(long, env = "BIBLENAMES_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// How table files are read: mmap or owned.
    #[arg(long, env = "BIBLENAMES_LOAD_MODE", default_value = "mmap")]
    load_mode: LoadMode,
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Omit Cache-Control headers.
    #[arg(long)]
    no_cache: bool,
    #[arg(
        long,
        env = "RATE_LIMIT_RPS",
        default_value_t = DEFAULT_RATE_LIMIT_RPS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    rate_limit_rps: u32,
    #[arg(
        long,
        env = "RATE_LIMIT_BURST",
        default_value_t = DEFAULT_RATE_LIMIT_BURST,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    rate_limit_burst: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::parse();
    info!("binding to {}:{}", config.host, config.port);
    info!(
        "using data at {} (mode: {:?})",
        config.data_dir.display(),
        config.load_mode
    );
    if config.no_cache {
        info!("cache headers disabled");
    }
    info!(
        "rate limit: {} req/s (burst {})",
        config.rate_limit_rps, config.rate_limit_burst
    );

    let names = BibleNames::load_with_mode(&config.data_dir, config.load_mode)
        .with_context(|| format!("loading tables from {}", config.data_dir.display()))?;
    if names.locales().is_empty() {
        anyhow::bail!("no locale loaded from {}", config.data_dir.display());
    }

    let state = AppState {
        names: Arc::new(names),
        disable_cache: config.no_cache,
    };

    let rate_limiter = RateLimiterLayer::new(config.rate_limit_rps, config.rate_limit_burst);
    let app = router(state)
        .layer(rate_limiter)
        .layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
