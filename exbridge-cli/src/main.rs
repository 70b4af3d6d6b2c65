//! exbridge
//!
//! Prints a JSON snapshot of a Kraken account: balances, open orders, the
//! ticker and recent trades for the configured market.
//!
//! # Usage
//!
//! ```bash
//! # Snapshot the default XMR/XBT market
//! cargo run -p exbridge-cli
//!
//! # Run offline against the stub client, logging as JSON
//! EXBRIDGE_ENV=test EXBRIDGE_LOG_FORMAT=json cargo run -p exbridge-cli
//! ```
//!
//! # Environment Variables
//!
//! - `EXBRIDGE_ENV`: Environment (test, development, production)
//! - `EXBRIDGE_KRAKEN_API_KEY`: Kraken public key (required outside test)
//! - `EXBRIDGE_KRAKEN_API_SECRET`: Kraken private key (required outside test)
//! - `EXBRIDGE_LIMIT_ONLY`: Limit orders only (default: true)
//! - `EXBRIDGE_COIN`: Traded coin (default: XMR)
//! - `EXBRIDGE_BASE`: Base asset (default: XBT)
//! - `EXBRIDGE_DECIMAL_PLACES`: Amount precision (default: 8)
//! - `EXBRIDGE_TICKER_ATTEMPTS`: Ticker attempts (default: 4)
//! - `EXBRIDGE_TICKER_BACKOFF_MS`: First retry delay (default: 250)
//! - `EXBRIDGE_TICKER_MAX_BACKOFF_MS`: Retry delay cap (default: 2000)
//! - `EXBRIDGE_LOG_FORMAT`: text or json (default: text)

use exbridge_cli::{build_adapter, collect_snapshot, Config, LogFormat};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const RECENT_TRADES: usize = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (.env included) before logging, which it configures
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("exbridge=info".parse()?);
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        coin = %config.market.coin,
        base = %config.market.base,
        "exbridge"
    );

    let adapter = build_adapter(&config)?;
    let snapshot = collect_snapshot(adapter.as_ref(), RECENT_TRADES).await?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
