//! exbridge CLI Library
//!
//! Wiring for the `exbridge` binary: configuration, adapter construction and
//! the account snapshot it prints.
//!
//! # Architecture
//!
//! ```text
//! Config (env) → build_adapter → ExchangeAdapter → collect_snapshot → JSON
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod snapshot;

use exbridge_exec::{ExchangeAdapter, KrakenExchange, StubKrakenApi};

// Re-exports for convenience
pub use config::{Config, Environment, KrakenConfig, LogFormat, MarketConfig};
pub use error::{CliError, CliResult};
pub use snapshot::{collect_snapshot, AccountSnapshot};

/// Build the adapter selected by the configuration.
///
/// The test environment gets an empty `StubKrakenApi`; every other
/// environment talks to the live API.
pub fn build_adapter(config: &Config) -> CliResult<Box<dyn ExchangeAdapter>> {
    let precision = config.precision()?;

    let adapter: Box<dyn ExchangeAdapter> = match config.environment {
        Environment::Test => Box::new(
            KrakenExchange::with_client(
                StubKrakenApi::new(),
                config.trading_pair()?,
                config.kraken.limit_only,
            )
            .with_precision(precision)
            .with_ticker_retry(config.ticker_retry),
        ),
        Environment::Development | Environment::Production => Box::new(
            KrakenExchange::new(
                config.exchange_config(),
                &config.market.coin,
                &config.market.base,
            )?
            .with_precision(precision)
            .with_ticker_retry(config.ticker_retry),
        ),
    };

    Ok(adapter)
}
