//! exbridge Adapter Layer
//!
//! Uniform trading interface over vendor exchange clients.
//!
//! # Architecture
//!
//! ```text
//! Consumer → ExchangeAdapter → KrakenExchange → KrakenApi → Kraken REST
//! ```
//!
//! # Components
//!
//! - **Ports**: `ExchangeAdapter` (what consumers see) and `KrakenApi`
//!   (what the Kraken adapter needs from its client)
//! - **Kraken**: `KrakenExchange`, normalizing Kraken responses
//! - **Retry**: bounded exponential backoff for the ticker
//! - **Stub**: scripted Kraken client for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use exbridge_domain::ExchangeConfig;
//! use exbridge_exec::{ExchangeAdapter, KrakenExchange};
//!
//! let config = ExchangeConfig::new(public_key, private_key, true);
//! let kraken = KrakenExchange::new(config, "XMR", "XBT")?;
//!
//! let balances = kraken.fetch_balances().await?;
//! let bid = kraken.fetch_highest_bid().await;
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod kraken;
pub mod ports;
pub mod retry;
pub mod stub;

// Re-exports for convenience
pub use error::{ExecError, ExecResult};
pub use kraken::KrakenExchange;
pub use ports::{AssetFunds, ExchangeAdapter, KrakenApi};
pub use retry::{retry_with_backoff, RetryExhausted, RetryPolicy};
pub use stub::StubKrakenApi;
