//! Execution layer error types.

use exbridge_connectors::KrakenRestError;
use exbridge_domain::DomainError;
use thiserror::Error;

/// Errors that can occur in adapter operations.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Failure reported by the vendor client, passed through unchanged
    #[error(transparent)]
    Client(#[from] KrakenRestError),

    /// Exchange data violated a domain invariant
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Every ticker attempt failed
    #[error("Ticker unavailable for {pair} after {attempts} attempts: {last_error}")]
    TickerUnavailable {
        /// Exchange ticker that was queried
        pair: String,
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last_error: String,
    },

    /// Exchange has no data for the requested market
    #[error("Unknown market: {0}")]
    UnknownMarket(String),
}

/// Result type for adapter operations.
pub type ExecResult<T> = Result<T, ExecError>;
