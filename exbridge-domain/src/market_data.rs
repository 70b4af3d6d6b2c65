//! Market Data Types
//!
//! Canonical market data types returned by every exchange adapter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::Price;

// =============================================================================
// Ticker
// =============================================================================

/// Top-of-book and last trade for one pair.
///
/// Fetched fresh on every call, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    /// Exchange pair name the snapshot was reported under
    pub pair: String,
    /// Last trade price
    pub last: Price,
    /// Best bid
    pub bid: Price,
    /// Best ask
    pub ask: Price,
    /// Volume over the trailing 24 hours
    pub volume_24h: Decimal,
}

impl TickerSnapshot {
    /// Ask minus bid
    pub fn spread(&self) -> Decimal {
        self.ask.as_decimal() - self.bid.as_decimal()
    }
}

// =============================================================================
// Order Book
// =============================================================================

/// One price level as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Level price
    pub price: Decimal,
    /// Aggregate volume at this price
    pub volume: Decimal,
    /// Exchange timestamp of the last update (unix seconds)
    pub timestamp: i64,
}

/// Order book passed through in exchange order, without aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Exchange pair name
    pub pair: String,
    /// Ask levels
    pub asks: Vec<BookLevel>,
    /// Bid levels
    pub bids: Vec<BookLevel>,
}
