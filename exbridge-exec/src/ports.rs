//! Adapter port definitions.
//!
//! Two seams:
//! - `ExchangeAdapter` is the uniform trading interface every backend
//!   presents to its consumers.
//! - `KrakenApi` is the vendor client the Kraken adapter is built on.
//!   `KrakenRestClient` implements it for real traffic, `StubKrakenApi` for
//!   tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use exbridge_connectors::{KrakenDepth, KrakenOrder, KrakenRestError, KrakenTicker, KrakenTrade};
use exbridge_domain::{
    BalancePair, OpenOrder, OrderBook, Price, TickerSnapshot, Trade, TradeWindow, TradingPair,
};

use crate::error::ExecResult;

// =============================================================================
// Exchange Adapter
// =============================================================================

/// Uniform trading interface shared by every exchange backend.
///
/// Each operation is an independent request/response round-trip; adapters
/// hold no state between calls beyond their client and configuration.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Exchange display name (e.g., "Kraken")
    fn name(&self) -> &str;

    /// Market this adapter trades
    fn pair(&self) -> &TradingPair;

    /// Whether order placement is restricted to limit orders
    fn limit_only(&self) -> bool;

    /// Order book for the configured pair, exactly as the exchange reports it.
    async fn fetch_order_book(&self) -> ExecResult<OrderBook>;

    /// The account's open orders on the configured pair, keyed by order ID.
    async fn fetch_open_orders(&self) -> ExecResult<BTreeMap<String, OpenOrder>>;

    /// Ticker for the configured pair.
    ///
    /// Implementations retry transient failures and return
    /// `ExecError::TickerUnavailable` once their retry budget is spent.
    async fn fetch_ticker(&self) -> ExecResult<TickerSnapshot>;

    /// Trailing 24h volume.
    ///
    /// With a coin, a one-entry map keyed by that coin; without, every
    /// market keyed by exchange pair name.
    async fn fetch_24h_volume(&self, coin: Option<&str>) -> ExecResult<BTreeMap<String, Decimal>>;

    /// Base and coin balances, each totalled as free + locked.
    async fn fetch_balances(&self) -> ExecResult<BalancePair>;

    /// Trade history for the configured pair, most recent first.
    async fn fetch_trade_history(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ExecResult<Vec<Trade>>;

    /// Original quantity of an order.
    async fn fetch_order_total_amount(&self, order_id: &str) -> ExecResult<Decimal>;

    /// Last trade price, or `None` if the ticker could not be fetched.
    async fn fetch_last_trade_price(&self) -> Option<Price> {
        match self.fetch_ticker().await {
            Ok(ticker) => Some(ticker.last),
            Err(e) => {
                tracing::warn!(exchange = self.name(), error = %e, "Last trade price unavailable");
                None
            }
        }
    }

    /// Best ask, or `None` if the ticker could not be fetched.
    async fn fetch_lowest_ask(&self) -> Option<Price> {
        match self.fetch_ticker().await {
            Ok(ticker) => Some(ticker.ask),
            Err(e) => {
                tracing::warn!(exchange = self.name(), error = %e, "Lowest ask unavailable");
                None
            }
        }
    }

    /// Best bid, or `None` if the ticker could not be fetched.
    async fn fetch_highest_bid(&self) -> Option<Price> {
        match self.fetch_ticker().await {
            Ok(ticker) => Some(ticker.bid),
            Err(e) => {
                tracing::warn!(exchange = self.name(), error = %e, "Highest bid unavailable");
                None
            }
        }
    }
}

// =============================================================================
// Kraken Client Port
// =============================================================================

/// Free and held portions of one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFunds {
    /// Available for new orders
    pub free: Decimal,
    /// Held by open orders
    pub locked: Decimal,
}

/// Kraken vendor client operations the adapter relies on.
///
/// Errors are the vendor client's own; the adapter does not reinterpret them.
#[async_trait]
pub trait KrakenApi: Send + Sync {
    /// Ticker entries keyed by Kraken pair name; `None` asks for every pair.
    async fn ticker(
        &self,
        pair: Option<&str>,
    ) -> Result<BTreeMap<String, KrakenTicker>, KrakenRestError>;

    /// Order book entries keyed by Kraken pair name.
    async fn depth(&self, pair: &str) -> Result<BTreeMap<String, KrakenDepth>, KrakenRestError>;

    /// Open orders keyed by transaction ID, across all pairs.
    async fn open_orders(&self) -> Result<BTreeMap<String, KrakenOrder>, KrakenRestError>;

    /// Free and held funds of one asset; assets the account never held are zero.
    async fn asset_balance(&self, asset: &str) -> Result<AssetFunds, KrakenRestError>;

    /// Trades on `pair` inside `window`, in retrieval order (oldest first).
    async fn trades_history(
        &self,
        pair: &str,
        window: TradeWindow,
    ) -> Result<Vec<KrakenTrade>, KrakenRestError>;

    /// A single order by transaction ID.
    async fn query_order(&self, txid: &str) -> Result<KrakenOrder, KrakenRestError>;
}

// =============================================================================
// Tests
// =============================================================================
