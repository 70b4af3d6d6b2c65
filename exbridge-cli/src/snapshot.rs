//! Account snapshot.
//!
//! One pass over the read-only adapter operations, collected into a single
//! serializable value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use exbridge_domain::{BalancePair, OpenOrder, Price, TickerSnapshot, Trade};
use exbridge_exec::{ExchangeAdapter, ExecError};

use crate::error::CliResult;

/// State of one account on one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Exchange display name
    pub exchange: String,
    /// Kraken ticker of the configured market
    pub pair: String,
    /// Limit-only trading
    pub limit_only: bool,
    /// Base and coin balances
    pub balances: BalancePair,
    /// Open orders on the configured market, ordered by id
    pub open_orders: Vec<OpenOrder>,
    /// Open orders with some quantity already filled
    pub partially_filled: usize,
    /// Latest ticker, absent if it stayed unavailable after retries
    pub ticker: Option<TickerSnapshot>,
    /// Mid price between best bid and best ask
    pub mid_price: Option<Decimal>,
    /// Best ask minus best bid
    pub spread: Option<Decimal>,
    /// Most recent trades first
    pub recent_trades: Vec<Trade>,
}

/// Collect a snapshot through any adapter.
///
/// Balance, order and trade failures abort the snapshot. A ticker that is
/// still unavailable after retries is recorded as absent.
pub async fn collect_snapshot<A>(adapter: &A, trade_limit: usize) -> CliResult<AccountSnapshot>
where
    A: ExchangeAdapter + ?Sized,
{
    let balances = adapter.fetch_balances().await?;
    let open_orders: Vec<OpenOrder> = adapter.fetch_open_orders().await?.into_values().collect();
    let partially_filled = open_orders.iter().filter(|o| o.is_partially_filled()).count();

    let ticker = match adapter.fetch_ticker().await {
        Ok(ticker) => Some(ticker),
        Err(e @ ExecError::TickerUnavailable { .. }) => {
            tracing::warn!(error = %e, "Snapshot taken without ticker");
            None
        }
        Err(e) => return Err(e.into()),
    };
    let mid_price = ticker.as_ref().map(|t| mid(t.bid, t.ask));
    let spread = ticker.as_ref().map(TickerSnapshot::spread);

    let mut recent_trades = adapter.fetch_trade_history(None, None).await?;
    recent_trades.truncate(trade_limit);

    Ok(AccountSnapshot {
        exchange: adapter.name().to_string(),
        pair: adapter.pair().ticker().to_string(),
        limit_only: adapter.limit_only(),
        balances,
        open_orders,
        partially_filled,
        ticker,
        mid_price,
        spread,
        recent_trades,
    })
}

fn mid(bid: Price, ask: Price) -> Decimal {
    (bid.as_decimal() + ask.as_decimal()) / Decimal::TWO
}
