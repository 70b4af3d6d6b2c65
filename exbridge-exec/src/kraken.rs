//! Kraken exchange adapter.
//!
//! Maps Kraken's native responses onto the uniform `ExchangeAdapter`
//! interface. The adapter is stateless apart from its client handle and the
//! configuration fixed at construction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use exbridge_connectors::{
    asset_matches, pair_matches, KrakenDepth, KrakenOrder, KrakenRestClient, KrakenRestError,
    KrakenTicker, KrakenTrade,
};
use exbridge_domain::{
    AssetBalance, BalancePair, BookLevel, Exchange, ExchangeConfig, OpenOrder, OrderBook,
    Precision, Price, Side, TickerSnapshot, Trade, TradeWindow, TradingPair,
};

use crate::error::{ExecError, ExecResult};
use crate::ports::{AssetFunds, ExchangeAdapter, KrakenApi};
use crate::retry::{retry_with_backoff, RetryPolicy};

// =============================================================================
// Vendor client binding
// =============================================================================

#[async_trait]
impl KrakenApi for KrakenRestClient {
    async fn ticker(
        &self,
        pair: Option<&str>,
    ) -> Result<BTreeMap<String, KrakenTicker>, KrakenRestError> {
        KrakenRestClient::ticker(self, pair).await
    }

    async fn depth(&self, pair: &str) -> Result<BTreeMap<String, KrakenDepth>, KrakenRestError> {
        KrakenRestClient::depth(self, pair, None).await
    }

    async fn open_orders(&self) -> Result<BTreeMap<String, KrakenOrder>, KrakenRestError> {
        KrakenRestClient::open_orders(self).await
    }

    async fn asset_balance(&self, asset: &str) -> Result<AssetFunds, KrakenRestError> {
        let balances = self.balance_ex().await?;

        // Kraken omits assets the account never held
        Ok(balances
            .iter()
            .find(|(code, _)| asset_matches(code, asset))
            .map(|(_, balance)| AssetFunds {
                free: balance.available(),
                locked: balance.hold_trade,
            })
            .unwrap_or_default())
    }

    async fn trades_history(
        &self,
        pair: &str,
        window: TradeWindow,
    ) -> Result<Vec<KrakenTrade>, KrakenRestError> {
        let start = window.start().map(|t| t.timestamp());
        let end = window.end().map(|t| t.timestamp());

        let trades = KrakenRestClient::trades_history(self, start, end).await?;
        Ok(trades
            .into_iter()
            .filter(|trade| pair_matches(&trade.pair, pair))
            .collect())
    }

    async fn query_order(&self, txid: &str) -> Result<KrakenOrder, KrakenRestError> {
        KrakenRestClient::query_order(self, txid).await
    }
}

// =============================================================================
// Kraken Exchange
// =============================================================================

/// Kraken implementation of `ExchangeAdapter`.
pub struct KrakenExchange<C = KrakenRestClient> {
    /// Vendor client
    client: C,
    /// Configured market
    pair: TradingPair,
    /// Restrict order placement to limit orders
    limit_only: bool,
    /// Scale applied to every amount
    precision: Precision,
    /// Retry budget for the public ticker
    ticker_retry: RetryPolicy,
}

impl KrakenExchange<KrakenRestClient> {
    /// Create an adapter talking to the live Kraken API.
    ///
    /// # Arguments
    ///
    /// * `config` - API key pair and limit-only flag
    /// * `coin` - Traded coin (e.g., "XMR")
    /// * `base` - Base asset (e.g., "XBT")
    pub fn new(config: ExchangeConfig, coin: &str, base: &str) -> ExecResult<Self> {
        let ExchangeConfig {
            credentials,
            limit_only,
        } = config;

        let pair = TradingPair::new(coin, base)?;
        Ok(Self::with_client(KrakenRestClient::new(credentials), pair, limit_only))
    }
}

impl<C: KrakenApi> KrakenExchange<C> {
    /// Create an adapter over any Kraken client.
    pub fn with_client(client: C, pair: TradingPair, limit_only: bool) -> Self {
        tracing::debug!(
            exchange = %Exchange::Kraken,
            ticker = pair.ticker(),
            limit_only,
            "Adapter created"
        );
        Self {
            client,
            pair,
            limit_only,
            precision: Precision::default(),
            ticker_retry: RetryPolicy::default(),
        }
    }

    /// Override the decimal precision.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Override the ticker retry policy.
    pub fn with_ticker_retry(mut self, policy: RetryPolicy) -> Self {
        self.ticker_retry = policy;
        self
    }

    /// Underlying client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Precision applied to amounts
    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    /// Single ticker attempt: fetch and normalize.
    async fn fetch_ticker_once(&self) -> ExecResult<TickerSnapshot> {
        let tickers = self.client.ticker(Some(self.pair.ticker())).await?;

        let (pair, ticker) = tickers
            .iter()
            .next()
            .ok_or_else(|| ExecError::UnknownMarket(self.pair.ticker().to_string()))?;

        tracing::debug!(pair = %pair, "Ticker received");
        self.to_snapshot(pair, ticker)
    }

    fn to_snapshot(&self, pair: &str, ticker: &KrakenTicker) -> ExecResult<TickerSnapshot> {
        Ok(TickerSnapshot {
            pair: pair.to_string(),
            last: Price::new(ticker.last_price()?)?,
            bid: Price::new(ticker.bid_price()?)?,
            ask: Price::new(ticker.ask_price()?)?,
            volume_24h: self.precision.apply(ticker.volume_24h()?),
        })
    }

    fn to_trade(&self, trade: &KrakenTrade) -> ExecResult<Trade> {
        Ok(Trade {
            id: trade.txid.clone(),
            order_id: trade.ordertxid.clone(),
            pair: trade.pair.clone(),
            side: Side::from_label(&trade.side)?,
            price: trade.price,
            volume: self.precision.apply(trade.vol),
            cost: self.precision.apply(trade.cost),
            fee: self.precision.apply(trade.fee),
            executed_at: trade.executed_at()?,
        })
    }

    async fn asset_balance(&self, asset: &str) -> ExecResult<AssetBalance> {
        let funds = self.client.asset_balance(asset).await?;
        Ok(AssetBalance::new(asset, funds.free, funds.locked, &self.precision)?)
    }
}

fn to_levels(levels: &[(Decimal, Decimal, i64)]) -> Vec<BookLevel> {
    levels
        .iter()
        .map(|&(price, volume, timestamp)| BookLevel {
            price,
            volume,
            timestamp,
        })
        .collect()
}

#[async_trait]
impl<C: KrakenApi> ExchangeAdapter for KrakenExchange<C> {
    fn name(&self) -> &str {
        Exchange::Kraken.display_name()
    }

    fn pair(&self) -> &TradingPair {
        &self.pair
    }

    fn limit_only(&self) -> bool {
        self.limit_only
    }

    async fn fetch_order_book(&self) -> ExecResult<OrderBook> {
        let books = self.client.depth(self.pair.ticker()).await?;

        let (pair, depth) = books
            .into_iter()
            .next()
            .ok_or_else(|| ExecError::UnknownMarket(self.pair.ticker().to_string()))?;

        Ok(OrderBook {
            pair,
            asks: to_levels(&depth.asks),
            bids: to_levels(&depth.bids),
        })
    }

    async fn fetch_open_orders(&self) -> ExecResult<BTreeMap<String, OpenOrder>> {
        let orders = self.client.open_orders().await?;

        let mut open = BTreeMap::new();
        for (txid, order) in orders {
            if !pair_matches(&order.descr.pair, self.pair.ticker()) {
                continue;
            }

            let side = Side::from_label(&order.descr.side)?;
            let normalized = OpenOrder::from_quantities(
                txid.clone(),
                side,
                order.vol,
                order.vol_exec,
                &self.precision,
            )?;
            open.insert(txid, normalized);
        }

        tracing::debug!(ticker = self.pair.ticker(), count = open.len(), "Open orders fetched");
        Ok(open)
    }

    async fn fetch_ticker(&self) -> ExecResult<TickerSnapshot> {
        retry_with_backoff(&self.ticker_retry, "kraken_ticker", || self.fetch_ticker_once())
            .await
            .map_err(|exhausted| ExecError::TickerUnavailable {
                pair: self.pair.ticker().to_string(),
                attempts: exhausted.attempts,
                last_error: exhausted.last_error.to_string(),
            })
    }

    async fn fetch_24h_volume(&self, coin: Option<&str>) -> ExecResult<BTreeMap<String, Decimal>> {
        match coin {
            Some(coin) => {
                let market = TradingPair::new(coin, self.pair.base())?;
                let tickers = self.client.ticker(Some(market.ticker())).await?;

                let ticker = tickers
                    .values()
                    .next()
                    .ok_or_else(|| ExecError::UnknownMarket(coin.to_string()))?;

                let volume = self.precision.apply(ticker.volume_24h()?);
                tracing::info!(coin, volume = %volume, "24h volume");

                Ok(BTreeMap::from([(coin.to_string(), volume)]))
            }
            None => {
                let tickers = self.client.ticker(None).await?;

                tickers
                    .iter()
                    .map(|(pair, ticker)| -> ExecResult<(String, Decimal)> {
                        Ok((pair.clone(), self.precision.apply(ticker.volume_24h()?)))
                    })
                    .collect()
            }
        }
    }

    async fn fetch_balances(&self) -> ExecResult<BalancePair> {
        let base = self.asset_balance(self.pair.base()).await?;
        let coin = self.asset_balance(self.pair.coin()).await?;

        tracing::info!(
            base = %base.name,
            base_total = %base.total,
            coin = %coin.name,
            coin_total = %coin.total,
            "Balances fetched"
        );

        Ok(BalancePair { base, coin })
    }

    async fn fetch_trade_history(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ExecResult<Vec<Trade>> {
        tracing::info!(ticker = self.pair.ticker(), "Getting trade history");

        let window = TradeWindow::new(start, end)?;
        let raw = self.client.trades_history(self.pair.ticker(), window).await?;

        let mut trades = raw
            .iter()
            .map(|trade| self.to_trade(trade))
            .collect::<ExecResult<Vec<_>>>()?;

        trades.reverse();
        Ok(trades)
    }

    async fn fetch_order_total_amount(&self, order_id: &str) -> ExecResult<Decimal> {
        let order = self.client.query_order(order_id).await?;
        Ok(self.precision.apply(order.vol))
    }
}
