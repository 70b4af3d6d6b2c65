//! Stub Kraken client for testing.
//!
//! Serves scripted responses through the `KrakenApi` port without any
//! network traffic, counts calls, and can be told to fail.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use exbridge_connectors::{
    asset_matches, pair_matches, KrakenDepth, KrakenOrder, KrakenOrderDescr, KrakenRestError,
    KrakenTicker, KrakenTrade,
};
use exbridge_domain::TradeWindow;

use crate::ports::{AssetFunds, KrakenApi};

// =============================================================================
// Fixtures
// =============================================================================

/// Ticker entry with the given last/bid/ask and 24h volume.
pub fn ticker_fixture(
    last: Decimal,
    bid: Decimal,
    ask: Decimal,
    volume_24h: Decimal,
) -> KrakenTicker {
    KrakenTicker {
        a: vec![ask, Decimal::ONE, Decimal::ONE],
        b: vec![bid, Decimal::ONE, Decimal::ONE],
        c: vec![last, Decimal::ONE],
        v: vec![volume_24h, volume_24h],
        p: vec![last, last],
        t: vec![1, 1],
        l: vec![bid, bid],
        h: vec![ask, ask],
        o: last,
    }
}

/// Limit order on `pair` (altname) with the given volumes.
pub fn order_fixture(pair: &str, side: &str, vol: Decimal, vol_exec: Decimal) -> KrakenOrder {
    KrakenOrder {
        status: "open".to_string(),
        opentm: 0.0,
        descr: KrakenOrderDescr {
            pair: pair.to_string(),
            side: side.to_string(),
            ordertype: "limit".to_string(),
            price: Decimal::ZERO,
            price2: Decimal::ZERO,
            order: String::new(),
        },
        vol,
        vol_exec,
        cost: Decimal::ZERO,
        fee: Decimal::ZERO,
        price: Decimal::ZERO,
        userref: None,
        oflags: String::new(),
    }
}

/// Trade on `pair` at unix time `time`.
pub fn trade_fixture(
    txid: &str,
    pair: &str,
    side: &str,
    price: Decimal,
    vol: Decimal,
    time: f64,
) -> KrakenTrade {
    KrakenTrade {
        txid: txid.to_string(),
        ordertxid: format!("O-{}", txid),
        pair: pair.to_string(),
        time,
        side: side.to_string(),
        ordertype: "limit".to_string(),
        price,
        cost: price * vol,
        fee: Decimal::ZERO,
        vol,
    }
}

// =============================================================================
// Stub Kraken API
// =============================================================================

#[derive(Default)]
struct StubState {
    tickers: BTreeMap<String, KrakenTicker>,
    books: BTreeMap<String, KrakenDepth>,
    orders: BTreeMap<String, KrakenOrder>,
    closed_orders: BTreeMap<String, KrakenOrder>,
    balances: BTreeMap<String, AssetFunds>,
    trades: Vec<KrakenTrade>,
}

/// Kraken client double.
///
/// Pair and asset lookups use the same legacy-name matching as the real
/// client, so fixtures can be keyed by either `XXMRXXBT` or `XMRXBT`.
#[derive(Default)]
pub struct StubKrakenApi {
    state: RwLock<StubState>,
    /// Remaining ticker calls to fail
    ticker_failures: AtomicU32,
    /// Fail the next call of any kind
    fail_next: AtomicU32,
    /// 1-based balance call to fail (0 = none)
    fail_balance_call: AtomicU32,
    ticker_calls: AtomicU32,
    balance_calls: AtomicU32,
    trade_calls: AtomicU32,
}

impl StubKrakenApi {
    /// Create an empty stub.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StubState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StubState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the ticker for a Kraken pair name.
    pub fn set_ticker(&self, pair: &str, ticker: KrakenTicker) {
        self.write().tickers.insert(pair.to_string(), ticker);
    }

    /// Set the order book for a Kraken pair name.
    pub fn set_order_book(&self, pair: &str, depth: KrakenDepth) {
        self.write().books.insert(pair.to_string(), depth);
    }

    /// Add an open order.
    pub fn add_open_order(&self, txid: &str, order: KrakenOrder) {
        self.write().orders.insert(txid.to_string(), order);
    }

    /// Add an order that is only visible to `query_order`.
    pub fn add_closed_order(&self, txid: &str, order: KrakenOrder) {
        self.write().closed_orders.insert(txid.to_string(), order);
    }

    /// Set the funds of an asset.
    pub fn set_balance(&self, asset: &str, free: Decimal, locked: Decimal) {
        self.write()
            .balances
            .insert(asset.to_string(), AssetFunds { free, locked });
    }

    /// Append a trade; retrieval order is insertion order.
    pub fn push_trade(&self, trade: KrakenTrade) {
        self.write().trades.push(trade);
    }

    /// Fail the next `count` ticker calls.
    pub fn fail_next_tickers(&self, count: u32) {
        self.ticker_failures.store(count, Ordering::SeqCst);
    }

    /// Configure the next call (of any kind) to fail.
    pub fn set_fail_next(&self, fail: bool) {
        self.fail_next.store(u32::from(fail), Ordering::SeqCst);
    }

    /// Fail the `nth` balance call (1-based), counting from stub creation.
    pub fn fail_balance_call(&self, nth: u32) {
        self.fail_balance_call.store(nth, Ordering::SeqCst);
    }

    /// Ticker calls served so far (including failures)
    pub fn ticker_calls(&self) -> u32 {
        self.ticker_calls.load(Ordering::SeqCst)
    }

    /// Balance calls served so far
    pub fn balance_calls(&self) -> u32 {
        self.balance_calls.load(Ordering::SeqCst)
    }

    /// Trade history calls served so far
    pub fn trade_calls(&self) -> u32 {
        self.trade_calls.load(Ordering::SeqCst)
    }

    /// Consume one pending failure from `counter`, if any.
    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_fail(&self, what: &str) -> Result<(), KrakenRestError> {
        if Self::take_failure(&self.fail_next) {
            return Err(KrakenRestError::RequestFailed(format!("Simulated {} failure", what)));
        }
        Ok(())
    }
}

#[async_trait]
impl KrakenApi for StubKrakenApi {
    async fn ticker(
        &self,
        pair: Option<&str>,
    ) -> Result<BTreeMap<String, KrakenTicker>, KrakenRestError> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail("ticker")?;

        if Self::take_failure(&self.ticker_failures) {
            return Err(KrakenRestError::Timeout);
        }

        let state = self.read();
        let tickers: BTreeMap<String, KrakenTicker> = match pair {
            Some(pair) => state
                .tickers
                .iter()
                .filter(|(key, _)| pair_matches(key, pair))
                .map(|(key, ticker)| (key.clone(), ticker.clone()))
                .collect(),
            None => state.tickers.clone(),
        };

        if let Some(pair) = pair {
            if tickers.is_empty() {
                return Err(KrakenRestError::ApiError(vec![format!(
                    "EQuery:Unknown asset pair {}",
                    pair
                )]));
            }
        }
        Ok(tickers)
    }

    async fn depth(&self, pair: &str) -> Result<BTreeMap<String, KrakenDepth>, KrakenRestError> {
        self.check_fail("depth")?;

        Ok(self
            .read()
            .books
            .iter()
            .filter(|(key, _)| pair_matches(key, pair))
            .map(|(key, depth)| (key.clone(), depth.clone()))
            .collect())
    }

    async fn open_orders(&self) -> Result<BTreeMap<String, KrakenOrder>, KrakenRestError> {
        self.check_fail("open orders")?;
        Ok(self.read().orders.clone())
    }

    async fn asset_balance(&self, asset: &str) -> Result<AssetFunds, KrakenRestError> {
        let call = self.balance_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.check_fail("balance")?;

        if call == self.fail_balance_call.load(Ordering::SeqCst) {
            return Err(KrakenRestError::RequestFailed(format!(
                "Simulated balance failure for {}",
                asset
            )));
        }

        Ok(self
            .read()
            .balances
            .iter()
            .find(|(code, _)| asset_matches(code, asset))
            .map(|(_, funds)| *funds)
            .unwrap_or_default())
    }

    async fn trades_history(
        &self,
        pair: &str,
        window: TradeWindow,
    ) -> Result<Vec<KrakenTrade>, KrakenRestError> {
        self.trade_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail("trades history")?;

        let state = self.read();
        let mut trades = Vec::new();
        for trade in state.trades.iter().filter(|t| pair_matches(&t.pair, pair)) {
            if window.contains(trade.executed_at()?) {
                trades.push(trade.clone());
            }
        }
        Ok(trades)
    }

    async fn query_order(&self, txid: &str) -> Result<KrakenOrder, KrakenRestError> {
        self.check_fail("query order")?;

        let state = self.read();
        state
            .orders
            .get(txid)
            .or_else(|| state.closed_orders.get(txid))
            .cloned()
            .ok_or_else(|| KrakenRestError::NotFound(format!("order {}", txid)))
    }
}

// =============================================================================
// Tests
// =============================================================================
