//! Kraken REST API Client for Spot Trading
//!
//! Provides REST API integration for:
//! - Public market data (ticker, order book depth)
//! - Private account data (open orders, balances, trade history, order lookup)
//! - Authentication via HMAC SHA512 signatures
//!
//! # Authentication
//!
//! Private endpoints are `POST` requests with a form-encoded body that always
//! carries a strictly increasing `nonce`. Each request is signed:
//!
//! ```text
//! API-Sign = base64(HMAC-SHA512(base64decode(secret), path + SHA256(nonce + postdata)))
//! ```
//!
//! and sent with the public key in the `API-Key` header.

use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

use exbridge_domain::{ApiCredentials, Exchange};

// =============================================================================
// Constants
// =============================================================================

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Kraken returns at most this many trades per TradesHistory page
const TRADES_PAGE_SIZE: usize = 50;

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur in the Kraken REST client.
#[derive(Debug, Clone, Error)]
pub enum KrakenRestError {
    /// Failed to build request signature
    #[error("Failed to build signature: {0}")]
    SignatureError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// API returned a non-empty error list
    #[error("Kraken API error: {}", .0.join(", "))]
    ApiError(Vec<String>),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Private endpoint called without a complete key pair
    #[error("API key and secret are required for private endpoints")]
    MissingCredentials,

    /// Requested entity absent from the response
    #[error("Not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Signing
// =============================================================================

/// Sign a private request.
///
/// `secret` is the base64 private key as issued by Kraken, `path` the URI path
/// (e.g. `/0/private/Balance`) and `postdata` the exact form-encoded body.
pub fn sign_request(
    secret: &str,
    path: &str,
    nonce: u64,
    postdata: &str,
) -> Result<String, KrakenRestError> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use hmac::{Hmac, Mac};
    use sha2::{Digest, Sha256, Sha512};

    let decoded_secret = STANDARD
        .decode(secret)
        .map_err(|e| KrakenRestError::SignatureError(format!("Invalid base64 secret: {}", e)))?;

    let mut sha256 = Sha256::new();
    sha256.update(nonce.to_string().as_bytes());
    sha256.update(postdata.as_bytes());
    let digest = sha256.finalize();

    let mut mac = Hmac::<Sha512>::new_from_slice(&decoded_secret)
        .map_err(|e| KrakenRestError::SignatureError(format!("HMAC error: {}", e)))?;
    mac.update(path.as_bytes());
    mac.update(&digest);

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

// =============================================================================
// Naming helpers
// =============================================================================

/// Collapse Kraken asset aliases onto one code (`BTC` → `XBT`).
fn canonical_asset(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    match upper.as_str() {
        "BTC" => "XBT".to_string(),
        "DOGE" => "XDG".to_string(),
        _ => upper,
    }
}

/// Whether a Kraken balance key refers to `code`.
///
/// Kraken prefixes legacy assets with `X` (crypto) or `Z` (fiat), so `XXBT`
/// and `ZUSD` match `XBT` and `USD`.
pub fn asset_matches(kraken_asset: &str, code: &str) -> bool {
    let wanted = canonical_asset(code);
    let got = kraken_asset.trim().to_ascii_uppercase();

    if got == wanted {
        return true;
    }
    got.len() == 4
        && (got.starts_with('X') || got.starts_with('Z'))
        && got[1..] == wanted
}

/// Whether a Kraken pair name refers to the pair with `altname`.
///
/// Legacy pairs are reported as e.g. `XXMRXXBT` while orders describe them by
/// altname `XMRXBT`.
pub fn pair_matches(kraken_pair: &str, altname: &str) -> bool {
    let got = kraken_pair.trim().to_ascii_uppercase();
    let wanted = altname.trim().to_ascii_uppercase();

    if got == wanted {
        return true;
    }
    if got.len() == 8 {
        let (base, quote) = got.split_at(4);
        let legacy = |s: &str| s.starts_with('X') || s.starts_with('Z');
        if legacy(base) && legacy(quote) {
            return format!("{}{}", &base[1..], &quote[1..]) == wanted;
        }
    }
    false
}

// =============================================================================
// Kraken REST Client
// =============================================================================

/// Kraken REST API client for spot account data.
pub struct KrakenRestClient {
    /// HTTP client
    client: Client,
    /// API key pair
    credentials: ApiCredentials,
    /// API base URL
    base_url: String,
    /// Last nonce handed out (milliseconds)
    last_nonce: AtomicU64,
}

impl KrakenRestClient {
    /// Create a new Kraken REST client.
    pub fn new(credentials: ApiCredentials) -> Self {
        Self::with_base_url(credentials, Exchange::Kraken.base_url())
    }

    /// Create a client against a different host (proxies, mock servers).
    pub fn with_base_url(credentials: ApiCredentials, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            last_nonce: AtomicU64::new(0),
        }
    }

    /// Get the base URL for API requests.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Next nonce: wall-clock millis, bumped so it never repeats or decreases.
    fn next_nonce(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last_nonce.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last_nonce
                .compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// Unwrap the `{ "error": [...], "result": ... }` envelope.
    fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, KrakenRestError> {
        let envelope: KrakenResponse<T> =
            serde_json::from_str(body).map_err(|e| KrakenRestError::ParseError(e.to_string()))?;

        if !envelope.error.is_empty() {
            return Err(KrakenRestError::ApiError(envelope.error));
        }

        envelope
            .result
            .ok_or_else(|| KrakenRestError::ParseError("Missing result in response".to_string()))
    }

    /// Read the body and map HTTP failures.
    async fn read_body(response: reqwest::Response) -> Result<String, KrakenRestError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KrakenRestError::ParseError(e.to_string()))?;

        if !status.is_success() {
            // Kraken usually still sends the envelope on HTTP errors
            if let Ok(envelope) = serde_json::from_str::<KrakenResponse<serde_json::Value>>(&body) {
                if !envelope.error.is_empty() {
                    return Err(KrakenRestError::ApiError(envelope.error));
                }
            }
            return Err(KrakenRestError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        Ok(body)
    }

    /// Send a GET request to a public endpoint.
    async fn get_public<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T, KrakenRestError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(endpoint, "Kraken public request");

        let response = timeout(
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            self.client.get(&url).query(&params).send(),
        )
        .await
        .map_err(|_| KrakenRestError::Timeout)?
        .map_err(|e| KrakenRestError::RequestFailed(e.to_string()))?;

        let body = Self::read_body(response).await?;
        Self::parse_envelope(&body)
    }

    /// Send a signed POST request to a private endpoint.
    async fn post_private<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        mut params: Vec<(&str, String)>,
    ) -> Result<T, KrakenRestError> {
        if !self.credentials.is_complete() {
            return Err(KrakenRestError::MissingCredentials);
        }

        let nonce = self.next_nonce();
        params.insert(0, ("nonce", nonce.to_string()));

        let postdata = serde_urlencoded::to_string(&params)
            .map_err(|e| KrakenRestError::SignatureError(format!("Form encoding failed: {}", e)))?;
        let signature = sign_request(&self.credentials.api_secret, endpoint, nonce, &postdata)?;

        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(endpoint, nonce, "Kraken private request");

        let response = timeout(
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            self.client
                .post(&url)
                .header("API-Key", &self.credentials.api_key)
                .header("API-Sign", signature)
                .header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
                .body(postdata)
                .send(),
        )
        .await
        .map_err(|_| KrakenRestError::Timeout)?
        .map_err(|e| KrakenRestError::RequestFailed(e.to_string()))?;

        let body = Self::read_body(response).await?;
        Self::parse_envelope(&body)
    }

    // =========================================================================
    // Market Data API
    // =========================================================================

    /// Get ticker information, keyed by Kraken pair name.
    ///
    /// Without a pair Kraken reports every tradeable pair.
    ///
    /// # Endpoint
    ///
    /// `GET /0/public/Ticker`
    pub async fn ticker(
        &self,
        pair: Option<&str>,
    ) -> Result<BTreeMap<String, KrakenTicker>, KrakenRestError> {
        let params = match pair {
            Some(p) => vec![("pair", p.to_string())],
            None => vec![],
        };
        self.get_public("/0/public/Ticker", params).await
    }

    /// Get order book depth, keyed by Kraken pair name.
    ///
    /// # Endpoint
    ///
    /// `GET /0/public/Depth`
    pub async fn depth(
        &self,
        pair: &str,
        count: Option<u32>,
    ) -> Result<BTreeMap<String, KrakenDepth>, KrakenRestError> {
        let mut params = vec![("pair", pair.to_string())];
        if let Some(count) = count {
            params.push(("count", count.to_string()));
        }
        self.get_public("/0/public/Depth", params).await
    }

    // =========================================================================
    // Account API
    // =========================================================================

    /// Get the account's open orders, keyed by transaction ID.
    ///
    /// # Endpoint
    ///
    /// `POST /0/private/OpenOrders`
    pub async fn open_orders(&self) -> Result<BTreeMap<String, KrakenOrder>, KrakenRestError> {
        let result: KrakenOpenOrders = self.post_private("/0/private/OpenOrders", vec![]).await?;
        Ok(result.open)
    }

    /// Get extended balances (total and amount held by open orders).
    ///
    /// # Endpoint
    ///
    /// `POST /0/private/BalanceEx`
    pub async fn balance_ex(&self) -> Result<BTreeMap<String, KrakenBalanceEx>, KrakenRestError> {
        self.post_private("/0/private/BalanceEx", vec![]).await
    }

    /// Get the account's trade history, oldest first.
    ///
    /// `start` and `end` are unix seconds and bound the window inclusively.
    /// Pages through the full result set.
    ///
    /// # Endpoint
    ///
    /// `POST /0/private/TradesHistory`
    pub async fn trades_history(
        &self,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<KrakenTrade>, KrakenRestError> {
        let mut trades: Vec<KrakenTrade> = Vec::new();

        loop {
            let mut params = vec![("ofs", trades.len().to_string())];
            if let Some(start) = start {
                params.push(("start", start.to_string()));
            }
            if let Some(end) = end {
                params.push(("end", end.to_string()));
            }

            let page: KrakenTradesHistory =
                self.post_private("/0/private/TradesHistory", params).await?;
            let fetched = page.trades.len();

            trades.extend(page.trades.into_iter().map(|(txid, mut trade)| {
                trade.txid = txid;
                trade
            }));

            if fetched < TRADES_PAGE_SIZE || trades.len() >= page.count {
                break;
            }
        }

        trades.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(trades)
    }

    /// Look up a single order by transaction ID.
    ///
    /// # Endpoint
    ///
    /// `POST /0/private/QueryOrders`
    pub async fn query_order(&self, txid: &str) -> Result<KrakenOrder, KrakenRestError> {
        let params = vec![("txid", txid.to_string()), ("trades", "false".to_string())];

        let mut orders: BTreeMap<String, KrakenOrder> =
            self.post_private("/0/private/QueryOrders", params).await?;

        orders
            .remove(txid)
            .ok_or_else(|| KrakenRestError::NotFound(format!("order {}", txid)))
    }
}

// =============================================================================
// Kraken Types (from API responses)
// =============================================================================

/// Standard Kraken response envelope.
#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

/// Ticker entry. Array fields follow Kraken's positional layout.
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenTicker {
    /// Ask `[price, whole lot volume, lot volume]`
    pub a: Vec<Decimal>,
    /// Bid `[price, whole lot volume, lot volume]`
    pub b: Vec<Decimal>,
    /// Last trade closed `[price, lot volume]`
    pub c: Vec<Decimal>,
    /// Volume `[today, last 24 hours]`
    pub v: Vec<Decimal>,
    /// Volume weighted average price `[today, last 24 hours]`
    #[serde(default)]
    pub p: Vec<Decimal>,
    /// Number of trades `[today, last 24 hours]`
    #[serde(default)]
    pub t: Vec<u64>,
    /// Low `[today, last 24 hours]`
    #[serde(default)]
    pub l: Vec<Decimal>,
    /// High `[today, last 24 hours]`
    #[serde(default)]
    pub h: Vec<Decimal>,
    /// Today's opening price
    #[serde(default)]
    pub o: Decimal,
}

impl KrakenTicker {
    fn field(values: &[Decimal], name: &str) -> Result<Decimal, KrakenRestError> {
        values
            .first()
            .copied()
            .ok_or_else(|| KrakenRestError::ParseError(format!("Ticker field '{}' is empty", name)))
    }

    /// Best ask price
    pub fn ask_price(&self) -> Result<Decimal, KrakenRestError> {
        Self::field(&self.a, "a")
    }

    /// Best bid price
    pub fn bid_price(&self) -> Result<Decimal, KrakenRestError> {
        Self::field(&self.b, "b")
    }

    /// Last trade price
    pub fn last_price(&self) -> Result<Decimal, KrakenRestError> {
        Self::field(&self.c, "c")
    }

    /// Volume over the last 24 hours
    pub fn volume_24h(&self) -> Result<Decimal, KrakenRestError> {
        self.v
            .get(1)
            .copied()
            .ok_or_else(|| KrakenRestError::ParseError("Ticker field 'v' lacks 24h entry".to_string()))
    }
}

/// Order book depth for one pair. Levels are `(price, volume, timestamp)`.
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenDepth {
    /// Ask levels, best first
    pub asks: Vec<(Decimal, Decimal, i64)>,
    /// Bid levels, best first
    pub bids: Vec<(Decimal, Decimal, i64)>,
}

/// Order description block.
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenOrderDescr {
    /// Pair altname (e.g. "XMRXBT")
    pub pair: String,
    /// "buy" or "sell"
    #[serde(rename = "type")]
    pub side: String,
    /// Order type (limit, market, ...)
    pub ordertype: String,
    /// Primary price
    #[serde(default)]
    pub price: Decimal,
    /// Secondary price
    #[serde(default)]
    pub price2: Decimal,
    /// Human readable summary
    #[serde(default)]
    pub order: String,
}

/// Order as reported by OpenOrders and QueryOrders.
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenOrder {
    /// Order status (pending, open, closed, canceled, expired)
    pub status: String,
    /// Open time (unix seconds)
    #[serde(default)]
    pub opentm: f64,
    /// Order description
    pub descr: KrakenOrderDescr,
    /// Volume the order was placed with
    pub vol: Decimal,
    /// Volume executed so far
    pub vol_exec: Decimal,
    /// Total cost of executed volume
    #[serde(default)]
    pub cost: Decimal,
    /// Total fee
    #[serde(default)]
    pub fee: Decimal,
    /// Average execution price
    #[serde(default)]
    pub price: Decimal,
    /// User reference ID
    #[serde(default)]
    pub userref: Option<i64>,
    /// Comma separated order flags
    #[serde(default)]
    pub oflags: String,
}

#[derive(Debug, Deserialize)]
struct KrakenOpenOrders {
    #[serde(default)]
    open: BTreeMap<String, KrakenOrder>,
}

/// Extended balance of one asset.
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenBalanceEx {
    /// Total balance
    pub balance: Decimal,
    /// Portion held by open orders
    #[serde(default)]
    pub hold_trade: Decimal,
}

impl KrakenBalanceEx {
    /// Portion available for new orders
    pub fn available(&self) -> Decimal {
        (self.balance - self.hold_trade).max(Decimal::ZERO)
    }
}

/// Trade from TradesHistory.
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenTrade {
    /// Trade ID (the key of the response map)
    #[serde(default)]
    pub txid: String,
    /// Order responsible for the trade
    pub ordertxid: String,
    /// Pair name (e.g. "XXMRXXBT")
    pub pair: String,
    /// Execution time (unix seconds, fractional)
    pub time: f64,
    /// "buy" or "sell"
    #[serde(rename = "type")]
    pub side: String,
    /// Order type of the parent order
    #[serde(default)]
    pub ordertype: String,
    /// Average price
    pub price: Decimal,
    /// Total cost
    pub cost: Decimal,
    /// Total fee
    pub fee: Decimal,
    /// Volume
    pub vol: Decimal,
}

impl KrakenTrade {
    /// Execution time as a UTC timestamp
    pub fn executed_at(&self) -> Result<DateTime<Utc>, KrakenRestError> {
        let secs = self.time.trunc() as i64;
        let nanos = ((self.time - self.time.trunc()) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
        DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
            KrakenRestError::ParseError(format!("Trade {} has invalid time {}", self.txid, self.time))
        })
    }
}

#[derive(Debug, Deserialize)]
struct KrakenTradesHistory {
    #[serde(default)]
    trades: BTreeMap<String, KrakenTrade>,
    #[serde(default)]
    count: usize,
}

// =============================================================================
// Tests
// =============================================================================
