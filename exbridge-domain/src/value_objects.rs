//! Value Objects for the exbridge domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Price must be positive
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity must be non-negative
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Symbol must be a valid asset or pair
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Side label is neither buy nor sell
    #[error("Invalid side: {0}")]
    InvalidSide(String),

    /// Executed quantity exceeds original quantity
    #[error("Order {order_id}: executed {executed} exceeds original {original}")]
    NegativeRemaining {
        /// Exchange order ID
        order_id: String,
        /// Original order quantity
        original: Decimal,
        /// Executed quantity reported by the exchange
        executed: Decimal,
    },

    /// Time window with start after end
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Adapter configuration rejected
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// Price
// =============================================================================

/// Price represents a positive decimal price
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(format!("Price must be positive, got {}", value)));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Precision
// =============================================================================

/// Decimal scale and rounding applied when normalizing exchange amounts.
///
/// Passed explicitly into every conversion; nothing in the workspace relies
/// on a shared decimal context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    decimal_places: u32,
    rounding: RoundingStrategy,
}

impl Precision {
    /// Largest scale `rust_decimal` can represent.
    pub const MAX_DECIMAL_PLACES: u32 = 28;

    /// Create a precision with banker's rounding.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidConfig` if `decimal_places` exceeds 28
    pub fn new(decimal_places: u32) -> Result<Self, DomainError> {
        Self::with_rounding(decimal_places, RoundingStrategy::MidpointNearestEven)
    }

    /// Create a precision with an explicit rounding strategy.
    pub fn with_rounding(
        decimal_places: u32,
        rounding: RoundingStrategy,
    ) -> Result<Self, DomainError> {
        if decimal_places > Self::MAX_DECIMAL_PLACES {
            return Err(DomainError::InvalidConfig(format!(
                "decimal places must be <= {}, got {}",
                Self::MAX_DECIMAL_PLACES,
                decimal_places
            )));
        }
        Ok(Self {
            decimal_places,
            rounding,
        })
    }

    /// Number of decimal places kept
    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    /// Round a value to this precision.
    pub fn apply(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.decimal_places, self.rounding)
    }
}

impl Default for Precision {
    /// 8 decimal places (satoshi resolution), banker's rounding.
    fn default() -> Self {
        Self {
            decimal_places: 8,
            rounding: RoundingStrategy::MidpointNearestEven,
        }
    }
}

// =============================================================================
// TradingPair
// =============================================================================

/// Market traded by an adapter: a coin quoted against a base asset.
///
/// # Invariants
/// - Coin and base are non-empty
/// - The Kraken ticker is derived once as `coin + "XBT"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    coin: String,
    base: String,
    ticker: String,
}

impl TradingPair {
    /// Quote asset code Kraken uses for bitcoin.
    pub const KRAKEN_QUOTE: &'static str = "XBT";

    /// Create a trading pair from coin and base symbols
    ///
    /// # Examples
    /// ```
    /// # use exbridge_domain::value_objects::TradingPair;
    /// let pair = TradingPair::new("XMR", "BTC").unwrap();
    /// assert_eq!(pair.ticker(), "XMRXBT");
    /// ```
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSymbol` if either symbol is blank
    pub fn new(coin: impl Into<String>, base: impl Into<String>) -> Result<Self, DomainError> {
        let coin = coin.into().trim().to_string();
        let base = base.into().trim().to_string();

        if coin.is_empty() || base.is_empty() {
            return Err(DomainError::InvalidSymbol("Coin and base must be non-empty".to_string()));
        }

        let ticker = format!("{}{}", coin, Self::KRAKEN_QUOTE);
        Ok(Self { coin, base, ticker })
    }

    /// Traded coin (e.g., "XMR")
    pub fn coin(&self) -> &str {
        &self.coin
    }

    /// Base asset (e.g., "XBT")
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Exchange ticker (e.g., "XMRXBT")
    pub fn ticker(&self) -> &str {
        &self.ticker
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ticker)
    }
}

// =============================================================================
// Side
// =============================================================================

/// Side of an order or trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl Side {
    /// Parse an exchange side label, ignoring case.
    ///
    /// Accepts `buy`/`sell` as well as the single-letter `b`/`s` Kraken uses
    /// in some payloads.
    pub fn from_label(label: &str) -> Result<Self, DomainError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" => Ok(Side::Buy),
            "sell" | "s" => Ok(Side::Sell),
            other => Err(DomainError::InvalidSide(other.to_string())),
        }
    }

    /// Normalized lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
