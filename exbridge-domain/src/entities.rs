//! Domain Entities for the exbridge domain
//!
//! Normalized, exchange-agnostic views of account state. Every entity is
//! request-scoped: adapters rebuild them on each fetch and never cache them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::{DomainError, Precision, Side};

// =============================================================================
// OpenOrder
// =============================================================================

/// Normalized view of a resting order.
///
/// # Invariants
/// - `remaining = original - executed`
/// - `remaining >= 0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    /// Exchange-assigned order ID
    pub id: String,
    /// Buy or sell
    pub side: Side,
    /// Quantity the order was placed with
    pub original: Decimal,
    /// Quantity already filled
    pub executed: Decimal,
    /// Quantity still resting on the book
    pub remaining: Decimal,
}

impl OpenOrder {
    /// Build an order view from exchange quantities.
    ///
    /// Inputs are rounded with `precision` first; `remaining` is the
    /// difference of the rounded quantities.
    ///
    /// # Errors
    /// - `DomainError::InvalidQuantity` if either input is negative
    /// - `DomainError::NegativeRemaining` if executed exceeds original
    pub fn from_quantities(
        id: impl Into<String>,
        side: Side,
        original: Decimal,
        executed: Decimal,
        precision: &Precision,
    ) -> Result<Self, DomainError> {
        let id = id.into();

        if original < Decimal::ZERO || executed < Decimal::ZERO {
            return Err(DomainError::InvalidQuantity(format!(
                "Order {}: quantities must be non-negative (original {}, executed {})",
                id, original, executed
            )));
        }

        let original = precision.apply(original);
        let executed = precision.apply(executed);

        if executed > original {
            return Err(DomainError::NegativeRemaining {
                order_id: id,
                original,
                executed,
            });
        }

        Ok(Self {
            id,
            side,
            original,
            executed,
            remaining: original - executed,
        })
    }

    /// Whether part of the order has already filled
    pub fn is_partially_filled(&self) -> bool {
        self.executed > Decimal::ZERO
    }
}

// =============================================================================
// Balances
// =============================================================================

/// Balance of a single asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    /// Asset code (e.g., "XMR")
    pub name: String,
    /// Available for new orders
    pub free: Decimal,
    /// Reserved by open orders
    pub locked: Decimal,
    /// `free + locked`
    pub total: Decimal,
}

impl AssetBalance {
    /// Build an asset balance; `total` is the sum of the rounded portions.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if either portion is negative
    pub fn new(
        name: impl Into<String>,
        free: Decimal,
        locked: Decimal,
        precision: &Precision,
    ) -> Result<Self, DomainError> {
        let name = name.into();

        if free < Decimal::ZERO || locked < Decimal::ZERO {
            return Err(DomainError::InvalidQuantity(format!(
                "{} balance must be non-negative (free {}, locked {})",
                name, free, locked
            )));
        }

        let free = precision.apply(free);
        let locked = precision.apply(locked);

        Ok(Self {
            name,
            free,
            locked,
            total: free + locked,
        })
    }
}

/// Balances of both sides of a trading pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePair {
    /// Base (quote) asset balance
    pub base: AssetBalance,
    /// Traded coin balance
    pub coin: AssetBalance,
}

// =============================================================================
// Trade
// =============================================================================

/// A fill from the account's trade history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange trade ID
    pub id: String,
    /// Exchange order ID the fill belongs to
    pub order_id: String,
    /// Exchange pair name
    pub pair: String,
    /// Buy or sell
    pub side: Side,
    /// Fill price
    pub price: Decimal,
    /// Filled volume
    pub volume: Decimal,
    /// Total cost in quote asset
    pub cost: Decimal,
    /// Fee paid in quote asset
    pub fee: Decimal,
    /// Execution time
    pub executed_at: DateTime<Utc>,
}

/// Inclusive time window for trade history queries.
///
/// An unbounded side is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeWindow {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TradeWindow {
    /// Create a window.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTimeRange` if start is after end
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(DomainError::InvalidTimeRange(format!(
                    "start {} is after end {}",
                    s, e
                )));
            }
        }
        Ok(Self { start, end })
    }

    /// Window with no bounds
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Lower bound
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// Upper bound
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Whether a timestamp falls inside the window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

// =============================================================================
// Tests
// =============================================================================
