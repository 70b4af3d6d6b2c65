//! exbridge Domain Layer
//!
//! Exchange-agnostic types shared by every adapter, with zero I/O.
//! Contains entities, value objects, market data and credentials.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod credentials;
pub mod entities;
pub mod market_data;
pub mod value_objects;

// Re-export commonly used types
pub use credentials::{ApiCredentials, Exchange, ExchangeConfig};
pub use entities::{AssetBalance, BalancePair, OpenOrder, Trade, TradeWindow};
pub use market_data::{BookLevel, OrderBook, TickerSnapshot};
pub use value_objects::{DomainError, Precision, Price, Side, TradingPair};
