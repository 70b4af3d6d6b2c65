//! exbridge Exchange Connectors
//!
//! Vendor REST clients. Each connector speaks its exchange's wire format
//! and exposes the raw response types; normalization to domain types
//! happens in the adapters built on top.

#![warn(clippy::all)]

// Public modules
pub mod kraken_rest;

// Re-exports
pub use kraken_rest::{
    asset_matches, pair_matches, sign_request, KrakenBalanceEx, KrakenDepth, KrakenOrder,
    KrakenOrderDescr, KrakenRestClient, KrakenRestError, KrakenTicker, KrakenTrade,
};
