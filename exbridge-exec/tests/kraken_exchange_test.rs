//! Integration tests for the Kraken adapter
//!
//! Drives `KrakenExchange` through the `ExchangeAdapter` interface against
//! `StubKrakenApi`, so no network access is needed.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use exbridge_connectors::{KrakenDepth, KrakenRestError};
use exbridge_domain::{DomainError, Precision, Side, TradingPair};
use exbridge_exec::stub::{order_fixture, ticker_fixture, trade_fixture};
use exbridge_exec::{ExchangeAdapter, ExecError, KrakenExchange, RetryPolicy, StubKrakenApi};

/// Test helper: XMR/XBT adapter over a fresh stub, retrying without delay
fn make_exchange() -> KrakenExchange<StubKrakenApi> {
    let pair = TradingPair::new("XMR", "XBT").unwrap();
    KrakenExchange::with_client(StubKrakenApi::new(), pair, true)
        .with_ticker_retry(RetryPolicy::immediate(4))
}

fn seed_ticker(exchange: &KrakenExchange<StubKrakenApi>) {
    exchange.client().set_ticker(
        "XXMRXXBT",
        ticker_fixture(dec!(0.002165), dec!(0.00216), dec!(0.00217), dec!(1540.25)),
    );
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_adapter_configuration() {
    let exchange = make_exchange();

    assert_eq!(exchange.name(), "Kraken");
    assert_eq!(exchange.pair().ticker(), "XMRXBT");
    assert!(exchange.limit_only());
    assert_eq!(exchange.precision().decimal_places(), 8);
}

#[test]
fn test_live_constructor_rejects_blank_coin() {
    let config = exbridge_domain::ExchangeConfig::new("key", "c2VjcmV0", false);
    let result = KrakenExchange::new(config, "", "XBT");

    assert!(matches!(result, Err(ExecError::Domain(DomainError::InvalidSymbol(_)))));
}

// =============================================================================
// Open orders
// =============================================================================

#[tokio::test]
async fn test_open_orders_normalized() {
    let exchange = make_exchange();
    let stub = exchange.client();
    stub.add_open_order("OAAA", order_fixture("XMRXBT", "buy", dec!(2.5), dec!(0.5)));
    stub.add_open_order("OBBB", order_fixture("XMRXBT", "SELL", dec!(1), dec!(0)));
    stub.add_open_order("OCCC", order_fixture("ETHXBT", "buy", dec!(3), dec!(1)));

    let orders = exchange.fetch_open_orders().await.unwrap();

    assert_eq!(orders.len(), 2);
    assert!(!orders.contains_key("OCCC"));

    let buy = &orders["OAAA"];
    assert_eq!(buy.id, "OAAA");
    assert_eq!(buy.side, Side::Buy);
    assert_eq!(buy.remaining, dec!(2.0));

    let sell = &orders["OBBB"];
    assert_eq!(sell.side, Side::Sell);
    assert_eq!(sell.remaining, dec!(1));

    for order in orders.values() {
        assert_eq!(order.remaining, order.original - order.executed);
        assert!(matches!(order.side, Side::Buy | Side::Sell));
    }
}

#[tokio::test]
async fn test_open_orders_reject_overfilled_order() {
    let exchange = make_exchange();
    exchange
        .client()
        .add_open_order("OBAD", order_fixture("XMRXBT", "buy", dec!(1), dec!(2)));

    let result = exchange.fetch_open_orders().await;

    assert!(matches!(
        result,
        Err(ExecError::Domain(DomainError::NegativeRemaining { .. }))
    ));
}

#[tokio::test]
async fn test_open_orders_propagate_client_failure() {
    let exchange = make_exchange();
    exchange.client().set_fail_next(true);

    let result = exchange.fetch_open_orders().await;

    assert!(matches!(result, Err(ExecError::Client(KrakenRestError::RequestFailed(_)))));
}

// =============================================================================
// Ticker
// =============================================================================

#[tokio::test]
async fn test_ticker_snapshot() {
    let exchange = make_exchange();
    seed_ticker(&exchange);

    let ticker = exchange.fetch_ticker().await.unwrap();

    assert_eq!(ticker.pair, "XXMRXXBT");
    assert_eq!(ticker.last.as_decimal(), dec!(0.002165));
    assert_eq!(ticker.bid.as_decimal(), dec!(0.00216));
    assert_eq!(ticker.ask.as_decimal(), dec!(0.00217));
    assert_eq!(ticker.volume_24h, dec!(1540.25));
    assert_eq!(exchange.client().ticker_calls(), 1);
}

#[tokio::test]
async fn test_ticker_gives_up_after_four_attempts() {
    let exchange = make_exchange();
    seed_ticker(&exchange);
    exchange.client().fail_next_tickers(u32::MAX);

    let result = exchange.fetch_ticker().await;

    match result {
        Err(ExecError::TickerUnavailable { pair, attempts, last_error }) => {
            assert_eq!(pair, "XMRXBT");
            assert_eq!(attempts, 4);
            assert!(last_error.contains("timed out"), "got {}", last_error);
        }
        other => panic!("expected TickerUnavailable, got {:?}", other),
    }
    assert_eq!(exchange.client().ticker_calls(), 4);
}

#[tokio::test]
async fn test_ticker_recovers_after_transient_failures() {
    let exchange = make_exchange();
    seed_ticker(&exchange);
    exchange.client().fail_next_tickers(3);

    let ticker = exchange.fetch_ticker().await.unwrap();

    assert_eq!(ticker.last.as_decimal(), dec!(0.002165));
    assert_eq!(exchange.client().ticker_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_ticker_backs_off_between_attempts() {
    let exchange = make_exchange().with_ticker_retry(RetryPolicy {
        max_attempts: 4,
        initial_delay_ms: 100,
        max_delay_ms: 150,
    });
    seed_ticker(&exchange);
    exchange.client().fail_next_tickers(u32::MAX);
    let start = tokio::time::Instant::now();

    assert!(exchange.fetch_ticker().await.is_err());

    // 100 + 150 + 150, capped, nothing after the last attempt
    assert!(start.elapsed() >= std::time::Duration::from_millis(400));
}

// =============================================================================
// Derived prices
// =============================================================================

#[tokio::test]
async fn test_derived_prices_from_ticker() {
    let exchange = make_exchange();
    seed_ticker(&exchange);

    let last = exchange.fetch_last_trade_price().await.unwrap();
    let ask = exchange.fetch_lowest_ask().await.unwrap();
    let bid = exchange.fetch_highest_bid().await.unwrap();

    assert_eq!(last.as_decimal(), dec!(0.002165));
    assert_eq!(ask.as_decimal(), dec!(0.00217));
    assert_eq!(bid.as_decimal(), dec!(0.00216));
}

#[tokio::test]
async fn test_derived_prices_degrade_to_none() {
    let exchange = make_exchange();
    seed_ticker(&exchange);
    exchange.client().fail_next_tickers(u32::MAX);

    assert!(exchange.fetch_last_trade_price().await.is_none());
    assert!(exchange.fetch_lowest_ask().await.is_none());
    assert!(exchange.fetch_highest_bid().await.is_none());
    assert_eq!(exchange.client().ticker_calls(), 12);
}

// =============================================================================
// Volume
// =============================================================================

#[tokio::test]
async fn test_24h_volume_for_coin() {
    let exchange = make_exchange();
    seed_ticker(&exchange);

    let volume = exchange.fetch_24h_volume(Some("XMR")).await.unwrap();

    assert_eq!(volume.len(), 1);
    assert_eq!(volume["XMR"], dec!(1540.25));
}

#[tokio::test]
async fn test_24h_volume_all_markets() {
    let exchange = make_exchange();
    seed_ticker(&exchange);
    exchange.client().set_ticker(
        "XETHXXBT",
        ticker_fixture(dec!(0.05), dec!(0.049), dec!(0.051), dec!(320)),
    );

    let volume = exchange.fetch_24h_volume(None).await.unwrap();

    assert_eq!(volume.len(), 2);
    assert_eq!(volume["XXMRXXBT"], dec!(1540.25));
    assert_eq!(volume["XETHXXBT"], dec!(320));
}

#[tokio::test]
async fn test_24h_volume_unknown_coin_fails() {
    let exchange = make_exchange();
    seed_ticker(&exchange);

    let result = exchange.fetch_24h_volume(Some("DOGE")).await;

    assert!(matches!(result, Err(ExecError::Client(KrakenRestError::ApiError(_)))));
}

// =============================================================================
// Balances
// =============================================================================

#[tokio::test]
async fn test_balances_total_free_plus_locked() {
    let exchange = make_exchange();
    let stub = exchange.client();
    stub.set_balance("XXBT", dec!(0.75), dec!(0.25));
    stub.set_balance("XXMR", dec!(40), dec!(2.5));

    let balances = exchange.fetch_balances().await.unwrap();

    assert_eq!(balances.base.name, "XBT");
    assert_eq!(balances.base.total, dec!(1.00));
    assert_eq!(balances.coin.name, "XMR");
    assert_eq!(balances.coin.total, dec!(42.5));
    assert_eq!(balances.coin.total, balances.coin.free + balances.coin.locked);
    assert_eq!(stub.balance_calls(), 2);
}

#[tokio::test]
async fn test_balances_missing_asset_is_zero() {
    let exchange = make_exchange();
    exchange.client().set_balance("XXMR", dec!(1), dec!(0));

    let balances = exchange.fetch_balances().await.unwrap();

    assert_eq!(balances.base.total, Decimal::ZERO);
    assert_eq!(balances.coin.total, dec!(1));
}

#[tokio::test]
async fn test_balances_fail_if_either_call_fails() {
    let exchange = make_exchange();
    exchange.client().set_fail_next(true);

    assert!(exchange.fetch_balances().await.is_err());
}

#[tokio::test]
async fn test_balances_fail_if_second_call_fails() {
    let exchange = make_exchange();
    let stub = exchange.client();
    stub.set_balance("XXBT", dec!(0.75), dec!(0.25));
    stub.set_balance("XXMR", dec!(40), dec!(2.5));
    stub.fail_balance_call(2);

    let result = exchange.fetch_balances().await;

    match result {
        Err(ExecError::Client(KrakenRestError::RequestFailed(msg))) => {
            assert!(msg.contains("XMR"), "got {}", msg);
        }
        other => panic!("expected RequestFailed, got {:?}", other),
    }
    assert_eq!(stub.balance_calls(), 2);
}

// =============================================================================
// Trade history
// =============================================================================

#[tokio::test]
async fn test_trade_history_is_reversed() {
    let exchange = make_exchange();
    let stub = exchange.client();
    stub.push_trade(trade_fixture("T1", "XXMRXXBT", "buy", dec!(0.0021), dec!(1), 1_700_000_000.0));
    stub.push_trade(trade_fixture("T2", "XXMRXXBT", "sell", dec!(0.0022), dec!(2), 1_700_000_100.0));
    stub.push_trade(trade_fixture("T3", "XXMRXXBT", "buy", dec!(0.0023), dec!(3), 1_700_000_200.0));
    stub.push_trade(trade_fixture("E1", "XETHXXBT", "buy", dec!(0.05), dec!(1), 1_700_000_300.0));

    let trades = exchange.fetch_trade_history(None, None).await.unwrap();
    let ids: Vec<&str> = trades.iter().map(|t| t.id.as_str()).collect();

    assert_eq!(ids, vec!["T3", "T2", "T1"]);
    assert_eq!(trades[1].side, Side::Sell);
    assert_eq!(trades[0].cost, dec!(0.0069));
    assert_eq!(trades[2].executed_at.timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_trade_history_window() {
    let exchange = make_exchange();
    let stub = exchange.client();
    stub.push_trade(trade_fixture("T1", "XXMRXXBT", "buy", dec!(0.0021), dec!(1), 1_700_000_000.0));
    stub.push_trade(trade_fixture("T2", "XXMRXXBT", "buy", dec!(0.0022), dec!(1), 1_700_000_100.0));
    stub.push_trade(trade_fixture("T3", "XXMRXXBT", "buy", dec!(0.0023), dec!(1), 1_700_000_200.0));

    let start = Utc.timestamp_opt(1_700_000_050, 0).unwrap();
    let trades = exchange.fetch_trade_history(Some(start), None).await.unwrap();
    let ids: Vec<&str> = trades.iter().map(|t| t.id.as_str()).collect();

    assert_eq!(ids, vec!["T3", "T2"]);
}

#[tokio::test]
async fn test_trade_history_rejects_inverted_window() {
    let exchange = make_exchange();
    let start = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
    let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    let result = exchange.fetch_trade_history(Some(start), Some(end)).await;

    assert!(matches!(
        result,
        Err(ExecError::Domain(DomainError::InvalidTimeRange(_)))
    ));
    assert_eq!(exchange.client().trade_calls(), 0);
}

// =============================================================================
// Order book and order lookup
// =============================================================================

#[tokio::test]
async fn test_order_book_passthrough() {
    let exchange = make_exchange();
    exchange.client().set_order_book(
        "XXMRXXBT",
        KrakenDepth {
            asks: vec![(dec!(0.00217), dec!(12), 1_700_000_000)],
            bids: vec![
                (dec!(0.00216), dec!(3.5), 1_700_000_001),
                (dec!(0.00215), dec!(8), 1_700_000_002),
            ],
        },
    );

    let book = exchange.fetch_order_book().await.unwrap();

    assert_eq!(book.pair, "XXMRXXBT");
    assert_eq!(book.asks.len(), 1);
    assert_eq!(book.bids[1].price, dec!(0.00215));
    assert_eq!(book.bids[1].volume, dec!(8));
    assert_eq!(book.bids[1].timestamp, 1_700_000_002);
}

#[tokio::test]
async fn test_order_book_unknown_market() {
    let exchange = make_exchange();

    let result = exchange.fetch_order_book().await;

    assert!(matches!(result, Err(ExecError::UnknownMarket(_))));
}

#[tokio::test]
async fn test_order_total_amount() {
    let exchange = make_exchange().with_precision(Precision::new(3).unwrap());
    exchange
        .client()
        .add_closed_order("ODONE", order_fixture("XMRXBT", "sell", dec!(1.23456), dec!(1.23456)));

    let amount = exchange.fetch_order_total_amount("ODONE").await.unwrap();

    assert_eq!(amount, dec!(1.235));
}

#[tokio::test]
async fn test_order_total_amount_unknown_order() {
    let exchange = make_exchange();

    let result = exchange.fetch_order_total_amount("ONOPE").await;

    assert!(matches!(result, Err(ExecError::Client(KrakenRestError::NotFound(_)))));
}

// =============================================================================
// Uniform interface
// =============================================================================

#[tokio::test]
async fn test_adapter_usable_as_trait_object() {
    let exchange = make_exchange();
    seed_ticker(&exchange);
    let adapter: Box<dyn ExchangeAdapter> = Box::new(exchange);

    let bid = adapter.fetch_highest_bid().await;

    assert_eq!(adapter.name(), "Kraken");
    assert_eq!(bid.map(|p| p.as_decimal()), Some(dec!(0.00216)));
}
