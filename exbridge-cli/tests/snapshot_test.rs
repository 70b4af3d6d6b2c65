//! Snapshot collection over a stubbed Kraken account.

use rust_decimal_macros::dec;

use exbridge_cli::{build_adapter, collect_snapshot, Config};
use exbridge_domain::TradingPair;
use exbridge_exec::stub::{order_fixture, ticker_fixture, trade_fixture};
use exbridge_exec::{KrakenExchange, RetryPolicy, StubKrakenApi};

fn seeded_exchange() -> KrakenExchange<StubKrakenApi> {
    let stub = StubKrakenApi::new();
    stub.set_ticker(
        "XXMRXXBT",
        ticker_fixture(dec!(0.0021), dec!(0.0020), dec!(0.0022), dec!(900)),
    );
    stub.set_balance("XXBT", dec!(0.5), dec!(0.1));
    stub.set_balance("XXMR", dec!(12), dec!(3));
    stub.add_open_order("OB", order_fixture("XMRXBT", "sell", dec!(3), dec!(1)));
    stub.add_open_order("OA", order_fixture("XMRXBT", "buy", dec!(2), dec!(0)));
    for (i, txid) in ["T1", "T2", "T3"].iter().enumerate() {
        stub.push_trade(trade_fixture(
            txid,
            "XXMRXXBT",
            "buy",
            dec!(0.0021),
            dec!(1),
            1_700_000_000.0 + i as f64,
        ));
    }

    let pair = TradingPair::new("XMR", "XBT").unwrap();
    KrakenExchange::with_client(stub, pair, true).with_ticker_retry(RetryPolicy::immediate(2))
}

#[tokio::test]
async fn test_snapshot_collects_account_state() {
    let exchange = seeded_exchange();

    let snapshot = collect_snapshot(&exchange, 2).await.unwrap();

    assert_eq!(snapshot.exchange, "Kraken");
    assert_eq!(snapshot.pair, "XMRXBT");
    assert!(snapshot.limit_only);
    assert_eq!(snapshot.balances.base.total, dec!(0.6));
    assert_eq!(snapshot.balances.coin.total, dec!(15));

    let ids: Vec<&str> = snapshot.open_orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["OA", "OB"]);
    assert_eq!(snapshot.partially_filled, 1);

    assert_eq!(snapshot.mid_price, Some(dec!(0.0021)));
    assert_eq!(snapshot.spread, Some(dec!(0.0002)));

    let trades: Vec<&str> = snapshot.recent_trades.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(trades, vec!["T3", "T2"]);
}

#[tokio::test]
async fn test_snapshot_without_ticker() {
    let exchange = seeded_exchange();
    exchange.client().fail_next_tickers(u32::MAX);

    let snapshot = collect_snapshot(&exchange, 10).await.unwrap();

    assert!(snapshot.ticker.is_none());
    assert!(snapshot.mid_price.is_none());
    assert!(snapshot.spread.is_none());
    assert_eq!(snapshot.recent_trades.len(), 3);
    assert_eq!(exchange.client().ticker_calls(), 2);
}

#[tokio::test]
async fn test_snapshot_aborts_on_balance_failure() {
    let exchange = seeded_exchange();
    exchange.client().set_fail_next(true);

    assert!(collect_snapshot(&exchange, 10).await.is_err());
}

#[tokio::test]
async fn test_snapshot_serializes_to_json() -> anyhow::Result<()> {
    let exchange = seeded_exchange();

    let snapshot = collect_snapshot(&exchange, 1).await?;
    let json = serde_json::to_value(&snapshot)?;

    assert_eq!(json["pair"], "XMRXBT");
    assert_eq!(json["open_orders"][0]["side"], "buy");
    assert_eq!(json["recent_trades"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_snapshot_through_configured_stub() {
    let adapter = build_adapter(&Config::test()).unwrap();

    let snapshot = collect_snapshot(adapter.as_ref(), 5).await.unwrap();

    assert_eq!(snapshot.balances.coin.total, dec!(0));
    assert!(snapshot.open_orders.is_empty());
    assert!(snapshot.ticker.is_none());
}
