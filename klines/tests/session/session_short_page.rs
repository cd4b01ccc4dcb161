use klines::{Session, Shutdown};
use klines_core::{ExchangeId, Granularity, KlinesError, StopReason};
use klines_mock::{MockBehavior, ScriptedClient};

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn three_pages_then_short_page_stops() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::builder("binance-stub")
        .exchange(ExchangeId::Binance)
        .build();
    ctl.script_at(T0, MockBehavior::Return(minutes(T0, 1000))).await;
    ctl.script_at(T0 + 999 * MIN + 1, MockBehavior::Return(minutes(T0 + 1000 * MIN, 1000)))
        .await;
    ctl.script_at(T0 + 1999 * MIN + 1, MockBehavior::Return(minutes(T0 + 2000 * MIN, 400)))
        .await;

    let cfg = config(tmp.path(), ExchangeId::Binance, T0);
    let shutdown = Shutdown::new();
    let report = Session::new(cfg, client, shutdown.token())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.stop, StopReason::ShortPage);
    assert_eq!(report.records, 2400);
    assert_eq!(report.pages, 3);
    assert_eq!(report.shards, 2);
    assert_eq!(report.final_since, T0 + 2399 * MIN + 1);

    let reqs = ctl.requests().await;
    assert_eq!(reqs.len(), 3, "no fetch after the short page");
    assert_eq!(reqs[2].since, T0 + 1999 * MIN + 1);
    assert!(reqs.iter().all(|r| r.limit == 1000 && r.until.is_none()));

    let shards = read_shards(&tmp.path().join("btc"));
    assert_eq!(row_count(&shards["binance_kline_btcusdt_1min_2024-01-01.csv"]), 1440);
    assert_eq!(row_count(&shards["binance_kline_btcusdt_1min_2024-01-02.csv"]), 960);
}

#[tokio::test(start_paused = true)]
async fn empty_first_page_ends_without_files() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::builder("stub")
        .exchange(ExchangeId::Binance)
        .build();
    let report = Session::new(
        config(tmp.path(), ExchangeId::Binance, T0),
        client,
        Shutdown::new().token(),
    )
    .unwrap()
    .run()
    .await
    .unwrap();
    assert_eq!(report.stop, StopReason::ShortPage);
    assert_eq!(report.records, 0);
    assert_eq!(ctl.request_count().await, 1);
    assert!(read_shards(&tmp.path().join("btc")).is_empty());
}

#[tokio::test(start_paused = true)]
async fn rows_follow_the_shard_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::new_with_controller("stub");
    let mut page = minutes(T0, 1);
    page[0].high = "42298.625".parse().unwrap();
    page[0].low = "0.000000015".parse().unwrap();
    page[0].open = "42283".parse().unwrap();
    page[0].close = "42290.1".parse().unwrap();
    page[0].volume = "35.3".parse().unwrap();
    ctl.script_at(T0, MockBehavior::Return(page)).await;

    Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();

    let shards = read_shards(&tmp.path().join("btc"));
    assert_eq!(
        shards["mock_kline_btcusdt_1min_2024-01-01.csv"],
        "1704067200000,42298.62500000,0.00000002,42283.00000000,42290.10000000,35.30000000\n"
    );
}

#[tokio::test(start_paused = true)]
async fn page_size_is_capped_by_the_client() {
    let (client, _ctl) = ScriptedClient::builder("stub").max_page_size(500).build();
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = config(tmp.path(), ExchangeId::Mock, T0);
    cfg.page_size = 5000;
    let session = Session::new(cfg, client, Shutdown::new().token()).unwrap();
    assert_eq!(session.page_size(), 500);
}

#[test]
fn unsupported_granularity_is_rejected_up_front() {
    let (client, _ctl) = ScriptedClient::builder("stub")
        .granularities(&[Granularity::M1])
        .build();
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = config(tmp.path(), ExchangeId::Mock, T0);
    cfg.granularity = Granularity::H4;
    assert!(matches!(
        Session::new(cfg, client, Shutdown::new().token()),
        Err(KlinesError::Unsupported { .. })
    ));
}
