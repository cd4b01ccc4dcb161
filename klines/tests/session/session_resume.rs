use klines::{Session, Shutdown};
use klines_core::ExchangeId;
use klines_mock::{ScriptedClient, SyntheticSeries};

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn resume_restarts_at_the_latest_shard_day() {
    let tmp = tempfile::tempdir().unwrap();
    let pair_dir = tmp.path().join("btc");
    std::fs::create_dir_all(&pair_dir).unwrap();
    std::fs::write(pair_dir.join("mock_kline_btcusdt_1min_2024-01-01.csv"), "kept\n").unwrap();
    std::fs::write(pair_dir.join("mock_kline_btcusdt_1min_2024-01-02.csv"), "partial\n").unwrap();
    // Other streams do not count.
    std::fs::write(pair_dir.join("mock_kline_btcusdt_1h_2024-01-05.csv"), "other\n").unwrap();

    let (client, ctl) = ScriptedClient::builder("stub")
        .series(SyntheticSeries::new(T0, T0 + 2 * DAY - MIN, MIN))
        .build();
    let mut cfg = config(tmp.path(), ExchangeId::Mock, T0);
    cfg.resume = true;
    let report = Session::new(cfg, client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(ctl.requests().await[0].since, T0 + DAY);
    assert_eq!(report.records, 1440);

    let shards = read_shards(&pair_dir);
    assert_eq!(shards["mock_kline_btcusdt_1min_2024-01-01.csv"], "kept\n");
    assert_eq!(row_count(&shards["mock_kline_btcusdt_1min_2024-01-02.csv"]), 1440);
    assert!(!shards["mock_kline_btcusdt_1min_2024-01-02.csv"].contains("partial"));
}

#[tokio::test(start_paused = true)]
async fn resume_never_moves_begin_backwards() {
    let tmp = tempfile::tempdir().unwrap();
    let pair_dir = tmp.path().join("btc");
    std::fs::create_dir_all(&pair_dir).unwrap();
    std::fs::write(pair_dir.join("mock_kline_btcusdt_1min_2023-12-30.csv"), "old\n").unwrap();

    let (client, ctl) = ScriptedClient::new_with_controller("stub");
    let mut cfg = config(tmp.path(), ExchangeId::Mock, T0 + 5 * MIN);
    cfg.resume = true;
    Session::new(cfg, client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(ctl.requests().await[0].since, T0 + 5 * MIN);
}
