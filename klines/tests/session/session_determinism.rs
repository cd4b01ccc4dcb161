use klines::{Session, Shutdown};
use klines_core::ExchangeId;
use klines_mock::{ScriptedClient, SyntheticSeries};

use crate::helpers::*;

async fn download(dir: &std::path::Path) {
    let (client, _ctl) = ScriptedClient::builder("stub")
        .exchange(ExchangeId::Binance)
        .series(SyntheticSeries::new(T0 + 7 * MIN, T0 + 2 * DAY, MIN))
        .build();
    Session::new(config(dir, ExchangeId::Binance, T0), client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn identical_runs_produce_identical_files() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    download(a.path()).await;
    download(b.path()).await;
    let first = read_shards(&a.path().join("btc"));
    assert_eq!(first.len(), 3);
    assert_eq!(first, read_shards(&b.path().join("btc")));

    // Rerunning into the same directory truncates instead of appending.
    download(a.path()).await;
    assert_eq!(first, read_shards(&a.path().join("btc")));
    assert_eq!(total_rows(&a.path().join("btc")), 2 * 1440 - 7 + 1);
}

#[tokio::test(start_paused = true)]
async fn sessions_spanning_hundreds_of_days_complete() {
    const HOUR: i64 = 60 * MIN;
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::builder("stub")
        .series(SyntheticSeries::new(T0, T0 + 400 * DAY - HOUR, HOUR))
        .build();
    let mut cfg = config(tmp.path(), ExchangeId::Mock, T0);
    cfg.granularity = klines_core::Granularity::H1;
    let report = Session::new(cfg, client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 400 * 24);
    assert_eq!(report.shards, 400);
    assert_eq!(ctl.request_count().await, 10);
    let shards = read_shards(&tmp.path().join("btc"));
    assert_eq!(shards.len(), 400);
    assert!(shards.values().all(|c| row_count(c) == 24));
}
