use std::time::Duration;

use klines::{Session, Shutdown};
use klines_core::{ExchangeId, KlinesError, StopReason};
use klines_mock::{MockBehavior, ScriptedClient};
use tokio::time::Instant;

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn fetch_errors_retry_the_same_cursor_at_the_fixed_interval() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::new_with_controller("stub");
    ctl.script_at(T0, MockBehavior::Fail(KlinesError::connector("stub", "HTTP 502")))
        .await;
    ctl.script_at(
        T0,
        MockBehavior::Fail(KlinesError::provider_timeout("stub", Duration::from_secs(10))),
    )
    .await;
    ctl.script_at(T0, MockBehavior::Return(minutes(T0, 5))).await;

    let start = Instant::now();
    let report = Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.fetch_errors, 2);
    assert_eq!(report.records, 5);
    assert_eq!(report.stop, StopReason::ShortPage);
    // Three attempts, one per 200ms tick, no backoff.
    assert_eq!(start.elapsed(), Duration::from_millis(600));
    let sinces: Vec<i64> = ctl.requests().await.iter().map(|r| r.since).collect();
    assert_eq!(sinces, vec![T0, T0, T0]);
}

#[tokio::test(start_paused = true)]
async fn out_of_order_page_is_retried_without_persisting() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::new_with_controller("stub");
    let mut bad = minutes(T0, 3);
    bad.swap(0, 2);
    ctl.script_at(T0, MockBehavior::Return(bad)).await;
    ctl.script_at(T0, MockBehavior::Return(minutes(T0, 3))).await;

    let report = Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.fetch_errors, 1);
    assert_eq!(report.records, 3);
    let shards = read_shards(&tmp.path().join("btc"));
    let rows = timestamps(&shards["mock_kline_btcusdt_1min_2024-01-01.csv"]);
    assert_eq!(rows, vec![T0, T0 + MIN, T0 + 2 * MIN]);
}

#[tokio::test(start_paused = true)]
async fn page_starting_before_the_cursor_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::new_with_controller("stub");
    ctl.script_at(T0, MockBehavior::Return(minutes(T0 - MIN, 2))).await;
    ctl.script_at(T0, MockBehavior::Return(vec![])).await;

    let report = Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.fetch_errors, 1);
    assert_eq!(report.records, 0);
    assert_eq!(report.final_since, T0);
}
