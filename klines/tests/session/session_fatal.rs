use klines::{Session, Shutdown};
use klines_core::{ExchangeId, KlinesError};
use klines_mock::{ScriptedClient, SyntheticSeries};

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn unusable_output_dir_is_fatal_before_any_fetch() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let (client, ctl) = ScriptedClient::new_with_controller("stub");
    let err = Session::new(config(&blocker, ExchangeId::Mock, T0), client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, KlinesError::Io { .. }), "{err:?}");
    assert!(!err.is_retryable());
    assert_eq!(ctl.request_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn shard_creation_failure_aborts_and_flushes_earlier_shards() {
    let tmp = tempfile::tempdir().unwrap();
    let pair_dir = tmp.path().join("btc");
    // A directory squatting on the second day's shard name makes its creation fail.
    std::fs::create_dir_all(pair_dir.join("mock_kline_btcusdt_1min_2024-01-02.csv")).unwrap();

    let (client, ctl) = ScriptedClient::builder("stub")
        .series(SyntheticSeries::new(T0, T0 + 10 * DAY, MIN))
        .build();
    let err = Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, KlinesError::Io { .. }), "{err:?}");
    assert_eq!(ctl.request_count().await, 2, "fatal errors are not retried");
    let day1 = std::fs::read_to_string(pair_dir.join("mock_kline_btcusdt_1min_2024-01-01.csv"))
        .unwrap();
    assert_eq!(row_count(&day1), 1440);
}
