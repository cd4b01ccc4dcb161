use klines::{Session, Shutdown};
use klines_core::{ExchangeId, PagePolicy, StopReason, TimestampUnit};
use klines_mock::{MockBehavior, ScriptedClient, SyntheticSeries};

use crate::helpers::*;

fn bitfinex_stub() -> (
    std::sync::Arc<dyn klines_core::ExchangeClient>,
    klines_mock::ScriptController,
) {
    ScriptedClient::builder("bitfinex-stub")
        .exchange(ExchangeId::Bitfinex)
        .policy(PagePolicy::WindowGapSkip)
        .max_page_size(10_000)
        .build()
}

#[tokio::test(start_paused = true)]
async fn empty_window_advances_exactly_one_day_and_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = bitfinex_stub();
    ctl.script_at(T0, MockBehavior::Return(vec![])).await;
    ctl.script_at(T0 + DAY, MockBehavior::Return(minutes(T0 + DAY, 10)))
        .await;

    let mut cfg = config(tmp.path(), ExchangeId::Bitfinex, T0);
    cfg.end = Some(at(T0 + 3 * DAY - 1));
    let report = Session::new(cfg, client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();

    let reqs = ctl.requests().await;
    assert_eq!(reqs[0].since, T0);
    assert_eq!(reqs[0].until, Some(T0 + DAY - 1));
    assert_eq!(reqs[1].since, T0 + 86_400_000);
    assert_eq!(reqs[1].until, Some(T0 + 2 * DAY - 1));

    // Short pages are normal in window mode: the session keeps going.
    let last = T0 + DAY + 9 * MIN;
    assert_eq!(reqs[2].since, last + 1);
    assert_eq!(reqs[2].until, Some(last + DAY));
    // The final window is clipped to the configured end.
    assert_eq!(reqs[3].since, last + 1 + DAY);
    assert_eq!(reqs[3].until, Some(T0 + 3 * DAY - 1));
    assert_eq!(reqs.len(), 4);

    assert_eq!(report.stop, StopReason::PastEnd);
    assert_eq!(report.gap_skips, 3);
    assert_eq!(report.records, 10);
    assert_eq!(report.final_since, last + 1 + 2 * DAY);

    let shards = read_shards(&tmp.path().join("btc"));
    assert_eq!(shards.len(), 1);
    assert!(shards.contains_key("bitfinex_kline_btcusdt_1min_2024-01-02.csv"));
    assert!(!shards.contains_key("bitfinex_kline_btcusdt_1min_2024-01-01.csv"));
}

#[tokio::test(start_paused = true)]
async fn full_windows_page_within_the_day() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = bitfinex_stub();
    ctl.script_at(T0, MockBehavior::Return(minutes(T0, 1000))).await;
    ctl.script_at(T0 + 999 * MIN + 1, MockBehavior::Return(minutes(T0 + 1000 * MIN, 440)))
        .await;

    let mut cfg = config(tmp.path(), ExchangeId::Bitfinex, T0);
    cfg.end = Some(at(T0 + DAY - 1));
    let report = Session::new(cfg, client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.stop, StopReason::PastEnd);
    assert_eq!(report.records, 1440);
    let reqs = ctl.requests().await;
    assert_eq!(reqs[1].until, Some(T0 + DAY - 1));
    // The tail of the day after the last candle is an empty window.
    assert_eq!(reqs.len(), 3);
    assert_eq!(reqs[2].since, T0 + 1439 * MIN + 1);
    assert_eq!(report.gap_skips, 1);

    let shards = read_shards(&tmp.path().join("btc"));
    assert_eq!(row_count(&shards["bitfinex_kline_btcusdt_1min_2024-01-01.csv"]), 1440);
}

#[tokio::test(start_paused = true)]
async fn policy_override_turns_short_pages_into_stops() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = bitfinex_stub();
    ctl.script_at(T0, MockBehavior::Return(minutes(T0, 10))).await;

    let mut cfg = config(tmp.path(), ExchangeId::Bitfinex, T0);
    cfg.policy = Some(PagePolicy::ShortPage);
    let session = Session::new(cfg, client, Shutdown::new().token()).unwrap();
    assert_eq!(session.policy(), PagePolicy::ShortPage);
    let report = session.run().await.unwrap();
    assert_eq!(report.stop, StopReason::ShortPage);
    assert_eq!(ctl.request_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn second_based_client_skips_one_day_of_seconds() {
    const S0: i64 = T0 / 1000;
    const SDAY: i64 = 86_400;
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::builder("seconds-stub")
        .unit(TimestampUnit::Seconds)
        .policy(PagePolicy::WindowGapSkip)
        .build();
    let day2 = SyntheticSeries::new(S0 + SDAY, S0 + SDAY + 9 * 60, 60).page(S0 + SDAY, None, 10);
    ctl.script_at(S0, MockBehavior::Return(vec![])).await;
    ctl.script_at(S0 + SDAY, MockBehavior::Return(day2)).await;

    let mut cfg = config(tmp.path(), ExchangeId::Mock, T0);
    cfg.end = Some(at(T0 + 2 * DAY - 1));
    let report = Session::new(cfg, client, Shutdown::new().token())
        .unwrap()
        .run()
        .await
        .unwrap();

    let reqs = ctl.requests().await;
    assert_eq!((reqs[0].since, reqs[0].until), (S0, Some(S0 + SDAY - 1)));
    assert_eq!((reqs[1].since, reqs[1].until), (S0 + SDAY, Some(S0 + 2 * SDAY - 1)));
    let last = S0 + SDAY + 9 * 60;
    assert_eq!((reqs[2].since, reqs[2].until), (last + 1, Some(S0 + 2 * SDAY - 1)));
    assert_eq!(reqs.len(), 3);

    assert_eq!(report.stop, StopReason::PastEnd);
    assert_eq!(report.gap_skips, 2);
    assert_eq!(report.records, 10);

    let shards = read_shards(&tmp.path().join("btc"));
    assert_eq!(shards.len(), 1);
    let rows = timestamps(&shards["mock_kline_btcusdt_1min_2024-01-02.csv"]);
    assert_eq!(rows.first(), Some(&(S0 + SDAY)));
    assert_eq!(rows.len(), 10);
}
