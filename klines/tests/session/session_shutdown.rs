use std::time::Duration;

use klines::{Session, Shutdown};
use klines_core::{ExchangeId, StopReason};
use klines_mock::{MockBehavior, ScriptedClient, SyntheticSeries};
use tokio::time::Instant;

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn shutdown_during_rate_limit_wait_flushes_written_shards() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::builder("stub")
        .series(SyntheticSeries::new(T0, T0 + 10 * DAY, MIN))
        .build();

    let shutdown = Shutdown::new();
    let session = Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, shutdown.token())
        .unwrap();

    let start = Instant::now();
    let trigger = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            shutdown.trigger();
        })
    };
    let report = session.run().await.unwrap();
    trigger.await.unwrap();

    assert_eq!(report.stop, StopReason::Cancelled);
    // Woken by the cancellation, not by the next tick at 400ms.
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert_eq!(ctl.request_count().await, 1);
    assert_eq!(report.records, 1000);
    assert_eq!(report.final_since, T0 + 999 * MIN + 1);
    assert_eq!(total_rows(&tmp.path().join("btc")), 1000);
}

#[tokio::test(start_paused = true)]
async fn cancellation_before_the_first_tick_fetches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::new_with_controller("stub");
    let shutdown = Shutdown::new();
    shutdown.trigger();
    let report = Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, shutdown.token())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.stop, StopReason::Cancelled);
    assert_eq!(ctl.request_count().await, 0);
    assert_eq!(report.final_since, T0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_does_not_abort_a_stalled_fetch() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::builder("stub")
        .series(SyntheticSeries::new(T0, T0 + 10 * DAY, MIN))
        .build();
    // No timeout layer here, so the session waits on the stalled request.
    ctl.script_at(T0, MockBehavior::Hang).await;

    let shutdown = Shutdown::new();
    let session = Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, shutdown.token())
        .unwrap();
    let run = tokio::spawn(session.run());

    tokio::time::sleep(Duration::from_millis(250)).await;
    shutdown.trigger();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!run.is_finished(), "cancellation is cooperative");
    run.abort();
    assert_eq!(ctl.request_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn in_flight_page_is_persisted_before_the_session_stops() {
    let tmp = tempfile::tempdir().unwrap();
    let (client, ctl) = ScriptedClient::builder("stub")
        .series(SyntheticSeries::new(T0, T0 + 10 * DAY, MIN))
        .build();
    // Full page, so only the cancellation can end the session.
    ctl.script_at(T0, MockBehavior::Delay(Duration::from_secs(2), minutes(T0, 1000)))
        .await;

    let shutdown = Shutdown::new();
    let session = Session::new(config(tmp.path(), ExchangeId::Mock, T0), client, shutdown.token())
        .unwrap();
    let start = Instant::now();
    let run = tokio::spawn(session.run());

    // The first tick fires at 200ms; cancel while the request is in flight.
    tokio::time::sleep(Duration::from_millis(700)).await;
    shutdown.trigger();
    let report = run.await.unwrap().unwrap();

    assert_eq!(report.stop, StopReason::Cancelled);
    assert_eq!(start.elapsed(), Duration::from_millis(2200));
    assert_eq!(ctl.request_count().await, 1);
    assert_eq!(report.records, 1000);
    assert_eq!(report.final_since, T0 + 999 * MIN + 1);
    assert_eq!(total_rows(&tmp.path().join("btc")), 1000);
}
