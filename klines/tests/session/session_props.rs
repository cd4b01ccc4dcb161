use std::collections::HashSet;

use klines::{Session, Shutdown};
use klines_core::ExchangeId;
use klines_mock::{ScriptedClient, SyntheticSeries};
use proptest::prelude::*;

use crate::helpers::*;

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn no_loss_no_duplicates_and_strictly_advancing_cursor(
        candles in 1i64..2_500,
        page_size in 1u32..1_200,
        offset_min in 0i64..1_440,
    ) {
        let tmp = tempfile::tempdir().unwrap();
        let start = T0 + offset_min * MIN;
        let (client, ctl) = ScriptedClient::builder("stub")
            .series(SyntheticSeries::new(start, start + (candles - 1) * MIN, MIN))
            .build();
        let mut cfg = config(tmp.path(), ExchangeId::Mock, T0);
        cfg.page_size = page_size;

        let rt = paused_runtime();
        let report = rt.block_on(async {
            Session::new(cfg, client, Shutdown::new().token())
                .unwrap()
                .run()
                .await
                .unwrap()
        });
        let requests = rt.block_on(ctl.requests());

        prop_assert_eq!(report.records, u64::try_from(candles).unwrap());
        prop_assert_eq!(report.final_since, start + (candles - 1) * MIN + 1);

        let sinces: Vec<i64> = requests.iter().map(|r| r.since).collect();
        prop_assert!(sinces.windows(2).all(|w| w[0] < w[1]));

        let mut seen = HashSet::new();
        for contents in read_shards(&tmp.path().join("btc")).values() {
            for ts in timestamps(contents) {
                prop_assert!(seen.insert(ts), "duplicate row {}", ts);
            }
        }
        prop_assert_eq!(seen.len(), usize::try_from(candles).unwrap());
    }
}
