use chrono::{DateTime, Utc};
use klines_core::{Granularity, KlineRecord, TimestampUnit};
use rust_decimal::Decimal;

/// Contiguous, deterministic candle series over `[start, end]`.
///
/// Candle `k` opens at `start + k * step`; its prices depend only on `k`, so two
/// runs over the same range produce identical records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticSeries {
    start: i64,
    end: i64,
    step: i64,
}

impl SyntheticSeries {
    /// Series of candles every `step` ticks from `start` through `end` inclusive.
    #[must_use]
    pub const fn new(start: i64, end: i64, step: i64) -> Self {
        let step = if step > 0 { step } else { 1 };
        Self { start, end, step }
    }

    /// Series covering `[begin, end]` at `granularity`, expressed in `unit`.
    #[must_use]
    pub fn for_range(
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
        unit: TimestampUnit,
    ) -> Self {
        Self::new(
            unit.from_datetime(begin),
            unit.from_datetime(end),
            granularity.seconds() * unit.per_second(),
        )
    }

    /// Up to `limit` candles opening within `[since, min(until, end)]`.
    #[must_use]
    pub fn page(&self, since: i64, until: Option<i64>, limit: u32) -> Vec<KlineRecord> {
        let hi = until.map_or(self.end, |u| u.min(self.end));
        let first = if since <= self.start {
            0
        } else {
            (since - self.start + self.step - 1) / self.step
        };
        (first..)
            .map(|k| (k, self.start + k * self.step))
            .take_while(|(_, ts)| *ts <= hi)
            .take(limit as usize)
            .map(|(k, ts)| candle(k, ts))
            .collect()
    }

    /// Number of candles in the whole series.
    #[must_use]
    pub const fn len(&self) -> i64 {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) / self.step + 1
        }
    }

    /// True if the series holds no candle.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn candle(k: i64, ts: i64) -> KlineRecord {
    let open = Decimal::new(2_000_000 + (k * 3_701).rem_euclid(100_000), 2);
    let drift = if k % 2 == 0 {
        Decimal::new(150, 2)
    } else {
        Decimal::new(-125, 2)
    };
    KlineRecord {
        timestamp: ts,
        open,
        high: open + Decimal::new(1_025, 2),
        low: open - Decimal::new(975, 2),
        close: open + drift,
        volume: Decimal::new(1_000_000 + (k * 7_919).rem_euclid(9_000_000), 6),
    }
}
