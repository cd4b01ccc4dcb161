use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ExchangeId, Granularity, KlinesError, Pair, TimestampUnit};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Destination identity of a record: one shard file per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardKey {
    /// Exchange the stream comes from.
    pub exchange: ExchangeId,
    /// Currency pair.
    pub pair: Pair,
    /// Kline granularity.
    pub granularity: Granularity,
    /// UTC calendar day of the records in the shard.
    pub day: NaiveDate,
}

impl ShardKey {
    /// Derive the key for a record timestamp.
    ///
    /// # Errors
    /// Returns `KlinesError::Data` when the timestamp cannot be mapped to a calendar day.
    pub fn for_timestamp(
        exchange: ExchangeId,
        pair: &Pair,
        granularity: Granularity,
        unit: TimestampUnit,
        ts: i64,
    ) -> Result<Self, KlinesError> {
        let day = unit
            .calendar_day(ts)
            .ok_or_else(|| KlinesError::Data(format!("timestamp {ts} out of range")))?;
        Ok(Self {
            exchange,
            pair: pair.clone(),
            granularity,
            day,
        })
    }

    /// `{exchange}_kline_{symbol}_{label}_{YYYY-MM-DD}.csv`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}{}.csv",
            Self::stream_prefix(self.exchange, &self.pair, self.granularity),
            self.day.format(DAY_FORMAT)
        )
    }

    /// File-name prefix shared by every shard of one stream, up to the date.
    #[must_use]
    pub fn stream_prefix(exchange: ExchangeId, pair: &Pair, granularity: Granularity) -> String {
        format!(
            "{exchange}_kline_{}_{}_",
            pair.symbol_lower(),
            granularity.label()
        )
    }

    /// Recover the day from a shard file name of the given stream.
    ///
    /// Returns `None` for files of other streams or with a malformed date.
    #[must_use]
    pub fn parse_day(
        file_name: &str,
        exchange: ExchangeId,
        pair: &Pair,
        granularity: Granularity,
    ) -> Option<NaiveDate> {
        let prefix = Self::stream_prefix(exchange, pair, granularity);
        let date = file_name.strip_prefix(&prefix)?.strip_suffix(".csv")?;
        NaiveDate::parse_from_str(date, DAY_FORMAT).ok()
    }
}
