use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::KlinesError;

/// One OHLCV bucket, normalized across exchanges.
///
/// `timestamp` is the bucket open time in the exchange's native
/// [`TimestampUnit`](crate::TimestampUnit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlineRecord {
    /// Bucket open time.
    pub timestamp: i64,
    /// Opening price.
    pub open: Decimal,
    /// Highest price.
    pub high: Decimal,
    /// Lowest price.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Traded base volume.
    pub volume: Decimal,
}

/// Check a fetched page before anything from it is persisted.
///
/// A page must be ordered by non-decreasing timestamp and must not start before
/// the cursor that requested it.
///
/// # Errors
/// Returns `KlinesError::Data` describing the first violation.
pub fn validate_page(page: &[KlineRecord], since: i64) -> Result<(), KlinesError> {
    let Some(first) = page.first() else {
        return Ok(());
    };
    if first.timestamp < since {
        return Err(KlinesError::Data(format!(
            "page starts at {} before cursor {since}",
            first.timestamp
        )));
    }
    if let Some(i) = page
        .windows(2)
        .position(|w| w[0].timestamp > w[1].timestamp)
    {
        return Err(KlinesError::Data(format!(
            "page out of order at index {}: {} > {}",
            i + 1,
            page[i].timestamp,
            page[i + 1].timestamp
        )));
    }
    Ok(())
}
