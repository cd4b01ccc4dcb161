use serde::{Deserialize, Serialize};

/// Why a session stopped polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page came back shorter than requested: the exchange has nothing further.
    ShortPage,
    /// The cursor moved past the configured end.
    PastEnd,
    /// The shutdown coordinator cancelled the session.
    Cancelled,
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Successful, non-empty pages persisted.
    pub pages: u64,
    /// Records handed to the shard writer.
    pub records: u64,
    /// Empty windows skipped without persisting.
    pub gap_skips: u64,
    /// Fetch attempts that failed and were retried.
    pub fetch_errors: u64,
    /// Distinct shard files written.
    pub shards: usize,
    /// Cursor value at the time the session stopped.
    pub final_since: i64,
    /// Reason the session stopped.
    pub stop: StopReason,
}
