//! The `ExchangeClient` trait implemented by every exchange integration.

use async_trait::async_trait;

use crate::{Granularity, KlineRecord, KlinesError, PagePolicy, Pair, TimestampUnit};

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    /// Currency pair.
    pub pair: Pair,
    /// Kline granularity.
    pub granularity: Granularity,
    /// Maximum number of records to return.
    pub limit: u32,
    /// Inclusive lower bound, in the client's [`TimestampUnit`].
    pub since: i64,
    /// Inclusive upper bound, if any.
    pub until: Option<i64>,
}

/// Paginated access to an exchange's historical klines.
///
/// Implementations return records ordered by non-decreasing timestamp and starting
/// at or after `since`. Transport and decode failures are reported as errors, never
/// as an empty page.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Client name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Exchange served by this client; its name prefixes shard files.
    fn exchange(&self) -> crate::ExchangeId;

    /// Unit of request bounds and record timestamps.
    fn timestamp_unit(&self) -> TimestampUnit {
        TimestampUnit::Milliseconds
    }

    /// Termination policy that matches the exchange's pagination semantics.
    fn default_policy(&self) -> PagePolicy;

    /// Largest page the exchange serves in one request.
    fn max_page_size(&self) -> u32;

    /// Granularities the exchange can serve.
    fn supported_granularities(&self) -> &'static [Granularity];

    /// Whether `granularity` is served by this client.
    fn supports(&self, granularity: Granularity) -> bool {
        self.supported_granularities().contains(&granularity)
    }

    /// Fetch one page of klines.
    async fn fetch(&self, req: &KlineRequest) -> Result<Vec<KlineRecord>, KlinesError>;
}
