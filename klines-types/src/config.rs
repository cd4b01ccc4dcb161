//! Configuration types shared by the session controller and the exchange clients.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ExchangeId, Granularity, KlinesError, PagePolicy, Pair};

/// Outbound HTTP settings applied to an exchange client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Proxy URL applied to every request (`socks5://127.0.0.1:1086`, `http://...`).
    pub proxy: Option<String>,
    /// Connect and response timeout for a single request.
    pub timeout: Duration,
    /// Override for the exchange's REST base URL.
    pub base_url: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Duration::from_secs(10),
            base_url: None,
        }
    }
}

/// Request budget over a fixed window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum number of requests within a single window.
    pub limit: u64,
    /// Duration of the accounting window.
    pub window: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            window: Duration::from_secs(60),
        }
    }
}

/// Immutable parameters of one download session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Exchange to download from.
    pub exchange: ExchangeId,
    /// Currency pair.
    pub pair: Pair,
    /// Kline granularity.
    pub granularity: Granularity,
    /// First instant to request.
    pub begin: DateTime<Utc>,
    /// Last instant to request, inclusive. `None` downloads up to the exchange's tail.
    pub end: Option<DateTime<Utc>>,
    /// Records requested per page.
    pub page_size: u32,
    /// Root output directory; shards land in a per-pair subdirectory.
    pub output_dir: PathBuf,
    /// Fixed delay between two fetch attempts.
    pub rate_limit_interval: Duration,
    /// Overrides the client's default page policy.
    pub policy: Option<PagePolicy>,
    /// Restart from the latest shard day already present in the output directory.
    pub resume: bool,
    /// Outbound HTTP settings.
    pub transport: TransportConfig,
    /// Optional request budget enforced in front of the client.
    pub quota: Option<QuotaConfig>,
}

impl SessionConfig {
    /// Default records per page.
    pub const DEFAULT_PAGE_SIZE: u32 = 1000;
    /// Default pacing interval between fetches.
    pub const DEFAULT_RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(200);

    /// Build a configuration with defaults for everything but the stream identity.
    #[must_use]
    pub fn new(
        exchange: ExchangeId,
        pair: Pair,
        granularity: Granularity,
        begin: DateTime<Utc>,
    ) -> Self {
        Self {
            exchange,
            pair,
            granularity,
            begin,
            end: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
            output_dir: PathBuf::from("data"),
            rate_limit_interval: Self::DEFAULT_RATE_LIMIT_INTERVAL,
            policy: None,
            resume: false,
            transport: TransportConfig::default(),
            quota: None,
        }
    }

    /// Directory holding this pair's shards: `{output_dir}/{base lower-case}`.
    #[must_use]
    pub fn pair_dir(&self) -> PathBuf {
        self.output_dir.join(self.pair.base().to_ascii_lowercase())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `Config` when the page size or pacing interval is zero, when the end
    /// does not lie after the begin, or when a quota has a zero limit or window.
    pub fn validate(&self) -> Result<(), KlinesError> {
        if self.page_size == 0 {
            return Err(KlinesError::config("page_size must be at least 1"));
        }
        if self.rate_limit_interval.is_zero() {
            return Err(KlinesError::config("rate_limit_interval must be non-zero"));
        }
        if self.transport.timeout.is_zero() {
            return Err(KlinesError::config("request timeout must be non-zero"));
        }
        if let Some(end) = self.end
            && end <= self.begin
        {
            return Err(KlinesError::config(format!(
                "end {end} must lie after begin {}",
                self.begin
            )));
        }
        if let Some(q) = &self.quota
            && (q.limit == 0 || q.window.is_zero())
        {
            return Err(KlinesError::config("quota limit and window must be non-zero"));
        }
        Ok(())
    }
}
