//! Per-request deadline wrapper.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use klines_core::{
    ExchangeClient, ExchangeId, Granularity, KlineRecord, KlineRequest, KlinesError, Middleware,
    PagePolicy, TimestampUnit,
};

/// Bounds every fetch of the inner client by a deadline.
///
/// An expired deadline surfaces as [`KlinesError::ProviderTimeout`], which the session
/// retries like any other fetch failure.
pub struct TimeoutClient {
    inner: Arc<dyn ExchangeClient>,
    timeout: Duration,
}

impl TimeoutClient {
    /// Wrap `inner` with a per-fetch deadline.
    #[must_use]
    pub fn new(inner: Arc<dyn ExchangeClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl ExchangeClient for TimeoutClient {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn exchange(&self) -> ExchangeId {
        self.inner.exchange()
    }

    fn timestamp_unit(&self) -> TimestampUnit {
        self.inner.timestamp_unit()
    }

    fn default_policy(&self) -> PagePolicy {
        self.inner.default_policy()
    }

    fn max_page_size(&self) -> u32 {
        self.inner.max_page_size()
    }

    fn supported_granularities(&self) -> &'static [Granularity] {
        self.inner.supported_granularities()
    }

    async fn fetch(&self, req: &KlineRequest) -> Result<Vec<KlineRecord>, KlinesError> {
        match tokio::time::timeout(self.timeout, self.inner.fetch(req)).await {
            Ok(res) => res,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    connector = self.inner.name(),
                    since = req.since,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "fetch timed out"
                );
                Err(KlinesError::provider_timeout(self.inner.name(), self.timeout))
            }
        }
    }
}

/// Middleware config for constructing a [`TimeoutClient`].
pub struct TimeoutMiddleware {
    pub timeout: Duration,
}

impl TimeoutMiddleware {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Middleware for TimeoutMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn ExchangeClient>) -> Arc<dyn ExchangeClient> {
        Arc::new(TimeoutClient::new(inner, self.timeout))
    }

    fn name(&self) -> &'static str {
        "TimeoutClient"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({ "timeout_ms": self.timeout.as_millis() })
    }
}
