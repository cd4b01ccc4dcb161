//! Fixed-window request quota wrapper.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use klines_core::{
    ExchangeClient, ExchangeId, Granularity, KlineRecord, KlineRequest, KlinesError, Middleware,
    PagePolicy, QuotaConfig, TimestampUnit,
};
use tokio::time::Instant;

/// Wrapper that rejects fetches once the window's request budget is spent.
pub struct QuotaClient {
    inner: Arc<dyn ExchangeClient>,
    runtime: Mutex<QuotaRuntime>,
}

struct QuotaRuntime {
    limit: u64,
    calls_made_in_window: u64,
    last_reset: Instant,
    window: Duration,
}

impl QuotaClient {
    /// Create a new quota wrapper around an existing client.
    #[must_use]
    pub fn new(inner: Arc<dyn ExchangeClient>, config: &QuotaConfig) -> Self {
        Self {
            inner,
            runtime: Mutex::new(QuotaRuntime {
                limit: config.limit,
                calls_made_in_window: 0,
                last_reset: Instant::now(),
                window: config.window,
            }),
        }
    }

    /// Consume one unit of the current window's budget.
    ///
    /// # Errors
    /// Returns `KlinesError::QuotaExceeded` when the window budget is exhausted;
    /// `reset_in_ms` is the time left until the next window boundary.
    pub fn should_allow_call(&self) -> Result<(), KlinesError> {
        let mut rt = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let elapsed = now.duration_since(rt.last_reset);
        if !rt.window.is_zero() && elapsed >= rt.window {
            rt.calls_made_in_window = 0;
            // Keep windows aligned to their original boundaries across idle gaps.
            let windows_passed = elapsed.as_nanos() / rt.window.as_nanos();
            let boundary_offset = Duration::from_nanos(
                (windows_passed * rt.window.as_nanos())
                    .try_into()
                    .unwrap_or(u64::MAX),
            );
            rt.last_reset += boundary_offset;
        }

        if rt.calls_made_in_window < rt.limit {
            rt.calls_made_in_window += 1;
            return Ok(());
        }

        let elapsed = now.duration_since(rt.last_reset);
        let reset_in_ms = rt
            .window
            .saturating_sub(elapsed)
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX);
        let err = KlinesError::QuotaExceeded {
            remaining: rt.limit.saturating_sub(rt.calls_made_in_window),
            reset_in_ms,
        };
        drop(rt);
        Err(err)
    }
}

#[async_trait]
impl ExchangeClient for QuotaClient {
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
        if let Err(e) = self.should_allow_call() {
            #[cfg(feature = "tracing")]
            tracing::warn!(connector = self.inner.name(), error = %e, "quota exhausted");
            return Err(e);
        }
        self.inner.fetch(req).await
    }
}

/// Middleware config for constructing a [`QuotaClient`].
pub struct QuotaMiddleware {
    pub config: QuotaConfig,
}

impl QuotaMiddleware {
    #[must_use]
    pub const fn new(config: QuotaConfig) -> Self {
        Self { config }
    }
}

impl Middleware for QuotaMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn ExchangeClient>) -> Arc<dyn ExchangeClient> {
        Arc::new(QuotaClient::new(inner, &self.config))
    }

    fn name(&self) -> &'static str {
        "QuotaClient"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "limit": self.config.limit,
            "window_ms": self.config.window.as_millis(),
        })
    }
}
