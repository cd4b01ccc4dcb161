use std::sync::Arc;

use async_trait::async_trait;
use klines_core::{HttpTransport, KlinesError, TransportConfig};
use serde_json::Value;
use url::Url;

/// Production public REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api-pub.bitfinex.com";

/// Parameters of `GET /v2/candles/trade:{timeframe}:{symbol}/hist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandlesQuery {
    /// Timeframe code, e.g. `1m` or `1D`.
    pub timeframe: &'static str,
    /// Trading symbol including the `t` prefix, e.g. `tBTCUST`.
    pub symbol: String,
    /// Maximum rows.
    pub limit: u32,
    /// Inclusive start, milliseconds.
    pub start: i64,
    /// Inclusive end, milliseconds.
    pub end: Option<i64>,
}

impl CandlesQuery {
    /// Candle key segment of the request path.
    #[must_use]
    pub fn key(&self) -> String {
        format!("trade:{}:{}", self.timeframe, self.symbol)
    }
}

/// Candles endpoint abstraction (so we can inject canned payloads in tests).
#[async_trait]
pub trait BitfinexCandles: Send + Sync {
    /// Fetch the raw JSON payload for one query.
    async fn candles(&self, query: &CandlesQuery) -> Result<Value, KlinesError>;
}

/// Adapter that talks to the real REST API.
pub struct RealAdapter {
    transport: HttpTransport,
    base: Url,
}

impl RealAdapter {
    /// Build an adapter against `base` (scheme and host, optional port).
    ///
    /// # Errors
    /// Returns `KlinesError::Config` for an unparsable base URL or transport settings.
    pub fn new(base: &str, cfg: &TransportConfig) -> Result<Self, KlinesError> {
        let base = Url::parse(base).map_err(|e| {
            KlinesError::config(format!("invalid bitfinex base url '{base}': {e}"))
        })?;
        Ok(Self {
            transport: HttpTransport::new("bitfinex", cfg)?,
            base,
        })
    }

    fn url(&self, query: &CandlesQuery) -> Result<Url, KlinesError> {
        let mut url = self
            .base
            .join(&format!("/v2/candles/{}/hist", query.key()))
            .map_err(|e| KlinesError::config(format!("bitfinex url: {e}")))?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("limit", &query.limit.to_string())
                .append_pair("start", &query.start.to_string());
            if let Some(end) = query.end {
                qp.append_pair("end", &end.to_string());
            }
            qp.append_pair("sort", "1");
        }
        Ok(url)
    }
}

#[async_trait]
impl BitfinexCandles for RealAdapter {
    async fn candles(&self, query: &CandlesQuery) -> Result<Value, KlinesError> {
        let url = self.url(query)?;
        self.transport.get_json(url).await
    }
}

impl dyn BitfinexCandles {
    /// Build a `BitfinexCandles` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn BitfinexCandles>
    where
        F: Send + Sync + 'static + Fn(CandlesQuery) -> Result<Value, KlinesError>,
    {
        struct FnCandles<F>(F);
        #[async_trait]
        impl<F> BitfinexCandles for FnCandles<F>
        where
            F: Send + Sync + 'static + Fn(CandlesQuery) -> Result<Value, KlinesError>,
        {
            async fn candles(&self, query: &CandlesQuery) -> Result<Value, KlinesError> {
                (self.0)(query.clone())
            }
        }
        Arc::new(FnCandles(f))
    }
}
