use std::sync::Arc;

use async_trait::async_trait;
use klines_core::{HttpTransport, KlinesError, TransportConfig};
use serde_json::Value;
use url::Url;

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Query parameters of `GET /api/v3/klines`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlinesQuery {
    /// Concatenated symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Interval code, e.g. `1m`.
    pub interval: &'static str,
    /// Maximum rows.
    pub limit: u32,
    /// Inclusive start, milliseconds.
    pub start_time: i64,
    /// Inclusive end, milliseconds.
    pub end_time: Option<i64>,
}

/// Klines endpoint abstraction (so we can inject canned payloads in tests).
#[async_trait]
pub trait BinanceKlines: Send + Sync {
    /// Fetch the raw JSON payload for one query.
    async fn klines(&self, query: &KlinesQuery) -> Result<Value, KlinesError>;
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
        let base = Url::parse(base)
            .map_err(|e| KlinesError::config(format!("invalid binance base url '{base}': {e}")))?;
        Ok(Self {
            transport: HttpTransport::new("binance", cfg)?,
            base,
        })
    }

    fn url(&self, query: &KlinesQuery) -> Result<Url, KlinesError> {
        let mut url = self
            .base
            .join("/api/v3/klines")
            .map_err(|e| KlinesError::config(format!("binance url: {e}")))?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("symbol", &query.symbol)
                .append_pair("interval", query.interval)
                .append_pair("limit", &query.limit.to_string())
                .append_pair("startTime", &query.start_time.to_string());
            if let Some(end) = query.end_time {
                qp.append_pair("endTime", &end.to_string());
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl BinanceKlines for RealAdapter {
    async fn klines(&self, query: &KlinesQuery) -> Result<Value, KlinesError> {
        let url = self.url(query)?;
        self.transport.get_json(url).await
    }
}

impl dyn BinanceKlines {
    /// Build a `BinanceKlines` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn BinanceKlines>
    where
        F: Send + Sync + 'static + Fn(KlinesQuery) -> Result<Value, KlinesError>,
    {
        struct FnKlines<F>(F);
        #[async_trait]
        impl<F> BinanceKlines for FnKlines<F>
        where
            F: Send + Sync + 'static + Fn(KlinesQuery) -> Result<Value, KlinesError>,
        {
            async fn klines(&self, query: &KlinesQuery) -> Result<Value, KlinesError> {
                (self.0)(query.clone())
            }
        }
        Arc::new(FnKlines(f))
    }
}
