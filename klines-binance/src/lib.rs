//! klines-binance
//!
//! Binance spot klines client. Pages are bounded by `limit` only, so the session
//! stops on the first short page.
#![warn(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use klines_core::numeric::{decimal_at, timestamp_from_json};
use klines_core::{
    ExchangeClient, ExchangeId, Granularity, KlineRecord, KlineRequest, KlinesError, PagePolicy,
    TimestampUnit, TransportConfig,
};
use serde_json::Value;

/// Adapter traits and the real HTTP adapter.
pub mod adapter;

use adapter::{BinanceKlines, KlinesQuery, RealAdapter};

/// Largest page served by `/api/v3/klines`.
pub const MAX_PAGE_SIZE: u32 = 1000;

const SUPPORTED: &[Granularity] = Granularity::ALL;

/// Binance exchange client.
pub struct BinanceClient {
    adapter: Arc<dyn BinanceKlines>,
}

impl BinanceClient {
    /// Client against the production API, or `cfg.base_url` when set.
    ///
    /// # Errors
    /// Returns `KlinesError::Config` when the transport cannot be built.
    pub fn new(cfg: &TransportConfig) -> Result<Self, KlinesError> {
        let base = cfg.base_url.as_deref().unwrap_or(adapter::DEFAULT_BASE_URL);
        Self::with_base_url(base, cfg)
    }

    /// Client against an explicit base URL.
    ///
    /// # Errors
    /// Returns `KlinesError::Config` for an invalid URL or transport settings.
    pub fn with_base_url(base: &str, cfg: &TransportConfig) -> Result<Self, KlinesError> {
        Ok(Self {
            adapter: Arc::new(RealAdapter::new(base, cfg)?),
        })
    }

    /// Client over an injected adapter.
    #[must_use]
    pub fn from_adapter(adapter: Arc<dyn BinanceKlines>) -> Self {
        Self { adapter }
    }

    /// Binance interval code for `granularity`.
    #[must_use]
    pub const fn interval_code(granularity: Granularity) -> &'static str {
        match granularity {
            Granularity::M1 => "1m",
            Granularity::M5 => "5m",
            Granularity::M15 => "15m",
            Granularity::M30 => "30m",
            Granularity::H1 => "1h",
            Granularity::H4 => "4h",
            Granularity::H6 => "6h",
            Granularity::H12 => "12h",
            Granularity::D1 => "1d",
            Granularity::W1 => "1w",
        }
    }
}

/// Decode a `/api/v3/klines` payload.
///
/// Rows are positional: `[open_time, open, high, low, close, volume, close_time, ...]`.
///
/// # Errors
/// Returns `KlinesError::Data` when the payload is not an array of arrays or a field
/// is not numeric.
pub fn decode_klines(payload: &Value) -> Result<Vec<KlineRecord>, KlinesError> {
    let rows = payload.as_array().ok_or_else(|| {
        KlinesError::Data(format!("binance: expected an array of klines, got {payload}"))
    })?;
    rows.iter()
        .map(|row| {
            let row = row
                .as_array()
                .ok_or_else(|| KlinesError::Data(format!("binance: malformed kline {row}")))?;
            let ts = row.first().unwrap_or(&Value::Null);
            Ok(KlineRecord {
                timestamp: timestamp_from_json(ts, "open_time")?,
                open: decimal_at(row, 1, "open")?,
                high: decimal_at(row, 2, "high")?,
                low: decimal_at(row, 3, "low")?,
                close: decimal_at(row, 4, "close")?,
                volume: decimal_at(row, 5, "volume")?,
            })
        })
        .collect()
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn name(&self) -> &'static str {
        "binance"
    }

    fn exchange(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    fn timestamp_unit(&self) -> TimestampUnit {
        TimestampUnit::Milliseconds
    }

    fn default_policy(&self) -> PagePolicy {
        PagePolicy::ShortPage
    }

    fn max_page_size(&self) -> u32 {
        MAX_PAGE_SIZE
    }

    fn supported_granularities(&self) -> &'static [Granularity] {
        SUPPORTED
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "klines::binance::fetch",
            skip(self, req),
            fields(pair = %req.pair, granularity = %req.granularity, since = req.since, limit = req.limit),
        )
    )]
    async fn fetch(&self, req: &KlineRequest) -> Result<Vec<KlineRecord>, KlinesError> {
        if !self.supports(req.granularity) {
            return Err(KlinesError::unsupported(format!(
                "binance/granularity/{}",
                req.granularity
            )));
        }
        let query = KlinesQuery {
            symbol: req.pair.symbol(),
            interval: Self::interval_code(req.granularity),
            limit: req.limit.min(MAX_PAGE_SIZE),
            start_time: req.since,
            end_time: req.until,
        };
        let payload = self.adapter.klines(&query).await?;
        let page = decode_klines(&payload)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(rows = page.len(), "decoded binance page");
        Ok(page)
    }
}
