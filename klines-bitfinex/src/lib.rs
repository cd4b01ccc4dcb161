//! klines-bitfinex
//!
//! Bitfinex v2 candles client. Requests are bounded to a one-day window and days
//! without trades come back empty, so the session skips windows instead of stopping.
#![warn(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use klines_core::numeric::{decimal_at, timestamp_from_json};
use klines_core::{
    ExchangeClient, ExchangeId, Granularity, KlineRecord, KlineRequest, KlinesError, PagePolicy,
    Pair, TimestampUnit, TransportConfig,
};
use serde_json::Value;

/// Adapter traits and the real HTTP adapter.
pub mod adapter;

use adapter::{BitfinexCandles, CandlesQuery, RealAdapter};

/// Largest page served by the candles endpoint.
pub const MAX_PAGE_SIZE: u32 = 10_000;

const SUPPORTED: &[Granularity] = &[
    Granularity::M1,
    Granularity::M5,
    Granularity::M15,
    Granularity::M30,
    Granularity::H1,
    Granularity::H6,
    Granularity::H12,
    Granularity::D1,
    Granularity::W1,
];

/// Bitfinex exchange client.
pub struct BitfinexClient {
    adapter: Arc<dyn BitfinexCandles>,
}

impl BitfinexClient {
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
    pub fn from_adapter(adapter: Arc<dyn BitfinexCandles>) -> Self {
        Self { adapter }
    }

    /// Bitfinex timeframe code, or `None` when the exchange has no such candle.
    #[must_use]
    pub const fn timeframe(granularity: Granularity) -> Option<&'static str> {
        match granularity {
            Granularity::M1 => Some("1m"),
            Granularity::M5 => Some("5m"),
            Granularity::M15 => Some("15m"),
            Granularity::M30 => Some("30m"),
            Granularity::H1 => Some("1h"),
            Granularity::H6 => Some("6h"),
            Granularity::H12 => Some("12h"),
            Granularity::D1 => Some("1D"),
            Granularity::W1 => Some("7D"),
            Granularity::H4 => None,
        }
    }

    /// Trading symbol for `pair`: `tBTCUST`, or `tAAVE:UST` when a leg is longer
    /// than three characters.
    #[must_use]
    pub fn symbol(pair: &Pair) -> String {
        let currency = |c: &str| match c {
            "USDT" => "UST".to_string(),
            other => other.to_string(),
        };
        let base = currency(pair.base());
        let quote = currency(pair.quote());
        if base.len() > 3 || quote.len() > 3 {
            format!("t{base}:{quote}")
        } else {
            format!("t{base}{quote}")
        }
    }
}

/// Decode a candles payload.
///
/// Rows are positional: `[mts, open, close, high, low, volume]`. An error reply
/// (`["error", code, message]`) is reported as a connector error.
///
/// # Errors
/// Returns `KlinesError::Connector` for an error reply and `KlinesError::Data` when
/// the payload is not an array of arrays or a field is not numeric.
pub fn decode_candles(payload: &Value) -> Result<Vec<KlineRecord>, KlinesError> {
    let rows = payload.as_array().ok_or_else(|| {
        KlinesError::Data(format!("bitfinex: expected an array of candles, got {payload}"))
    })?;
    if rows.first().and_then(Value::as_str) == Some("error") {
        let code = rows.get(1).map(ToString::to_string).unwrap_or_default();
        let msg = rows.get(2).and_then(Value::as_str).unwrap_or_default();
        return Err(KlinesError::connector(
            "bitfinex",
            format!("api error {code}: {msg}"),
        ));
    }
    rows.iter()
        .map(|row| {
            let row = row
                .as_array()
                .ok_or_else(|| KlinesError::Data(format!("bitfinex: malformed candle {row}")))?;
            let ts = row.first().unwrap_or(&Value::Null);
            Ok(KlineRecord {
                timestamp: timestamp_from_json(ts, "mts")?,
                open: decimal_at(row, 1, "open")?,
                close: decimal_at(row, 2, "close")?,
                high: decimal_at(row, 3, "high")?,
                low: decimal_at(row, 4, "low")?,
                volume: decimal_at(row, 5, "volume")?,
            })
        })
        .collect()
}

#[async_trait]
impl ExchangeClient for BitfinexClient {
    fn name(&self) -> &'static str {
        "bitfinex"
    }

    fn exchange(&self) -> ExchangeId {
        ExchangeId::Bitfinex
    }

    fn timestamp_unit(&self) -> TimestampUnit {
        TimestampUnit::Milliseconds
    }

    fn default_policy(&self) -> PagePolicy {
        PagePolicy::WindowGapSkip
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
            name = "klines::bitfinex::fetch",
            skip(self, req),
            fields(pair = %req.pair, granularity = %req.granularity, since = req.since, limit = req.limit),
        )
    )]
    async fn fetch(&self, req: &KlineRequest) -> Result<Vec<KlineRecord>, KlinesError> {
        let Some(timeframe) = Self::timeframe(req.granularity) else {
            return Err(KlinesError::unsupported(format!(
                "bitfinex/granularity/{}",
                req.granularity
            )));
        };
        let query = CandlesQuery {
            timeframe,
            symbol: Self::symbol(&req.pair),
            limit: req.limit.min(MAX_PAGE_SIZE),
            start: req.since,
            end: req.until,
        };
        let payload = self.adapter.candles(&query).await?;
        let page = decode_candles(&payload)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(rows = page.len(), "decoded bitfinex page");
        Ok(page)
    }
}
