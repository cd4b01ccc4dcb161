//! Client construction from a session configuration.

use std::sync::Arc;

use chrono::Duration;
use klines_binance::BinanceClient;
use klines_bitfinex::BitfinexClient;
use klines_core::{ExchangeClient, ExchangeId, KlinesError, SessionConfig, TimestampUnit};
use klines_middleware::ClientBuilder;
use klines_mock::{ScriptedClient, SyntheticSeries};

/// Days of synthetic data served by the mock exchange when no end is configured.
const MOCK_DEFAULT_SPAN_DAYS: i64 = 7;

/// Build the configured exchange client wrapped in its middleware stack.
///
/// The stack is `Quota(Timeout(raw))` when a quota is configured, `Timeout(raw)`
/// otherwise.
///
/// # Errors
/// `Config` when the transport cannot be built, `Unsupported` for an exchange with
/// no client.
pub fn connect(cfg: &SessionConfig) -> Result<Arc<dyn ExchangeClient>, KlinesError> {
    let raw: Arc<dyn ExchangeClient> = match cfg.exchange {
        ExchangeId::Binance => Arc::new(BinanceClient::new(&cfg.transport)?),
        ExchangeId::Bitfinex => Arc::new(BitfinexClient::new(&cfg.transport)?),
        ExchangeId::Mock => synthetic(cfg),
        other => return Err(KlinesError::unsupported(format!("exchange/{other}"))),
    };

    let mut builder = ClientBuilder::new(raw).with_timeout(cfg.transport.timeout);
    if let Some(quota) = &cfg.quota {
        builder = builder.with_quota(quota);
    }
    tracing::debug!(stack = %builder.describe(), "client stack");
    Ok(builder.build())
}

/// Offline exchange serving a deterministic series over the configured range.
fn synthetic(cfg: &SessionConfig) -> Arc<dyn ExchangeClient> {
    let end = cfg
        .end
        .unwrap_or(cfg.begin + Duration::days(MOCK_DEFAULT_SPAN_DAYS));
    let series =
        SyntheticSeries::for_range(cfg.begin, end, cfg.granularity, TimestampUnit::Milliseconds);
    let (client, _controller) = ScriptedClient::builder("mock")
        .exchange(ExchangeId::Mock)
        .series(series)
        .build();
    client
}
