//! Shared HTTP plumbing for exchange clients.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::{KlinesError, TransportConfig};

/// User-Agent sent with every request; some exchanges reject library defaults.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/76.0.3809.100 Safari/537.36";

const MAX_ERROR_BODY: usize = 512;

/// Thin `reqwest` wrapper: proxy, timeout, gzip and JSON decoding.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    connector: &'static str,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport for the named client.
    ///
    /// # Errors
    /// Returns `KlinesError::Config` when the proxy URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(connector: &'static str, cfg: &TransportConfig) -> Result<Self, KlinesError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .gzip(true)
            .connect_timeout(cfg.timeout)
            .timeout(cfg.timeout);
        if let Some(proxy) = cfg.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| KlinesError::config(format!("invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| KlinesError::config(format!("http client: {e}")))?;
        Ok(Self {
            connector,
            client,
            timeout: cfg.timeout,
        })
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// # Errors
    /// - `ProviderTimeout` when the request exceeds the configured timeout.
    /// - `Connector` on transport failure or a non-success status (status and body
    ///   are included in the message).
    /// - `Data` when the body is not valid JSON.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "klines::transport::get_json", skip(self, url), fields(connector = self.connector, url = %url))
    )]
    pub async fn get_json(&self, url: Url) -> Result<Value, KlinesError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest(&e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_reqwest(&e))?;
        if !status.is_success() {
            #[cfg(feature = "tracing")]
            tracing::debug!(status = status.as_u16(), "non-success response");
            return Err(KlinesError::connector(
                self.connector,
                format!("HTTP {status}: {}", truncate(&body)),
            ));
        }
        serde_json::from_str(&body)
            .map_err(|e| KlinesError::Data(format!("{}: invalid JSON: {e}", self.connector)))
    }

    fn map_reqwest(&self, err: &reqwest::Error) -> KlinesError {
        if err.is_timeout() {
            KlinesError::provider_timeout(self.connector, self.timeout)
        } else {
            KlinesError::connector(self.connector, format!("request failed: {err}"))
        }
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut cut = MAX_ERROR_BODY;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    &body[..cut]
}
