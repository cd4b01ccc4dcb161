//! Builder for composing clients with middleware layers.
//!
//! # Middleware Ordering Convention
//!
//! Middleware layers form an "onion" around the raw client:
//!
//! ```text
//! Session
//!     ↓
//! Outermost Middleware (e.g., Quota - rejects before any network work)
//!     ↓
//! Inner Middleware (e.g., Timeout - bounds the request)
//!     ↓
//! Raw Client (e.g., Binance - makes actual API calls)
//! ```
//!
//! The `layers` vector stores middleware in **outermost-first** order (last added =
//! outermost) and `build()` applies them in reverse to construct the nesting.
//!
//! ```text
//! builder.with_timeout(..).with_quota(..)
//!
//! Storage: [Quota, Timeout]  (outermost first)
//! Applied:  Raw -> Timeout -> Quota
//! Result:   Quota(Timeout(Raw))
//! ```

use std::sync::Arc;
use std::time::Duration;

use klines_core::{ExchangeClient, Middleware, QuotaConfig};
use serde_json::json;

use crate::quota::QuotaMiddleware;
use crate::timeout::TimeoutMiddleware;

/// Generic middleware builder for composing a client with layered wrappers.
///
/// See [module-level documentation](self) for details on middleware ordering.
pub struct ClientBuilder {
    raw: Arc<dyn ExchangeClient>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl ClientBuilder {
    /// Create a new builder from a raw, unwrapped client.
    #[must_use]
    pub fn new(raw: Arc<dyn ExchangeClient>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    /// Add or replace the per-fetch deadline.
    ///
    /// Inserted at the outermost position; an existing timeout layer is replaced.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.layers.retain(|m| m.name() != "TimeoutClient");
        self.layers.insert(0, Box::new(TimeoutMiddleware::new(timeout)));
        self
    }

    /// Add or replace the request quota.
    ///
    /// Inserted at the outermost position; an existing quota layer is replaced.
    #[must_use]
    pub fn with_quota(mut self, cfg: &QuotaConfig) -> Self {
        self.layers.retain(|m| m.name() != "QuotaClient");
        self.layers
            .insert(0, Box::new(QuotaMiddleware::new(cfg.clone())));
        self
    }

    /// Remove the quota layer if present.
    #[must_use]
    pub fn without_quota(mut self) -> Self {
        self.layers.retain(|m| m.name() != "QuotaClient");
        self
    }

    /// Layer names, outermost first.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|m| m.name()).collect()
    }

    /// Describe the stack for logs: every layer's config, then the raw client.
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let mut layers: Vec<serde_json::Value> = self
            .layers
            .iter()
            .map(|m| json!({ "name": m.name(), "config": m.config_json() }))
            .collect();
        layers.push(json!({ "name": "RawClient", "config": { "name": self.raw.name() } }));
        serde_json::Value::Array(layers)
    }

    /// Build the wrapped client.
    ///
    /// Layers are applied innermost-first, so `layers[0]` ends up outermost.
    #[must_use]
    pub fn build(self) -> Arc<dyn ExchangeClient> {
        let mut acc: Arc<dyn ExchangeClient> = self.raw;
        for layer in self.layers.into_iter().rev() {
            acc = layer.apply(acc);
        }
        acc
    }
}
