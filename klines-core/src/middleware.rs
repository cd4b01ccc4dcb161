//! Middleware trait for wrapping `ExchangeClient` implementations.

use std::sync::Arc;

use crate::ExchangeClient;

/// Trait implemented by client middleware layers.
///
/// A middleware consumes an inner `ExchangeClient` and returns a wrapped client
/// that augments or restricts behavior (e.g., timeouts, quotas).
pub trait Middleware: Send + Sync {
    /// Apply this middleware to wrap an inner client and return the wrapped client.
    fn apply(self: Box<Self>, inner: Arc<dyn ExchangeClient>) -> Arc<dyn ExchangeClient>;

    /// Human-readable middleware name for introspection/logging.
    fn name(&self) -> &'static str;

    /// Opaque configuration snapshot for serialization/inspection.
    fn config_json(&self) -> serde_json::Value;
}
