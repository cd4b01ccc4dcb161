use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the klines workspace.
///
/// Fetch-path failures (transport, timeout, quota, decode) are retryable and keep
/// the session polling; configuration and filesystem failures end the session.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KlinesError {
    /// The requested capability is not implemented by the target client
    /// (e.g. a granularity the exchange does not serve).
    #[error("unsupported: {capability}")]
    Unsupported {
        /// A capability string describing what was requested (e.g. "granularity/4h").
        capability: String,
    },

    /// The payload could not be interpreted (malformed JSON, non-numeric field,
    /// out-of-order page).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// An individual exchange client returned an error (transport failure or
    /// non-success HTTP status).
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Client name that failed.
        connector: String,
        /// Human-readable error message, including the response status when known.
        msg: String,
    },

    /// A single fetch exceeded the configured request timeout.
    #[error("request timed out via {connector} after {timeout_ms}ms")]
    ProviderTimeout {
        /// Client name that timed out.
        connector: String,
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The request exceeds the configured quota budget for the current window.
    #[error("quota exceeded: remaining={remaining} reset_in_ms={reset_in_ms}")]
    QuotaExceeded {
        /// Remaining units at the time of rejection.
        remaining: u64,
        /// Milliseconds until the quota window resets.
        reset_in_ms: u64,
    },

    /// A filesystem operation failed.
    #[error("io error ({context}): {msg}")]
    Io {
        /// What was being done, usually the path involved.
        context: String,
        /// Rendered `std::io::Error`.
        msg: String,
    },

    /// Session configuration could not be assembled or validated.
    #[error("configuration error: {0}")]
    Config(String),
}

impl KlinesError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Connector` error with the client name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(connector: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::ProviderTimeout {
            connector: connector.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Helper: build an `Io` error tagged with the path or operation involved.
    pub fn io(context: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            msg: err.to_string(),
        }
    }

    /// Helper: build a `Config` error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if the failure belongs to the fetch path and the same request
    /// may simply be tried again on the next tick.
    ///
    /// Filesystem, configuration and capability errors are not retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connector { .. }
                | Self::ProviderTimeout { .. }
                | Self::QuotaExceeded { .. }
                | Self::Data(_)
        )
    }
}

impl From<std::io::Error> for KlinesError {
    fn from(err: std::io::Error) -> Self {
        Self::io("io", &err)
    }
}
