//! Klines-specific data transfer objects, enumerations and the shared error type.
#![warn(missing_docs)]

mod config;
mod error;
mod exchange;
mod granularity;
mod pair;
mod reports;

pub use config::{QuotaConfig, SessionConfig, TransportConfig};
pub use error::KlinesError;
pub use exchange::{ExchangeId, PagePolicy};
pub use granularity::Granularity;
pub use pair::Pair;
pub use reports::{SessionReport, StopReason};
