//! klines-core
//!
//! Core types and traits shared by the klines workspace.
//!
//! - `record`: the normalized [`KlineRecord`] and page validation.
//! - `cursor` / `shard_key` / `time`: pagination and sharding primitives.
//! - `client`: the [`ExchangeClient`] trait every exchange integration implements.
//! - `numeric`: normalization of loosely typed JSON fields.
//! - `transport`: the shared `reqwest` wrapper used by HTTP clients.
//!
//! Async runtime (Tokio)
//! ---------------------
//! The trait is runtime-agnostic, but the clients, middleware and session in this
//! workspace assume a Tokio 1.x runtime.
#![warn(missing_docs)]

/// The `ExchangeClient` trait and page request type.
pub mod client;
mod cursor;
/// Middleware trait implemented by client wrappers.
pub mod middleware;
pub mod numeric;
mod record;
mod shard_key;
mod time;
/// HTTP transport shared by exchange clients.
pub mod transport;

pub use client::{ExchangeClient, KlineRequest};
pub use cursor::Cursor;
pub use middleware::Middleware;
pub use record::{KlineRecord, validate_page};
pub use shard_key::ShardKey;
pub use time::TimestampUnit;
pub use transport::HttpTransport;

pub use klines_types::{
    ExchangeId, Granularity, KlinesError, PagePolicy, Pair, QuotaConfig, SessionConfig,
    SessionReport, StopReason, TransportConfig,
};
