//! klines downloads historical OHLCV series from cryptocurrency exchanges into
//! day-sharded CSV files.
//!
//! Overview
//! - [`Session`] owns the cursor and drives fetch, persist, advance on a fixed
//!   [`Pacer`] tick until a short page, the configured end, or cancellation.
//! - [`ShardWriter`] routes each record to
//!   `{exchange}_kline_{symbol}_{granularity}_{YYYY-MM-DD}.csv` and flushes every
//!   shard on every exit path.
//! - [`Shutdown`] turns Ctrl-C/SIGTERM into a flag the session checks between cycles.
//! - [`config`] merges a JSON file, `KLINES_*` variables and flags into a
//!   [`SessionConfig`](klines_core::SessionConfig); [`connect`](connect::connect)
//!   builds the matching client with its middleware.
//!
//! ```rust,ignore
//! let cfg = klines::config::resolve(&cli)?;
//! let client = klines::connect::connect(&cfg)?;
//! let shutdown = klines::Shutdown::new();
//! shutdown.listen_for_signals();
//! let report = klines::Session::new(cfg, client, shutdown.token())?.run().await?;
//! ```

pub mod config;
pub mod connect;
mod pacer;
mod session;
mod shard;
mod shutdown;

pub use pacer::Pacer;
pub use session::Session;
pub use shard::{ShardWriter, format_decimal};
pub use shutdown::{Shutdown, ShutdownToken};
