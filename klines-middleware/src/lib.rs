//! klines-middleware
//!
//! Wrappers around [`ExchangeClient`](klines_core::ExchangeClient) implementations and
//! a builder that layers them.

mod builder;
mod quota;
mod timeout;

pub use crate::builder::ClientBuilder;
pub use crate::quota::{QuotaClient, QuotaMiddleware};
pub use crate::timeout::{TimeoutClient, TimeoutMiddleware};
