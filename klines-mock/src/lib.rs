//! klines-mock
//!
//! A scripted [`ExchangeClient`](klines_core::ExchangeClient) for tests and offline
//! runs. Responses are scripted per request through a [`ScriptController`]; anything
//! left unscripted is served from a deterministic [`SyntheticSeries`].

mod scripted;
mod series;

pub use scripted::{MockBehavior, ScriptController, ScriptedClient, ScriptedClientBuilder};
pub use series::SyntheticSeries;
