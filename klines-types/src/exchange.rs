//! Exchange identities and the pagination policy they follow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KlinesError;

/// Exchange a session downloads from. Its name prefixes every shard file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ExchangeId {
    /// Binance spot REST API.
    Binance,
    /// Bitfinex v2 public REST API.
    Bitfinex,
    /// Offline synthetic data source.
    Mock,
}

impl ExchangeId {
    /// Lower-case name used in file names and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Bitfinex => "bitfinex",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = KlinesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "bitfinex" => Ok(Self::Bitfinex),
            "mock" => Ok(Self::Mock),
            other => Err(KlinesError::InvalidArg(format!("unknown exchange '{other}'"))),
        }
    }
}

/// How the session reads an empty or short page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePolicy {
    /// A page shorter than requested (including an empty one) means the exchange has
    /// nothing beyond its tail; the session stops after persisting it.
    ShortPage,
    /// Requests are scoped to one-day windows. An empty page means no trades in the
    /// window and the cursor jumps a full window ahead; short pages are normal.
    WindowGapSkip,
}

impl FromStr for PagePolicy {
    type Err = KlinesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "short_page" => Ok(Self::ShortPage),
            "window_gap_skip" | "gap_skip" => Ok(Self::WindowGapSkip),
            other => Err(KlinesError::InvalidArg(format!("unknown page policy '{other}'"))),
        }
    }
}
