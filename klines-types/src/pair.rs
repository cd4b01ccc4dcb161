use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KlinesError;

/// A base/quote currency pair, stored upper-case (e.g. `BTC`/`USDT`).
///
/// Parsed from `BTC_USDT`, `btc/usdt` or `BTC-USDT`; rendered as `BTC_USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    base: String,
    quote: String,
}

impl Pair {
    /// Build a pair from its two currency symbols.
    ///
    /// # Errors
    /// Returns `InvalidArg` if either symbol is empty or not alphanumeric.
    pub fn new(base: &str, quote: &str) -> Result<Self, KlinesError> {
        let check = |s: &str, side: &str| -> Result<String, KlinesError> {
            let s = s.trim();
            if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(KlinesError::InvalidArg(format!(
                    "invalid {side} currency '{s}'"
                )));
            }
            Ok(s.to_ascii_uppercase())
        };
        Ok(Self {
            base: check(base, "base")?,
            quote: check(quote, "quote")?,
        })
    }

    /// Parse `BASE_QUOTE`, `BASE/QUOTE` or `BASE-QUOTE`, case-insensitively.
    ///
    /// # Errors
    /// Returns `InvalidArg` when no separator is present or a side is invalid.
    pub fn parse(s: &str) -> Result<Self, KlinesError> {
        let (base, quote) = s
            .split_once(['_', '/', '-'])
            .ok_or_else(|| KlinesError::InvalidArg(format!("pair '{s}' has no separator")))?;
        Self::new(base, quote)
    }

    /// Base currency, upper-case.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Quote currency, upper-case.
    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Exchange-style symbol without separator, upper-case (`BTCUSDT`).
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Symbol without separator, lower-case (`btcusdt`), as used in shard names.
    #[must_use]
    pub fn symbol_lower(&self) -> String {
        self.symbol().to_ascii_lowercase()
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = KlinesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pair {
    type Error = KlinesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Pair> for String {
    fn from(p: Pair) -> Self {
        p.to_string()
    }
}
