use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KlinesError;

/// Fixed time-bucket width of a kline series.
///
/// Serialized with the label used in shard file names (`1min`, `4h`, `1day`, ...);
/// the short exchange-style codes (`1m`, `1d`, `1w`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    /// One minute.
    #[serde(rename = "1min", alias = "1m")]
    M1,
    /// Five minutes.
    #[serde(rename = "5min", alias = "5m")]
    M5,
    /// Fifteen minutes.
    #[serde(rename = "15min", alias = "15m")]
    M15,
    /// Thirty minutes.
    #[serde(rename = "30min", alias = "30m")]
    M30,
    /// One hour.
    #[serde(rename = "1h")]
    H1,
    /// Four hours.
    #[serde(rename = "4h")]
    H4,
    /// Six hours.
    #[serde(rename = "6h")]
    H6,
    /// Twelve hours.
    #[serde(rename = "12h")]
    H12,
    /// One day.
    #[serde(rename = "1day", alias = "1d")]
    D1,
    /// One week.
    #[serde(rename = "1week", alias = "1w")]
    W1,
}

impl Granularity {
    /// Every supported granularity, finest first.
    pub const ALL: &'static [Self] = &[
        Self::M1,
        Self::M5,
        Self::M15,
        Self::M30,
        Self::H1,
        Self::H4,
        Self::H6,
        Self::H12,
        Self::D1,
        Self::W1,
    ];

    /// Label used in shard file names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::M1 => "1min",
            Self::M5 => "5min",
            Self::M15 => "15min",
            Self::M30 => "30min",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::H6 => "6h",
            Self::H12 => "12h",
            Self::D1 => "1day",
            Self::W1 => "1week",
        }
    }

    /// Bucket width in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::M1 => 60,
            Self::M5 => 300,
            Self::M15 => 900,
            Self::M30 => 1_800,
            Self::H1 => 3_600,
            Self::H4 => 14_400,
            Self::H6 => 21_600,
            Self::H12 => 43_200,
            Self::D1 => 86_400,
            Self::W1 => 604_800,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Granularity {
    type Err = KlinesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let g = match s.trim().to_ascii_lowercase().as_str() {
            "1min" | "1m" => Self::M1,
            "5min" | "5m" => Self::M5,
            "15min" | "15m" => Self::M15,
            "30min" | "30m" => Self::M30,
            "1h" => Self::H1,
            "4h" => Self::H4,
            "6h" => Self::H6,
            "12h" => Self::H12,
            "1day" | "1d" => Self::D1,
            "1week" | "1w" => Self::W1,
            other => {
                return Err(KlinesError::InvalidArg(format!(
                    "unknown granularity '{other}'"
                )));
            }
        };
        Ok(g)
    }
}
