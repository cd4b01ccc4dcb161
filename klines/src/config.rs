//! Session configuration from a JSON file, the environment and the command line.
//!
//! Precedence, lowest first: built-in defaults, the `--config` JSON file, `KLINES_*`
//! environment variables, command-line flags. Clap merges the last two.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use klines_core::{
    ExchangeId, Granularity, KlinesError, PagePolicy, Pair, QuotaConfig, SessionConfig,
};
use serde::Deserialize;

/// Download historical klines into day-sharded CSV files.
#[derive(Debug, Default, Parser)]
#[command(name = "klines", version, about)]
pub struct Cli {
    /// JSON configuration file; flags and environment override its values.
    #[arg(long, env = "KLINES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Exchange: binance, bitfinex or mock.
    #[arg(long, env = "KLINES_EXCHANGE")]
    pub exchange: Option<String>,

    /// Currency pair, e.g. BTC_USDT.
    #[arg(long, env = "KLINES_PAIR")]
    pub pair: Option<String>,

    /// Granularity: 1m, 5m, 15m, 30m, 1h, 4h, 6h, 12h, 1d, 1w.
    #[arg(long, env = "KLINES_GRANULARITY")]
    pub granularity: Option<String>,

    /// First instant to download (RFC 3339 or YYYY-MM-DD).
    #[arg(long, env = "KLINES_BEGIN")]
    pub begin: Option<String>,

    /// Last instant to download, inclusive (RFC 3339 or YYYY-MM-DD).
    #[arg(long, env = "KLINES_END")]
    pub end: Option<String>,

    /// Root output directory.
    #[arg(long, env = "KLINES_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Records requested per page.
    #[arg(long, env = "KLINES_PAGE_SIZE")]
    pub page_size: Option<u32>,

    /// Delay between two fetches, in milliseconds.
    #[arg(long, env = "KLINES_RATE_LIMIT_MS")]
    pub rate_limit_ms: Option<u64>,

    /// Proxy URL, e.g. socks5://127.0.0.1:1086.
    #[arg(long, env = "KLINES_PROXY")]
    pub proxy: Option<String>,

    /// Request timeout, in milliseconds.
    #[arg(long, env = "KLINES_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Override of the exchange REST base URL.
    #[arg(long, env = "KLINES_BASE_URL")]
    pub base_url: Option<String>,

    /// Page policy override: short_page or window_gap_skip.
    #[arg(long, env = "KLINES_POLICY")]
    pub policy: Option<String>,

    /// Restart from the latest shard day already on disk.
    #[arg(long, env = "KLINES_RESUME")]
    pub resume: bool,

    /// Maximum requests per quota window.
    #[arg(long, env = "KLINES_QUOTA_LIMIT")]
    pub quota_limit: Option<u64>,

    /// Quota window, in milliseconds.
    #[arg(long, env = "KLINES_QUOTA_WINDOW_MS")]
    pub quota_window_ms: Option<u64>,
}

/// Shape of the `--config` JSON file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub exchange: Option<ExchangeId>,
    pub pair: Option<Pair>,
    pub granularity: Option<Granularity>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub page_size: Option<u32>,
    pub rate_limit_ms: Option<u64>,
    pub proxy: Option<String>,
    pub timeout_ms: Option<u64>,
    pub base_url: Option<String>,
    pub policy: Option<PagePolicy>,
    pub resume: Option<bool>,
    pub quota_limit: Option<u64>,
    pub quota_window_ms: Option<u64>,
}

impl ConfigFile {
    /// Parse a configuration file.
    ///
    /// # Errors
    /// `Io` when the file cannot be read, `Config` when it is not valid.
    pub fn load(path: &std::path::Path) -> Result<Self, KlinesError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| KlinesError::io(path.display().to_string(), &e))?;
        serde_json::from_str(&text)
            .map_err(|e| KlinesError::config(format!("{}: {e}", path.display())))
    }
}

/// Parse an RFC 3339 instant or a `YYYY-MM-DD` date (UTC midnight).
///
/// # Errors
/// Returns `KlinesError::Config` for anything else.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, KlinesError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| KlinesError::config(format!("'{s}' is neither RFC 3339 nor YYYY-MM-DD")))
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, KlinesError> {
    value.ok_or_else(|| KlinesError::config(format!("{name} is required")))
}

/// Merge the file and the command line into a validated [`SessionConfig`].
///
/// # Errors
/// `Config` for missing or invalid values, `InvalidArg` for unparsable
/// pair/granularity/exchange names, `Io` when the config file cannot be read.
pub fn resolve(cli: &Cli) -> Result<SessionConfig, KlinesError> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    let exchange = match cli.exchange.as_deref() {
        Some(s) => s.parse()?,
        None => required(file.exchange, "exchange")?,
    };
    let pair = match cli.pair.as_deref() {
        Some(s) => Pair::parse(s)?,
        None => required(file.pair, "pair")?,
    };
    let granularity = match cli.granularity.as_deref() {
        Some(s) => s.parse()?,
        None => file.granularity.unwrap_or(Granularity::M1),
    };
    let begin = parse_instant(&required(cli.begin.clone().or(file.begin), "begin")?)?;

    let mut cfg = SessionConfig::new(exchange, pair, granularity, begin);
    if let Some(end) = cli.end.as_deref().or(file.end.as_deref()) {
        cfg.end = Some(parse_instant(end)?);
    }
    if let Some(dir) = cli.output_dir.clone().or(file.output_dir) {
        cfg.output_dir = dir;
    }
    if let Some(n) = cli.page_size.or(file.page_size) {
        cfg.page_size = n;
    }
    if let Some(ms) = cli.rate_limit_ms.or(file.rate_limit_ms) {
        cfg.rate_limit_interval = Duration::from_millis(ms);
    }
    cfg.transport.proxy = cli.proxy.clone().or(file.proxy);
    if let Some(ms) = cli.timeout_ms.or(file.timeout_ms) {
        cfg.transport.timeout = Duration::from_millis(ms);
    }
    cfg.transport.base_url = cli.base_url.clone().or(file.base_url);
    cfg.policy = match cli.policy.as_deref() {
        Some(s) => Some(s.parse()?),
        None => file.policy,
    };
    cfg.resume = cli.resume || file.resume.unwrap_or(false);

    let quota_limit = cli.quota_limit.or(file.quota_limit);
    let quota_window = cli.quota_window_ms.or(file.quota_window_ms);
    if quota_limit.is_some() || quota_window.is_some() {
        let defaults = QuotaConfig::default();
        cfg.quota = Some(QuotaConfig {
            limit: quota_limit.unwrap_or(defaults.limit),
            window: quota_window.map_or(defaults.window, Duration::from_millis),
        });
    }

    cfg.validate()?;
    Ok(cfg)
}
