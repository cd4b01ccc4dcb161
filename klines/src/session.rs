//! The pagination controller.

use std::sync::Arc;

use chrono::Utc;
use klines_core::{
    Cursor, ExchangeClient, KlineRequest, KlinesError, PagePolicy, SessionConfig, SessionReport,
    StopReason, TimestampUnit, validate_page,
};

use crate::pacer::Pacer;
use crate::shard::ShardWriter;
use crate::shutdown::ShutdownToken;

/// Counters accumulated over a session.
#[derive(Debug, Default)]
struct Stats {
    pages: u64,
    records: u64,
    gap_skips: u64,
    fetch_errors: u64,
}

/// One download session: fetch, persist, advance, until a stop condition.
///
/// The cursor only advances after a page has been handed to the shard writer, and
/// every exit path (stop condition, cancellation, fatal error) closes the shards.
pub struct Session {
    cfg: SessionConfig,
    client: Arc<dyn ExchangeClient>,
    shutdown: ShutdownToken,
    policy: PagePolicy,
    page_size: u32,
}

impl Session {
    /// Validate `cfg` against the client and prepare a session.
    ///
    /// # Errors
    /// `Config` when the configuration is inconsistent; `Unsupported` when the client
    /// does not serve the configured granularity.
    pub fn new(
        cfg: SessionConfig,
        client: Arc<dyn ExchangeClient>,
        shutdown: ShutdownToken,
    ) -> Result<Self, KlinesError> {
        cfg.validate()?;
        if !client.supports(cfg.granularity) {
            return Err(KlinesError::unsupported(format!(
                "{}/granularity/{}",
                client.name(),
                cfg.granularity
            )));
        }
        let policy = cfg.policy.unwrap_or_else(|| client.default_policy());
        let page_size = cfg.page_size.min(client.max_page_size());
        if page_size < cfg.page_size {
            tracing::warn!(
                requested = cfg.page_size,
                capped = page_size,
                exchange = client.name(),
                "page size capped at exchange maximum"
            );
        }
        Ok(Self {
            cfg,
            client,
            shutdown,
            policy,
            page_size,
        })
    }

    /// Effective termination policy.
    #[must_use]
    pub const fn policy(&self) -> PagePolicy {
        self.policy
    }

    /// Effective page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Drive the session to completion.
    ///
    /// # Errors
    /// Returns the first non-retryable error (filesystem failure, unsupported
    /// capability). Shards written so far are flushed before the error is returned.
    pub async fn run(self) -> Result<SessionReport, KlinesError> {
        let unit = self.client.timestamp_unit();
        let pair_dir = self.cfg.pair_dir();

        let mut begin = self.cfg.begin;
        if self.cfg.resume
            && let Some(day) = ShardWriter::latest_shard_day(
                &pair_dir,
                self.client.exchange(),
                &self.cfg.pair,
                self.cfg.granularity,
            )?
        {
            let resume_at = day.and_time(chrono::NaiveTime::MIN).and_utc();
            if resume_at > begin {
                tracing::info!(%day, "resuming from latest shard day");
                begin = resume_at;
            }
        }

        let end = match (self.cfg.end, self.policy) {
            (Some(end), _) => Some(unit.from_datetime(end)),
            (None, PagePolicy::WindowGapSkip) => Some(unit.from_datetime(Utc::now())),
            (None, PagePolicy::ShortPage) => None,
        };

        let mut writer = ShardWriter::create(
            pair_dir,
            self.client.exchange(),
            self.cfg.pair.clone(),
            self.cfg.granularity,
            unit,
        )?;
        let mut cursor = Cursor::new(unit.from_datetime(begin));
        let mut stats = Stats::default();

        tracing::info!(
            exchange = self.client.name(),
            pair = %self.cfg.pair,
            granularity = %self.cfg.granularity,
            since = cursor.since(),
            end = ?end,
            policy = ?self.policy,
            page_size = self.page_size,
            dir = %writer.dir().display(),
            "session started"
        );

        let outcome = self
            .drive(&mut writer, &mut cursor, &mut stats, unit, end)
            .await;
        let shards = writer.shard_count();
        let closed = writer.close();

        let stop = match (outcome, closed) {
            (Err(e), _) | (Ok(_), Err(e)) => {
                tracing::error!(error = %e, since = cursor.since(), "session aborted");
                return Err(e);
            }
            (Ok(stop), Ok(())) => stop,
        };
        let report = SessionReport {
            pages: stats.pages,
            records: stats.records,
            gap_skips: stats.gap_skips,
            fetch_errors: stats.fetch_errors,
            shards,
            final_since: cursor.since(),
            stop,
        };
        tracing::info!(
            stop = ?report.stop,
            pages = report.pages,
            records = report.records,
            gap_skips = report.gap_skips,
            fetch_errors = report.fetch_errors,
            shards = report.shards,
            "session finished"
        );
        Ok(report)
    }

    async fn drive(
        &self,
        writer: &mut ShardWriter,
        cursor: &mut Cursor,
        stats: &mut Stats,
        unit: TimestampUnit,
        end: Option<i64>,
    ) -> Result<StopReason, KlinesError> {
        let mut pacer = Pacer::new(self.cfg.rate_limit_interval);
        loop {
            if let Some(end) = end
                && cursor.is_past(end)
            {
                return Ok(StopReason::PastEnd);
            }

            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Ok(StopReason::Cancelled),
                () = pacer.tick() => {}
            }
            if self.shutdown.is_cancelled() {
                return Ok(StopReason::Cancelled);
            }

            let outcome = self.cycle(writer, cursor, stats, unit, end).await;
            pacer.reset();
            match outcome {
                Ok(Some(stop)) => return Ok(stop),
                Ok(None) => {}
                Err(e) if e.is_retryable() => {
                    stats.fetch_errors += 1;
                    tracing::warn!(
                        error = %e,
                        pair = %self.cfg.pair,
                        since = cursor.since(),
                        "fetch failed, retrying on next tick"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One fetch-persist-advance cycle. `Some` ends the session.
    async fn cycle(
        &self,
        writer: &mut ShardWriter,
        cursor: &mut Cursor,
        stats: &mut Stats,
        unit: TimestampUnit,
        end: Option<i64>,
    ) -> Result<Option<StopReason>, KlinesError> {
        let window = unit.day();
        let until = match self.policy {
            PagePolicy::ShortPage => end,
            PagePolicy::WindowGapSkip => {
                let window_end = cursor.since().saturating_add(window - 1);
                Some(end.map_or(window_end, |end| window_end.min(end)))
            }
        };
        cursor.bound(until);

        let req = KlineRequest {
            pair: self.cfg.pair.clone(),
            granularity: self.cfg.granularity,
            limit: self.page_size,
            since: cursor.since(),
            until: cursor.until(),
        };
        let page = self.client.fetch(&req).await?;
        validate_page(&page, cursor.since())?;

        let Some(last) = page.last().map(|r| r.timestamp) else {
            return Ok(match self.policy {
                PagePolicy::ShortPage => {
                    tracing::info!(since = cursor.since(), "empty page, nothing further");
                    Some(StopReason::ShortPage)
                }
                PagePolicy::WindowGapSkip => {
                    tracing::debug!(
                        since = cursor.since(),
                        until = ?cursor.until(),
                        "empty window, skipping one day"
                    );
                    cursor.skip_window(window);
                    stats.gap_skips += 1;
                    None
                }
            });
        };

        writer.write_page(&page)?;
        stats.pages += 1;
        stats.records += page.len() as u64;
        cursor.advance_past(last);
        tracing::info!(
            exchange = self.client.name(),
            pair = %self.cfg.pair,
            records = page.len(),
            last,
            next_since = cursor.since(),
            "page persisted"
        );

        let short = page.len() < self.page_size as usize;
        if short && self.policy == PagePolicy::ShortPage {
            return Ok(Some(StopReason::ShortPage));
        }
        Ok(None)
    }
}
