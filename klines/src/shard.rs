//! Day-sharded CSV persistence.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use klines_core::{ExchangeId, Granularity, KlineRecord, KlinesError, Pair, ShardKey, TimestampUnit};
use rust_decimal::{Decimal, RoundingStrategy};

const DECIMALS: u32 = 8;

/// Routes records to one CSV file per [`ShardKey`].
///
/// A shard is created (or truncated) the first time the session writes to it. Records
/// arrive in timestamp order, so opening a later day flushes and closes every earlier
/// shard; a closed shard is never reopened. Rows are
/// `timestamp,high,low,open,close,volume` without a header.
pub struct ShardWriter {
    dir: PathBuf,
    exchange: ExchangeId,
    pair: Pair,
    granularity: Granularity,
    unit: TimestampUnit,
    open: HashMap<ShardKey, csv::Writer<File>>,
    retired: HashSet<ShardKey>,
    closed: bool,
}

impl ShardWriter {
    /// Prepare a writer for one stream, creating `dir` if needed.
    ///
    /// # Errors
    /// Returns `KlinesError::Io` when the directory cannot be created.
    pub fn create(
        dir: impl Into<PathBuf>,
        exchange: ExchangeId,
        pair: Pair,
        granularity: Granularity,
        unit: TimestampUnit,
    ) -> Result<Self, KlinesError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| KlinesError::io(dir.display().to_string(), &e))?;
        Ok(Self {
            dir,
            exchange,
            pair,
            granularity,
            unit,
            open: HashMap::new(),
            retired: HashSet::new(),
            closed: false,
        })
    }

    /// Directory the shards land in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of shards opened so far in this session.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.open.len() + self.retired.len()
    }

    /// Number of shards currently holding a file handle.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    fn key_for(&self, ts: i64) -> Result<ShardKey, KlinesError> {
        let key = ShardKey::for_timestamp(self.exchange, &self.pair, self.granularity, self.unit, ts)?;
        if self.retired.contains(&key) {
            return Err(KlinesError::Data(format!(
                "timestamp {ts} belongs to closed shard {}",
                key.file_name()
            )));
        }
        Ok(key)
    }

    /// Flush and close every open shard of a day before `day`.
    fn retire_before(&mut self, day: NaiveDate) -> Result<(), KlinesError> {
        let stale: Vec<ShardKey> = self.open.keys().filter(|k| k.day < day).cloned().collect();
        for key in stale {
            if let Some(mut writer) = self.open.remove(&key) {
                let path = self.dir.join(key.file_name());
                writer
                    .flush()
                    .map_err(|err| KlinesError::io(path.display().to_string(), &err))?;
                tracing::debug!(path = %path.display(), "closed shard");
            }
            self.retired.insert(key);
        }
        Ok(())
    }

    /// Append one record to its shard.
    ///
    /// # Errors
    /// `Data` when the timestamp has no calendar day or its shard was already closed;
    /// `Io` when the shard cannot be created or written.
    pub fn write(&mut self, record: &KlineRecord) -> Result<(), KlinesError> {
        let key = self.key_for(record.timestamp)?;
        self.append(key, record)
    }

    /// Append a whole page.
    ///
    /// Every timestamp is mapped to its shard before the first row is written, so a
    /// page with an unmappable timestamp leaves no partial output behind.
    ///
    /// # Errors
    /// See [`write`](Self::write).
    pub fn write_page(&mut self, page: &[KlineRecord]) -> Result<(), KlinesError> {
        let keys = page
            .iter()
            .map(|r| self.key_for(r.timestamp))
            .collect::<Result<Vec<_>, _>>()?;
        for (key, record) in keys.into_iter().zip(page) {
            self.append(key, record)?;
        }
        Ok(())
    }

    fn append(&mut self, key: ShardKey, record: &KlineRecord) -> Result<(), KlinesError> {
        if !self.open.contains_key(&key) {
            self.retire_before(key.day)?;
        }
        let path = self.dir.join(key.file_name());
        let writer = match self.open.entry(key) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)
                    .map_err(|err| KlinesError::io(path.display().to_string(), &err))?;
                tracing::debug!(path = %path.display(), "opened shard");
                e.insert(
                    csv::WriterBuilder::new()
                        .has_headers(false)
                        .from_writer(file),
                )
            }
        };
        writer
            .write_record([
                record.timestamp.to_string(),
                format_decimal(record.high),
                format_decimal(record.low),
                format_decimal(record.open),
                format_decimal(record.close),
                format_decimal(record.volume),
            ])
            .map_err(|err| csv_error(&path, err))
    }

    /// Flush every open shard.
    ///
    /// All shards are attempted; the first failure is returned.
    ///
    /// # Errors
    /// Returns `KlinesError::Io` when a shard cannot be flushed.
    pub fn flush_all(&mut self) -> Result<(), KlinesError> {
        let mut first_err = None;
        for (key, writer) in &mut self.open {
            if let Err(err) = writer.flush() {
                let err = KlinesError::io(self.dir.join(key.file_name()).display().to_string(), &err);
                tracing::error!(error = %err, "failed to flush shard");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Flush and close every shard.
    ///
    /// # Errors
    /// Returns the first flush failure; every shard is closed regardless.
    pub fn close(mut self) -> Result<(), KlinesError> {
        let res = self.flush_all();
        self.open.clear();
        self.closed = true;
        res
    }

    /// Most recent day with a shard of this stream in `dir`, if any.
    ///
    /// A missing directory counts as empty.
    ///
    /// # Errors
    /// Returns `KlinesError::Io` when the directory exists but cannot be listed.
    pub fn latest_shard_day(
        dir: &Path,
        exchange: ExchangeId,
        pair: &Pair,
        granularity: Granularity,
    ) -> Result<Option<NaiveDate>, KlinesError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KlinesError::io(dir.display().to_string(), &e)),
        };
        let mut latest = None;
        for entry in entries {
            let entry = entry.map_err(|e| KlinesError::io(dir.display().to_string(), &e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(day) = ShardKey::parse_day(name, exchange, pair, granularity) {
                latest = latest.max(Some(day));
            }
        }
        Ok(latest)
    }
}

impl Drop for ShardWriter {
    fn drop(&mut self) {
        if !self.closed && !self.open.is_empty() {
            // Reached only when `close` was skipped, e.g. while unwinding.
            let _ = self.flush_all();
        }
    }
}

/// Round half away from zero to 8 places and print exactly 8 fractional digits.
#[must_use]
pub fn format_decimal(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.8}")
}

fn csv_error(path: &Path, err: csv::Error) -> KlinesError {
    KlinesError::Io {
        context: path.display().to_string(),
        msg: err.to_string(),
    }
}
