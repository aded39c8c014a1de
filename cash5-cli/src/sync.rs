use std::thread;

use chrono::{DateTime, Local, Months, TimeZone};

use cash5_db::archive::{merge_draws, newest_draw, oldest_draw};
use cash5_db::models::DrawRecord;

use crate::api::{DrawSource, FetchError, PageQuery};
use crate::config::SyncConfig;

const DAY_MS: i64 = 86_400_000;
/// Archives whose newest draw is older than this are reported as outdated.
pub const STALE_AFTER_DAYS: i64 = 7;

/// Inclusive epoch-millisecond bounds of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: i64,
    pub to: i64,
}

impl DateRange {
    pub fn label(&self) -> String {
        format!("{} → {}", local_day(self.from), local_day(self.to))
    }
}

fn local_day(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Result of paging through one range. `records` is the full merged archive.
#[derive(Debug)]
pub struct FetchOutcome {
    pub records: Vec<DrawRecord>,
    /// Records not previously in the archive.
    pub new_records: usize,
    pub fetched: usize,
    pub pages: usize,
    /// Set when a later page failed after earlier pages succeeded.
    pub interrupted: Option<(usize, FetchError)>,
    pub save_failures: SaveFailures,
}

/// Pages whose merged archive could not be persisted.
#[derive(Debug, Default)]
pub struct SaveFailures {
    pub count: usize,
    pub last_error: Option<anyhow::Error>,
}

impl SaveFailures {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn record(&mut self, err: anyhow::Error) {
        self.count += 1;
        self.last_error = Some(err);
    }
}

fn fetch_with_retry<S: DrawSource + ?Sized>(
    source: &mut S,
    query: &PageQuery,
    config: &SyncConfig,
) -> Result<Vec<DrawRecord>, FetchError> {
    let mut attempt = 1;
    loop {
        match source.fetch_page(query) {
            Ok(draws) => return Ok(draws),
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                eprintln!(
                    "{} on page {}, retry {}/{}...",
                    e, query.page, attempt, config.max_attempts
                );
                if !config.retry_delay.is_zero() {
                    thread::sleep(config.retry_delay);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Page through `range`, merging each page into the archive and handing the
/// merged archive to `on_page` before the next request.
///
/// A failure after at least one record was fetched returns the partial result
/// with `interrupted` set; a failure before that is returned as the error.
pub fn fetch_range<S, F>(
    source: &mut S,
    range: DateRange,
    existing: &[DrawRecord],
    config: &SyncConfig,
    mut on_page: F,
) -> Result<FetchOutcome, FetchError>
where
    S: DrawSource + ?Sized,
    F: FnMut(&[DrawRecord]) -> anyhow::Result<()>,
{
    let mut all = merge_draws(&[], existing);
    let before = all.len();
    let mut fetched = 0;
    let mut pages = 0;
    let mut page = 0;
    let mut save_failures = SaveFailures::default();

    let interrupted = loop {
        let query = PageQuery {
            page,
            size: config.page_size,
            date_from: range.from,
            date_to: range.to,
        };
        let draws = match fetch_with_retry(source, &query, config) {
            Ok(draws) => draws,
            Err(e) if fetched > 0 => {
                log::warn!(
                    "Error fetching page {}: {}. Keeping {} draws.",
                    page, e, fetched
                );
                break Some((page, e));
            }
            Err(e) => return Err(e),
        };

        if draws.is_empty() {
            break None;
        }

        fetched += draws.len();
        pages += 1;
        all = merge_draws(&all, &draws);
        log::debug!(
            "Page {}: {} draws, archive now {}",
            page,
            draws.len(),
            all.len()
        );

        if let Err(e) = on_page(&all) {
            eprintln!("Warning: failed to save draws after page {}: {:#}", page, e);
            save_failures.record(e);
        }

        if draws.len() < config.page_size {
            break None;
        }
        if fetched >= config.max_records {
            log::info!("Reached {} draws limit, stopping fetch", config.max_records);
            break None;
        }
        page += 1;
    };

    Ok(FetchOutcome {
        new_records: all.len().saturating_sub(before),
        records: all,
        fetched,
        pages,
        interrupted,
        save_failures,
    })
}

fn year_before(ms: i64) -> i64 {
    DateTime::from_timestamp_millis(ms)
        .and_then(|t| t.checked_sub_months(Months::new(12)))
        .map(|t| t.timestamp_millis())
        .unwrap_or(ms - 365 * DAY_MS)
}

/// The year ending just before the oldest record, or the last year when the
/// archive is empty.
pub fn backfill_window<Tz: TimeZone>(existing: &[DrawRecord], now: &DateTime<Tz>) -> DateRange {
    let to = match oldest_draw(existing) {
        Some(oldest) => oldest.draw_time - 1,
        None => now.timestamp_millis(),
    };
    DateRange {
        from: year_before(to),
        to,
    }
}

/// Everything after the newest record up to `now`.
pub fn topup_window<Tz: TimeZone>(newest: &DrawRecord, now: &DateTime<Tz>) -> DateRange {
    DateRange {
        from: newest.draw_time + 1,
        to: now.timestamp_millis(),
    }
}

pub fn is_stale<Tz: TimeZone>(newest: &DrawRecord, now: &DateTime<Tz>) -> bool {
    newest.draw_time < now.timestamp_millis() - STALE_AFTER_DAYS * DAY_MS
}

/// Midnight at the start of the day before `now`, in `now`'s zone.
pub fn start_of_yesterday<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    now.date_naive()
        .pred_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| dt.and_local_timezone(now.timezone()).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(now.timestamp_millis() - 2 * DAY_MS)
}

/// One line of sync output.
#[derive(Debug)]
pub struct WindowSummary {
    pub range: DateRange,
    pub new_records: usize,
    pub total: usize,
    pub interrupted: Option<(usize, FetchError)>,
    pub save_failures: SaveFailures,
}

impl WindowSummary {
    fn from_outcome(range: DateRange, outcome: &mut FetchOutcome) -> Self {
        Self {
            range,
            new_records: outcome.new_records,
            total: outcome.records.len(),
            interrupted: outcome.interrupted.take(),
            save_failures: std::mem::take(&mut outcome.save_failures),
        }
    }
}

/// Walk backward one year at a time until a window adds nothing.
pub fn sync_all<S, F, W, Tz>(
    source: &mut S,
    existing: Vec<DrawRecord>,
    config: &SyncConfig,
    now: &DateTime<Tz>,
    mut on_page: F,
    mut on_window: W,
) -> Result<Vec<DrawRecord>, FetchError>
where
    S: DrawSource + ?Sized,
    F: FnMut(&[DrawRecord]) -> anyhow::Result<()>,
    W: FnMut(&WindowSummary),
    Tz: TimeZone,
{
    let mut archive = existing;
    loop {
        let range = backfill_window(&archive, now);
        let mut outcome = fetch_range(source, range, &archive, config, &mut on_page)?;
        let summary = WindowSummary::from_outcome(range, &mut outcome);
        on_window(&summary);
        archive = outcome.records;
        if summary.new_records == 0 || summary.interrupted.is_some() {
            return Ok(archive);
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub backfill: Option<WindowSummary>,
    pub topup: Option<WindowSummary>,
    /// Top-up failures do not fail the sync.
    pub topup_error: Option<FetchError>,
}

/// Bring the archive current: backfill a year when empty, then top up when
/// the newest record is before yesterday.
pub fn sync_recent<S, F, Tz>(
    source: &mut S,
    existing: Vec<DrawRecord>,
    config: &SyncConfig,
    now: &DateTime<Tz>,
    mut on_page: F,
) -> Result<(Vec<DrawRecord>, SyncReport), FetchError>
where
    S: DrawSource + ?Sized,
    F: FnMut(&[DrawRecord]) -> anyhow::Result<()>,
    Tz: TimeZone,
{
    let mut archive = existing;
    let mut report = SyncReport::default();

    if archive.is_empty() {
        log::info!("Empty archive, fetching the last year of draws");
        let range = backfill_window(&archive, now);
        let mut outcome = fetch_range(source, range, &archive, config, &mut on_page)?;
        report.backfill = Some(WindowSummary::from_outcome(range, &mut outcome));
        archive = outcome.records;
    }

    let Some(newest) = newest_draw(&archive).cloned() else {
        return Ok((archive, report));
    };
    if is_stale(&newest, now) {
        log::info!("Archive is outdated (newest draw {})", local_day(newest.draw_time));
    }
    if newest.draw_time < start_of_yesterday(now) {
        let range = topup_window(&newest, now);
        match fetch_range(source, range, &archive, config, &mut on_page) {
            Ok(mut outcome) => {
                report.topup = Some(WindowSummary::from_outcome(range, &mut outcome));
                archive = outcome.records;
            }
            Err(e) => {
                log::warn!("Failed to fetch recent draws: {}", e);
                report.topup_error = Some(e);
            }
        }
    }

    Ok((archive, report))
}
