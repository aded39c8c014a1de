mod api;
mod config;
mod display;
mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use cash5_db::archive::{archive_path, load_archive, newest_draw, persist_archive};
use cash5_db::models::DrawRecord;
use cash5_stats::Dataset;
use cash5_stats::annealing::{AnnealingParams, simulated_annealing};
use cash5_stats::distance::{random_search, sample_distance_stats};
use cash5_stats::frequency::analyze_frequencies;
use cash5_stats::history::{
    CLOSE_MATCH_LIMIT, MIN_CLOSE_MATCHES, closest_matches, combo_history, duplicate_combos,
    prior_occurrences,
};
use cash5_stats::odds::{DEFAULT_ODDS_ROWS, odds_table};
use cash5_stats::prizes::summarize_prizes;
use cash5_stats::recommend::recommend;
use cash5_stats::repeat::estimate_for_cash5;
use cash5_stats::uniformity::analyze_uniformity;

use crate::api::HttpDrawSource;
use crate::config::{SyncConfig, make_rng};
use crate::display::{
    display_annealing, display_close_matches, display_debug, display_distance, display_draws,
    display_frequencies, display_jackpot, display_last_numbers, display_no_draws, display_odds,
    display_overview, display_recommendations, display_repeat, display_sync_header,
    display_sync_report, display_uniformity, display_warning, display_window, spinner,
};
use crate::sync::{sync_all, sync_recent};

const DISTANCE_SAMPLES: usize = 10_000;
const RANDOM_SEARCH_SAMPLES: usize = 1_000;
const DAILY_DRAWS_SHOWN: usize = 10;

#[derive(Parser)]
#[command(name = "cash5", about = "NJ Cash 5 draw archive and daily numbers recommender")]
struct Cli {
    /// Archive file (default: $CASH5_ARCHIVE, then ~/.config/cash5/draws.json)
    #[arg(long, global = true)]
    archive: Option<PathBuf>,

    /// Seed for reproducible sampling and annealing
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch missing recent draws, or walk back through all history
    Sync {
        /// Backfill year by year until no new draws are found
        #[arg(short, long)]
        all: bool,
    },

    /// Last draws, closest matches and recommended numbers (default)
    Recommend {
        /// Use the archive as is, without fetching
        #[arg(long)]
        offline: bool,
    },

    /// List stored draws
    List {
        /// Number of draws to show
        #[arg(short, long, default_value = "10")]
        last: usize,

        /// Show every stored draw
        #[arg(short, long)]
        all: bool,
    },

    /// Statistics about the historical draws
    Stats,

    /// Odds table for 1 to N combinations played
    Odds {
        #[arg(default_value_t = DEFAULT_ODDS_ROWS)]
        max: u64,
    },

    /// Dump every stored record drawn on DATE (YYYY-MM-DD)
    Debug { date: String },

    /// Print the archive location
    ArchivePath,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = archive_path(cli.archive.as_deref())?;

    match cli.command.unwrap_or(Command::Recommend { offline: false }) {
        Command::Sync { all } => cmd_sync(&path, all),
        Command::Recommend { offline } => cmd_recommend(&path, offline, cli.seed),
        Command::List { last, all } => cmd_list(&path, last, all),
        Command::Stats => cmd_stats(&path, cli.seed),
        Command::Odds { max } => cmd_odds(&path, max),
        Command::Debug { date } => cmd_debug(&path, &date),
        Command::ArchivePath => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// The analysable dataset, or `None` after telling the user there is nothing to analyse.
fn dataset_or_report(records: &[DrawRecord]) -> Option<Dataset> {
    match Dataset::from_records(records) {
        Ok(dataset) => Some(dataset),
        Err(e) => {
            if records.is_empty() {
                display_no_draws();
            } else {
                println!("{e}");
            }
            None
        }
    }
}

fn cmd_sync(path: &Path, all: bool) -> Result<()> {
    let existing = load_archive(path)?;
    let config = SyncConfig::default();
    let mut source = HttpDrawSource::new(&config)?;
    let save = |draws: &[DrawRecord]| persist_archive(path, draws);

    if all {
        println!("Fetching all historical draws...");
        display_sync_header();
        let archive = sync_all(&mut source, existing, &config, &Local::now(), save, display_window)
            .context("Failed to fetch draws")?;
        println!("Total in archive: {}", archive.len());
    } else {
        let pb = spinner("Fetching recent draws...");
        let result = sync_recent(&mut source, existing, &config, &Local::now(), save);
        pb.finish_and_clear();
        let (archive, report) = result.context("Failed to fetch draws")?;
        display_sync_report(&report, archive.len());
    }
    Ok(())
}

fn cmd_recommend(path: &Path, offline: bool, seed: Option<u64>) -> Result<()> {
    let mut records = load_archive(path)?;

    if !offline {
        let config = SyncConfig::default();
        let mut source = HttpDrawSource::new(&config)?;
        let pb = spinner("Checking for new draws...");
        let result = sync_recent(&mut source, records.clone(), &config, &Local::now(), |draws| {
            persist_archive(path, draws)
        });
        pb.finish_and_clear();
        match result {
            Ok((archive, report)) => {
                if report.backfill.is_some()
                    || report.topup.is_some()
                    || report.topup_error.is_some()
                {
                    display_sync_report(&report, archive.len());
                    println!();
                }
                records = archive;
            }
            Err(e) if records.is_empty() => return Err(e).context("Failed to fetch draws"),
            Err(e) => println!("Warning: failed to fetch draws: {e}"),
        }
    }

    let Some(dataset) = dataset_or_report(&records) else {
        return Ok(());
    };

    let start = records.len().saturating_sub(DAILY_DRAWS_SHOWN);
    display_draws(&records[start..]);

    let latest = dataset.latest();
    display_jackpot(latest);
    display_last_numbers(latest, &prior_occurrences(&dataset, latest));
    display_close_matches(&closest_matches(&dataset, latest, MIN_CLOSE_MATCHES, CLOSE_MATCH_LIMIT));

    let freq = analyze_frequencies(&dataset);
    let mut rng = make_rng(seed);
    display_recommendations(&recommend(&dataset, &freq, &mut rng));
    display_warning();
    Ok(())
}

fn cmd_list(path: &Path, last: usize, all: bool) -> Result<()> {
    let records = load_archive(path)?;
    if records.is_empty() {
        display_no_draws();
        return Ok(());
    }
    let start = if all { 0 } else { records.len().saturating_sub(last) };
    display_draws(&records[start..]);
    Ok(())
}

fn cmd_stats(path: &Path, seed: Option<u64>) -> Result<()> {
    let records = load_archive(path)?;
    let Some(dataset) = dataset_or_report(&records) else {
        return Ok(());
    };

    let freq = analyze_frequencies(&dataset);
    display_overview(&dataset, &summarize_prizes(&dataset), &duplicate_combos(&dataset));
    display_frequencies(&freq);
    display_uniformity(&analyze_uniformity(&dataset, &freq));
    display_repeat(&estimate_for_cash5(combo_history(&dataset).len()));

    let history = dataset.combos();
    let params = AnnealingParams::default();
    let mut rng = make_rng(seed);
    let pb = spinner("Searching the combination space...");
    let baseline = sample_distance_stats(&history, DISTANCE_SAMPLES, &mut rng);
    let best = random_search(&history, RANDOM_SEARCH_SAMPLES, &mut rng);
    let annealing = simulated_annealing(&history, &params, &mut rng);
    pb.finish_and_clear();

    let recent = &dataset.draws()[dataset.len().saturating_sub(3)..];
    display_distance(history.len(), &baseline, best, recent);
    display_annealing(&annealing, &params, best.map(|(_, score)| score));
    Ok(())
}

fn cmd_odds(path: &Path, max: u64) -> Result<()> {
    // Jackpot from the newest stored draw; the table works without one.
    let jackpot = match load_archive(path) {
        Ok(records) => newest_draw(&records)
            .map(|d| d.estimated_jackpot / 100)
            .filter(|&j| j > 0),
        Err(e) => {
            log::warn!("Ignoring unreadable archive: {:#}", e);
            None
        }
    };
    display_odds(&odds_table(max, jackpot), jackpot);
    Ok(())
}

fn draws_on<'a>(records: &'a [DrawRecord], date: NaiveDate) -> Vec<&'a DrawRecord> {
    records.iter().filter(|d| d.local_date() == Some(date)).collect()
}

fn cmd_debug(path: &Path, date: &str) -> Result<()> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', use YYYY-MM-DD", date))?;
    let records = load_archive(path)?;
    display_debug(date, &draws_on(&records, day));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cash5_db::models::make_test_draw;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_recommend() {
        let cli = Cli::try_parse_from(["cash5"]).unwrap();
        assert!(cli.command.is_none());
        let cli = Cli::try_parse_from(["cash5", "odds"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Odds { max: 30 })));
        let cli = Cli::try_parse_from(["cash5", "--seed", "7", "sync", "--all"]).unwrap();
        assert_eq!(cli.seed, Some(7));
        assert!(matches!(cli.command, Some(Command::Sync { all: true })));
    }

    #[test]
    fn test_draws_on_local_date() {
        let evening = Local.with_ymd_and_hms(2026, 2, 6, 22, 57, 0).unwrap().timestamp_millis();
        let next = Local.with_ymd_and_hms(2026, 2, 7, 22, 57, 0).unwrap().timestamp_millis();
        let mut broken = make_test_draw("broken", evening + 1, [1, 2, 3, 4, 5]);
        broken.results.clear();
        let records = vec![
            make_test_draw("a", evening, [1, 2, 3, 4, 5]),
            broken,
            make_test_draw("b", next, [6, 7, 8, 9, 10]),
        ];
        let day = NaiveDate::from_ymd_opt(2026, 2, 6).unwrap();
        let found: Vec<&str> = draws_on(&records, day).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(found, vec!["a", "broken"]);
    }
}
