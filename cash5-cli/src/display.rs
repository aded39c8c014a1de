use std::time::Duration;

use chrono::{DateTime, Local};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};

use cash5_db::models::{Combo, DrawRecord, TOTAL_COMBINATIONS};
use cash5_stats::annealing::{AnnealingOutcome, AnnealingParams};
use cash5_stats::distance::{DistanceStats, numbers_different};
use cash5_stats::frequency::{FrequencyAnalysis, NumberCount};
use cash5_stats::history::CloseMatch;
use cash5_stats::odds::OddsRow;
use cash5_stats::prizes::{PrizeRecord, PrizeSummary};
use cash5_stats::recommend::Recommendation;
use cash5_stats::repeat::RepeatEstimate;
use cash5_stats::uniformity::{ChiSquaredTest, UniformityReport};
use cash5_stats::{Dataset, ValidDraw};

use crate::sync::{SyncReport, WindowSummary};

pub const LOTTERY_WARNING: &str =
    "This is basically lighting money on fire! Play for fun, not profit.";

const POSITION_NAMES: [&str; 5] = ["First", "Second", "Third", "Fourth", "Fifth"];

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Whole dollars with thousands separators: `$1,234,567`.
pub fn format_currency(dollars: i64) -> String {
    let digits = dollars.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if dollars < 0 {
        format!("-${out}")
    } else {
        format!("${out}")
    }
}

pub fn format_cents(cents: i64) -> String {
    format_currency(cents / 100)
}

pub fn format_count(n: u64) -> String {
    format_currency(n as i64).trim_start_matches('$').to_string()
}

pub fn format_date(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// `2026-feb-17` style used in narrative lines.
pub fn narrative_date(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| {
            let local = t.with_timezone(&Local);
            format!(
                "{}-{}-{}",
                local.format("%Y"),
                local.format("%b").to_string().to_lowercase(),
                local.format("%d")
            )
        })
        .unwrap_or_else(|| "?".to_string())
}

fn format_probability(pct: f64) -> String {
    if pct >= 1.0 {
        format!("{pct:.4}%")
    } else {
        format!("{pct:.6}%")
    }
}

fn format_ev(ev: f64) -> String {
    if ev >= 0.0 {
        format!("+${ev:.2}")
    } else {
        format!("-${:.2}", -ev)
    }
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn display_no_draws() {
    println!("No draws found. Run `cash5 sync` first.");
}

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        display_no_draws();
        return;
    }

    let mut table = new_table(vec!["Date", "Winning numbers", "5/5 payout"]);
    for draw in draws {
        let numbers = match draw.combo() {
            Ok(combo) => Cell::new(combo.to_string()),
            Err(_) => Cell::new("invalid").fg(Color::Red),
        };
        let payout = draw.payout_cents();
        let payout_cell = if payout > 0 {
            Cell::new(format_cents(payout)).fg(Color::Green)
        } else {
            Cell::new("$0")
        };
        table.add_row(vec![Cell::new(format_date(draw.draw_time)), numbers, payout_cell]);
    }
    println!("{table}");
}

pub fn display_sync_header() {
    println!("{:<33}  {:>7}  {:>12}", "PERIOD", "DRAWS", "GRAND TOTAL");
}

pub fn display_window(summary: &WindowSummary) {
    println!(
        "{:<33}  {:>7}  {:>12}",
        summary.range.label(),
        summary.new_records,
        summary.total
    );
    for line in window_notes(summary) {
        println!("{line}");
    }
}

/// Interruption and persistence notes for one fetched window.
fn window_notes(summary: &WindowSummary) -> Vec<String> {
    let mut notes = Vec::new();
    let failures = &summary.save_failures;
    if let Some((page, err)) = &summary.interrupted {
        if failures.is_empty() {
            notes.push(format!(
                "Error fetching page {page} ({err}). Saved {} draws successfully.",
                summary.new_records
            ));
        } else {
            notes.push(format!(
                "Error fetching page {page} ({err}). Kept {} draws for this run.",
                summary.new_records
            ));
        }
    }
    if let Some(err) = &failures.last_error {
        notes.push(format!(
            "Warning: {} of the archive saves failed, last error: {err:#}",
            failures.count
        ));
    }
    notes
}

pub fn display_sync_report(report: &SyncReport, total: usize) {
    if let Some(backfill) = &report.backfill {
        display_sync_header();
        display_window(backfill);
    }
    if let Some(topup) = &report.topup {
        println!("Fetched {} recent draws.", topup.new_records);
        for line in window_notes(topup) {
            println!("{line}");
        }
    }
    if let Some(err) = &report.topup_error {
        println!("Warning: failed to fetch recent draws: {err}");
    }
    println!("Total in archive: {total}");
}

pub fn display_jackpot(latest: &ValidDraw) {
    if latest.estimated_jackpot_cents > 0 {
        println!("\nCurrent jackpot: {}", format_cents(latest.estimated_jackpot_cents));
    }
}

pub fn display_last_numbers(latest: &ValidDraw, repeats: &[&ValidDraw]) {
    println!(
        "Last winning numbers ({}): {}",
        narrative_date(latest.draw_time),
        latest.combo
    );
    if repeats.is_empty() {
        println!("  Never drawn before");
    } else {
        let dates: Vec<String> = repeats.iter().map(|d| narrative_date(d.draw_time)).collect();
        println!("  Repeated on: {}", dates.join(", "));
    }
}

pub fn display_close_matches(matches: &[CloseMatch]) {
    if matches.is_empty() {
        println!("\nNo previous draw shares 3 or more numbers with the last one.");
        return;
    }
    println!("\nClosest previous draws:");
    let mut table = new_table(vec!["Date", "Numbers", "Matches"]);
    for m in matches {
        table.add_row(vec![
            format_date(m.draw_time),
            m.combo.to_string(),
            format!("{}/5", m.matches),
        ]);
    }
    println!("{table}");
}

pub fn display_recommendations(recs: &[Recommendation]) {
    println!("\nRecommended numbers:");
    let mut table = new_table(vec!["#", "Numbers", "Strategy"]);
    for (i, rec) in recs.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(rec.combo.to_string()).fg(Color::Green),
            Cell::new(rec.strategy.to_string()),
        ]);
    }
    println!("{table}");
}

pub fn display_warning() {
    println!("\n{LOTTERY_WARNING}");
}

fn print_prize(label: &str, prize: &PrizeRecord) {
    println!("\n{label}: {}", format_cents(prize.payout_cents));
    println!("  Date: {}", format_date(prize.draw_time));
    println!("  Numbers: {}", prize.combo);
}

pub fn display_overview(
    dataset: &Dataset,
    prizes: &PrizeSummary,
    duplicates: &[(Combo, Vec<i64>)],
) {
    println!("Total drawings: {}", dataset.len());
    if dataset.skipped() > 0 {
        println!("Skipped records: {} (invalid winning numbers)", dataset.skipped());
    }
    println!("Earliest drawing: {}", format_date(dataset.earliest().draw_time));
    println!("Latest drawing: {}", format_date(dataset.latest().draw_time));
    println!("5/5 winners: {}", prizes.winners);

    if duplicates.is_empty() {
        println!("\nDuplicate combinations: none");
    } else {
        println!("\nDuplicate combinations: {}", duplicates.len());
        for (combo, times) in duplicates {
            println!("  {combo}");
            for t in times {
                println!("    - {}", narrative_date(*t));
            }
        }
    }

    if let Some(biggest) = &prizes.biggest {
        print_prize("Biggest prize", biggest);
    }
    if let Some(smallest) = &prizes.smallest {
        print_prize("Smallest prize", smallest);
    }
    if let Some(freq) = &prizes.frequency {
        println!("\nJackpot win frequency:");
        println!("  Average days between: {:.1} days", freq.avg_days_between);
        println!("  Longest gap: {} days", freq.longest_gap_days);
        println!("  Days since last win: {} days", freq.days_since_last);
    }
}

fn number_table(title: &str, ranked: &[NumberCount]) {
    if ranked.is_empty() {
        return;
    }
    println!("\n{title}:");
    let mut table = new_table(vec!["#", "Number", "Times"]);
    for (i, nc) in ranked.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{:02}", nc.number),
            nc.count.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_frequencies(freq: &FrequencyAnalysis) {
    println!("\nMost common by position:");
    let mut table = new_table(vec!["Position", "Number", "Times"]);
    for (name, positional) in POSITION_NAMES.iter().zip(&freq.positional) {
        if let Some(nc) = positional.most_common() {
            table.add_row(vec![
                name.to_string(),
                format!("{:02}", nc.number),
                nc.count.to_string(),
            ]);
        }
    }
    println!("{table}");

    number_table("Most frequently drawn (all positions)", &freq.overall.top_n(5));
    number_table("Least frequently drawn (all positions)", &freq.overall.bottom_n(5));
    if let Some(hot) = freq.window(30) {
        number_table("Hot numbers (last 30 days)", &hot.table.top_n(5));
    }
    if let Some(cold) = freq.window(90) {
        number_table("Cold numbers (last 90 days)", &cold.table.bottom_n(5));
    }

    let pairs = freq.top_pairs(5);
    if !pairs.is_empty() {
        println!("\nMost common number pairs:");
        let mut table = new_table(vec!["#", "Pair", "Times"]);
        for (i, pc) in pairs.iter().enumerate() {
            table.add_row(vec![
                (i + 1).to_string(),
                format!("{:02}-{:02}", pc.pair.0, pc.pair.1),
                pc.count.to_string(),
            ]);
        }
        println!("{table}");
    }
}

fn verdict_cell(test: &ChiSquaredTest) -> Cell {
    let color = if test.is_uniform() { Color::Green } else { Color::Yellow };
    Cell::new(test.verdict.to_string()).fg(color)
}

pub fn display_uniformity(report: &UniformityReport) {
    println!("\nχ² uniformity analysis:");
    println!("  χ² statistic: {:.2}", report.overall.statistic);
    println!("  Degrees of freedom: {} (45 numbers - 1)", report.overall.critical.df);
    println!("  Result: {}", report.overall.verdict);

    println!("\nPosition-specific uniformity tests:");
    let mut table = new_table(vec!["Position", "χ²", "Result"]);
    for (name, test) in POSITION_NAMES.iter().zip(&report.positions) {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.2}", test.statistic)),
            verdict_cell(test),
        ]);
    }
    println!("{table}");
    if report.all_positions_uniform() {
        println!("  Overall: all positions show uniform distribution");
    } else {
        println!("  Overall: some positions show non-uniform distribution");
    }

    if !report.yearly.is_empty() {
        println!("\nYear-by-year analysis:");
        let mut table = new_table(vec!["Year", "χ²", "Draws", "Result"]);
        for year in &report.yearly {
            table.add_row(vec![
                Cell::new(year.year),
                Cell::new(format!("{:.2}", year.test.statistic)),
                Cell::new(year.draws),
                verdict_cell(&year.test),
            ]);
        }
        println!("{table}");
    }

    let c = &report.consecutive;
    println!("\nSequential pair uniformity:");
    println!(
        "  Consecutive pairs: {} of {} ({:.2}%)",
        c.consecutive,
        c.pairs,
        c.actual_rate * 100.0
    );
    println!("  Expected rate: {:.2}%", c.expected_rate * 100.0);
    if c.within_range() {
        println!("  Assessment: within expected range ({:+.1}%)", c.deviation_pct);
    } else {
        println!("  Assessment: outside expected range ({:+.1}%)", c.deviation_pct);
    }

    let lh = &report.low_high;
    println!("\nLow vs high number distribution:");
    println!("  Low (1-22): {} (expected {:.1})", lh.low, lh.expected_low);
    println!("  High (23-45): {} (expected {:.1})", lh.high, lh.expected_high);
    println!(
        "  χ² statistic: {:.2} (df=1, critical {:.2})",
        lh.test.statistic, lh.test.critical.p05
    );
    if lh.test.is_uniform() {
        println!("  Result: balanced distribution");
    } else {
        println!("  Result: imbalanced distribution");
    }

    println!("\nAnalysis summary:");
    match report.issues() {
        0 => println!("  All tests passed, the lottery appears statistically fair"),
        n => println!("  {n} potential issues detected, review individual tests"),
    }
}

pub fn display_repeat(estimate: &RepeatEstimate) {
    println!("\nRepeat probability estimate:");
    println!("  Historical combinations: {} unique sets", estimate.historical);
    println!("  Total possible combos: {}", format_count(estimate.total));
    println!("  Coverage: {:.4}%", estimate.coverage_pct());
    let mut table = new_table(vec!["Horizon", "P(repeat)"]);
    for h in &estimate.horizons {
        table.add_row(vec![
            format!("next {} draws", format_count(h.draws)),
            format!("{:.2}%", h.probability * 100.0),
        ]);
    }
    println!("{table}");
}

pub fn display_distance(
    history_len: usize,
    stats: &DistanceStats,
    best: Option<(Combo, u32)>,
    recent: &[ValidDraw],
) {
    println!("\nCombinatorial distance scoring:");
    println!("  Distance metric: Hamming distance (non-matching numbers)");
    println!("  Historical combinations analyzed: {history_len}");

    println!(
        "\n  Random combination distance statistics ({} samples):",
        format_count(stats.samples as u64)
    );
    println!(
        "    Average min distance: {:.2} numbers different",
        numbers_different(stats.avg_min_distance)
    );
    println!(
        "    Average mean distance: {:.2} numbers different",
        numbers_different(stats.avg_mean_distance)
    );
    println!(
        "    Best min distance found: {:.0} numbers different",
        numbers_different(stats.best_min_distance as f64)
    );

    let Some((combo, score)) = best else {
        return;
    };
    let differ = numbers_different(score as f64);
    println!("\n  Maximum distance combination found:");
    println!("    Numbers: {combo}");
    println!("    Min distance to history: {differ:.0} numbers different");
    println!("    At least {differ:.0}/5 numbers differ from every historical draw");

    if !recent.is_empty() {
        println!("\n  Distance examples (from max-distance combo):");
        for draw in recent {
            println!(
                "    vs {} draw: {}/5 numbers different",
                format_date(draw.draw_time),
                5 - combo.matches(&draw.combo)
            );
        }
    }
}

pub fn display_annealing(
    outcome: &AnnealingOutcome,
    params: &AnnealingParams,
    random_best: Option<u32>,
) {
    let half = |s: u32| numbers_different(s as f64);
    println!("\nSimulated annealing search:");
    println!("  Objective: maximize minimum distance to historical draws");
    println!("  Iterations: {}", format_count(params.iterations as u64));
    println!("  Initial temperature: {:.1}", params.initial_temperature);
    println!("  Cooling rate: {}", params.cooling_rate);

    println!("\n  Optimization results:");
    println!("    Starting score: {:.2}", half(outcome.initial_score));
    println!("    Final score: {:.2}", half(outcome.final_score));
    println!("    Best score found: {:.2}", half(outcome.best_score));
    println!("    Improvement: {:+.2}", outcome.improvement() as f64 / 2.0);
    println!(
        "    Accepted moves: {} of {} ({:.1}%)",
        outcome.accepted_moves,
        outcome.total_moves,
        outcome.acceptance_rate() * 100.0
    );
    println!("\n  Optimal combination found: {}", outcome.best);

    if let Some(random) = random_best {
        println!("\n  Method comparison:");
        println!("    Random search best: {:.0}", half(random));
        println!("    Annealing best: {:.0}", half(outcome.best_score));
        let winner = match outcome.best_score.cmp(&random) {
            std::cmp::Ordering::Greater => "Simulated annealing",
            std::cmp::Ordering::Less => "Random search",
            std::cmp::Ordering::Equal => "Tie (both found same score)",
        };
        println!("    Winner: {winner}");
    }
}

pub fn display_odds(rows: &[OddsRow], jackpot_dollars: Option<i64>) {
    println!(
        "NJ Cash 5 odds table. Total possible combinations: {} (C(45,5))",
        format_count(TOTAL_COMBINATIONS)
    );
    let jackpot = jackpot_dollars.filter(|&j| j > 0);
    if let Some(j) = jackpot {
        println!("Current jackpot: {}", format_currency(j));
    }

    let mut header = vec!["Combos", "Cost", "Odds", "Probability"];
    if jackpot.is_some() {
        header.push("EV");
    }
    let mut table = new_table(header);
    for row in rows {
        let mut cells = vec![
            Cell::new(row.combos),
            Cell::new(format_currency(row.cost_dollars as i64)),
            Cell::new(format!("1 in {}", format_count(row.one_in))),
            Cell::new(format_probability(row.probability * 100.0)),
        ];
        if let Some(ev) = row.expected_value {
            let color = if ev >= 0.0 { Color::Green } else { Color::Red };
            cells.push(Cell::new(format_ev(ev)).fg(color));
        }
        table.add_row(cells);
    }
    println!("{table}");
}

pub fn display_debug(date: &str, records: &[&DrawRecord]) {
    if records.is_empty() {
        println!("No draws found for {date}");
        return;
    }
    for d in records {
        println!("Draw for {date}:");
        println!("ID: {}", d.id);
        println!("GameName: {}", d.game_name);
        println!("Status: {}", d.status);
        println!("DrawTime: {}", d.draw_time);
        println!(
            "EstimatedJackpot: {} (= {})",
            d.estimated_jackpot,
            format_cents(d.estimated_jackpot)
        );
        println!("Jackpot: {}", d.jackpot);
        println!("ActualPayout: {}", d.actual_payout);
        match d.combo() {
            Ok(combo) => println!("Winning numbers: {combo}"),
            Err(e) => println!("Winning numbers: invalid ({e:#})"),
        }

        println!("\nResults (count: {}):", d.results.len());
        for (i, r) in d.results.iter().enumerate() {
            println!("  [{i}] DrawType: {}", r.draw_type);
            println!("      Primary: {:?}", r.primary);
            println!("      PrimaryRevealOrder: {:?}", r.primary_reveal_order);
            println!("      Winners: {}", r.winners);
            println!("      Payout: {}", r.payout);
            println!("      PrizeAmount: {}", r.prize_amount);
        }

        println!("\nPrizeTiers (count: {}):", d.prize_tiers.len());
        if d.prize_tiers.is_empty() {
            println!("  (empty)");
        }
        for (i, pt) in d.prize_tiers.iter().enumerate() {
            println!(
                "  [{i}] Tier: {}, Match: {}, Winners: {}",
                pt.tier, pt.match_label, pt.winners
            );
            println!("      PrizeAmount: {}, Prize: {}", pt.prize_amount, pt.prize);
            println!("      ShareCount: {}, ShareAmount: {}", pt.share_count, pt.share_amount);
            println!("      Description: {}", pt.description);
        }

        println!("\nPrizes (count: {}):", d.prizes.len());
        if d.prizes.is_empty() {
            println!("  (empty)");
        }
        for (i, p) in d.prizes.iter().enumerate() {
            println!("  [{i}] Level: {}, Winners: {}, Amount: {}", p.level, p.winners, p.amount);
            println!("      Description: {}", p.description);
        }

        println!("\n5/5 payout resolved: {}", format_cents(d.payout_cents()));
        println!();
    }
}
