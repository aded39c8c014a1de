use cash5_db::models::Combo;

use crate::{Dataset, MILLIS_PER_DAY};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrizeRecord {
    pub draw_time: i64,
    pub combo: Combo,
    pub payout_cents: i64,
}

/// Gaps between consecutive jackpot wins, in whole days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JackpotFrequency {
    pub avg_days_between: f64,
    pub longest_gap_days: i64,
    pub days_since_last: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrizeSummary {
    /// Draws with a positive resolved 5/5 payout.
    pub winners: usize,
    pub biggest: Option<PrizeRecord>,
    pub smallest: Option<PrizeRecord>,
    /// Present once at least two wins are recorded.
    pub frequency: Option<JackpotFrequency>,
}

pub fn summarize_prizes(dataset: &Dataset) -> PrizeSummary {
    let wins: Vec<PrizeRecord> = dataset
        .draws()
        .iter()
        .filter(|d| d.payout_cents > 0)
        .map(|d| PrizeRecord {
            draw_time: d.draw_time,
            combo: d.combo,
            payout_cents: d.payout_cents,
        })
        .collect();

    // First draw wins ties on both ends.
    let mut biggest: Option<PrizeRecord> = None;
    let mut smallest: Option<PrizeRecord> = None;
    for win in &wins {
        if biggest.map_or(true, |b| win.payout_cents > b.payout_cents) {
            biggest = Some(*win);
        }
        if smallest.map_or(true, |s| win.payout_cents < s.payout_cents) {
            smallest = Some(*win);
        }
    }

    let frequency = if wins.len() > 1 {
        let gaps: Vec<i64> = wins
            .windows(2)
            .map(|w| (w[1].draw_time - w[0].draw_time) / MILLIS_PER_DAY)
            .collect();
        let last = wins[wins.len() - 1].draw_time;
        Some(JackpotFrequency {
            avg_days_between: gaps.iter().sum::<i64>() as f64 / gaps.len() as f64,
            longest_gap_days: gaps.iter().copied().max().unwrap_or(0),
            days_since_last: (dataset.latest().draw_time - last) / MILLIS_PER_DAY,
        })
    } else {
        None
    };

    PrizeSummary {
        winners: wins.len(),
        biggest,
        smallest,
        frequency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cash5_db::models::make_test_draw;

    const DAY: i64 = MILLIS_PER_DAY;

    fn dataset_with_payouts(payouts: &[(i64, i64)]) -> Dataset {
        let records: Vec<_> = payouts
            .iter()
            .enumerate()
            .map(|(i, &(t, cents))| {
                let mut d = make_test_draw(&format!("{i}"), t, [1, 2, 3, 4, 5 + i as u8]);
                d.actual_payout = cents;
                d
            })
            .collect();
        Dataset::from_records(&records).unwrap()
    }

    #[test]
    fn test_no_winners() {
        let summary = summarize_prizes(&dataset_with_payouts(&[(0, 0), (DAY, 0)]));
        assert_eq!(summary.winners, 0);
        assert!(summary.biggest.is_none());
        assert!(summary.smallest.is_none());
        assert!(summary.frequency.is_none());
    }

    #[test]
    fn test_biggest_smallest_and_gaps() {
        let summary = summarize_prizes(&dataset_with_payouts(&[
            (0, 50_000_00),
            (3 * DAY, 0),
            (10 * DAY, 120_000_00),
            (12 * DAY, 80_000_00),
            (20 * DAY, 0),
        ]));
        assert_eq!(summary.winners, 3);
        assert_eq!(summary.biggest.unwrap().payout_cents, 120_000_00);
        assert_eq!(summary.biggest.unwrap().draw_time, 10 * DAY);
        assert_eq!(summary.smallest.unwrap().payout_cents, 50_000_00);

        let freq = summary.frequency.unwrap();
        assert_eq!(freq.avg_days_between, 6.0);
        assert_eq!(freq.longest_gap_days, 10);
        assert_eq!(freq.days_since_last, 8);
    }

    #[test]
    fn test_single_winner_has_no_frequency() {
        let summary = summarize_prizes(&dataset_with_payouts(&[(0, 10_00), (DAY, 0)]));
        assert_eq!(summary.winners, 1);
        assert_eq!(summary.biggest, summary.smallest);
        assert!(summary.frequency.is_none());
    }
}
