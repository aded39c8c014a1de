use std::collections::BTreeMap;

use cash5_db::models::{PICK_COUNT, POOL_SIZE};

use crate::{Dataset, MILLIS_PER_DAY};

/// Trailing windows, in days before the newest draw, used for hot/cold ranking.
pub const RECENT_WINDOWS: [i64; 3] = [30, 60, 90];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberCount {
    pub number: u8,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairCount {
    pub pair: (u8, u8),
    pub count: u32,
}

/// Occurrence counts for numbers 1..=45.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: Vec<u32>,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            counts: vec![0; POOL_SIZE as usize],
        }
    }

    /// Numbers outside 1..=45 are ignored.
    pub fn record(&mut self, number: u8) {
        if let Some(slot) = number
            .checked_sub(1)
            .and_then(|idx| self.counts.get_mut(idx as usize))
        {
            *slot += 1;
        }
    }

    pub fn count(&self, number: u8) -> u32 {
        number
            .checked_sub(1)
            .and_then(|idx| self.counts.get(idx as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Counts indexed by `number - 1`.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    fn observed(&self) -> Vec<NumberCount> {
        (1..=POOL_SIZE)
            .map(|n| NumberCount {
                number: n,
                count: self.count(n),
            })
            .filter(|nc| nc.count > 0)
            .collect()
    }

    /// Observed numbers, highest count first, ties by ascending number.
    pub fn ranked_desc(&self) -> Vec<NumberCount> {
        let mut ranked = self.observed();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
        ranked
    }

    /// Observed numbers, lowest count first, ties by ascending number.
    pub fn ranked_asc(&self) -> Vec<NumberCount> {
        let mut ranked = self.observed();
        ranked.sort_by(|a, b| a.count.cmp(&b.count).then(a.number.cmp(&b.number)));
        ranked
    }

    pub fn most_common(&self) -> Option<NumberCount> {
        self.ranked_desc().into_iter().next()
    }

    pub fn least_common(&self) -> Option<NumberCount> {
        self.ranked_asc().into_iter().next()
    }

    pub fn top_n(&self, n: usize) -> Vec<NumberCount> {
        self.ranked_desc().into_iter().take(n).collect()
    }

    pub fn bottom_n(&self, n: usize) -> Vec<NumberCount> {
        self.ranked_asc().into_iter().take(n).collect()
    }
}

#[derive(Debug, Clone)]
pub struct WindowFrequency {
    pub days: i64,
    pub draws: usize,
    pub table: FrequencyTable,
}

#[derive(Debug, Clone)]
pub struct FrequencyAnalysis {
    pub draws: usize,
    pub overall: FrequencyTable,
    /// One table per sorted position.
    pub positional: Vec<FrequencyTable>,
    pub pairs: BTreeMap<(u8, u8), u32>,
    pub recent: Vec<WindowFrequency>,
}

impl FrequencyAnalysis {
    pub fn window(&self, days: i64) -> Option<&WindowFrequency> {
        self.recent.iter().find(|w| w.days == days)
    }

    pub fn top_pairs(&self, n: usize) -> Vec<PairCount> {
        let mut pairs: Vec<PairCount> = self
            .pairs
            .iter()
            .map(|(&pair, &count)| PairCount { pair, count })
            .collect();
        pairs.sort_by(|a, b| b.count.cmp(&a.count).then(a.pair.cmp(&b.pair)));
        pairs.truncate(n);
        pairs
    }
}

pub fn analyze_frequencies(dataset: &Dataset) -> FrequencyAnalysis {
    let mut overall = FrequencyTable::new();
    let mut positional = vec![FrequencyTable::new(); PICK_COUNT];
    let mut pairs: BTreeMap<(u8, u8), u32> = BTreeMap::new();

    let newest = dataset.latest().draw_time;
    let mut recent: Vec<WindowFrequency> = RECENT_WINDOWS
        .iter()
        .map(|&days| WindowFrequency {
            days,
            draws: 0,
            table: FrequencyTable::new(),
        })
        .collect();

    for draw in dataset.draws() {
        let nums = draw.combo.numbers();
        for (pos, &n) in nums.iter().enumerate() {
            positional[pos].record(n);
            overall.record(n);
        }
        for j in 0..nums.len() {
            for k in (j + 1)..nums.len() {
                *pairs.entry((nums[j], nums[k])).or_insert(0) += 1;
            }
        }
        for window in &mut recent {
            if draw.draw_time > newest - window.days * MILLIS_PER_DAY {
                window.draws += 1;
                for &n in nums {
                    window.table.record(n);
                }
            }
        }
    }

    FrequencyAnalysis {
        draws: dataset.len(),
        overall,
        positional,
        pairs,
        recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::make_test_dataset;

    const DAY: i64 = MILLIS_PER_DAY;

    #[test]
    fn test_record_ignores_out_of_range() {
        let mut table = FrequencyTable::new();
        table.record(0);
        table.record(46);
        table.record(u8::MAX);
        assert!(table.is_empty());
        table.record(1);
        table.record(45);
        assert_eq!(table.count(1), 1);
        assert_eq!(table.count(45), 1);
        assert_eq!(table.count(0), 0);
        assert_eq!(table.total(), 2);
    }

    fn seven_every_draw() -> Vec<(i64, [u8; 5])> {
        // 7 in every draw, forty other numbers appear exactly once.
        let others: Vec<u8> = (1..=45).filter(|&n| n != 7).take(40).collect();
        others
            .chunks(4)
            .enumerate()
            .map(|(i, c)| (i as i64 * DAY, [7, c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_single_repeating_number() {
        let dataset = make_test_dataset(&seven_every_draw());
        let freq = analyze_frequencies(&dataset);
        assert_eq!(freq.overall.count(7), 10);
        let top = freq.overall.most_common().unwrap();
        assert_eq!((top.number, top.count), (7, 10));
        assert_eq!(freq.overall.total(), 50);
    }

    #[test]
    fn test_positional_tables_use_sorted_numbers() {
        let dataset = make_test_dataset(&[(0, [40, 3, 22, 9, 15])]);
        let freq = analyze_frequencies(&dataset);
        assert_eq!(freq.positional[0].count(3), 1);
        assert_eq!(freq.positional[2].count(15), 1);
        assert_eq!(freq.positional[4].count(40), 1);
    }

    #[test]
    fn test_top_n_tie_break_ascending() {
        let mut table = FrequencyTable::new();
        for n in [9, 4, 4, 9, 30, 2] {
            table.record(n);
        }
        let top = table.top_n(3);
        assert_eq!(
            top,
            vec![
                NumberCount {
                    number: 4,
                    count: 2,
                },
                NumberCount {
                    number: 9,
                    count: 2,
                },
                NumberCount {
                    number: 2,
                    count: 1,
                },
            ]
        );
        let bottom = table.bottom_n(2);
        assert_eq!(bottom[0].number, 2);
        assert_eq!(bottom[1].number, 30);
    }

    #[test]
    fn test_empty_table_rankings() {
        let table = FrequencyTable::new();
        assert!(table.is_empty());
        assert_eq!(table.most_common(), None);
        assert_eq!(table.least_common(), None);
        assert!(table.top_n(5).is_empty());
        assert_eq!(table.count(0), 0);
        assert_eq!(table.count(46), 0);
    }

    #[test]
    fn test_pairs_counted_once_per_draw() {
        let dataset = make_test_dataset(&[(0, [1, 2, 3, 4, 5]), (DAY, [1, 2, 10, 11, 12])]);
        let freq = analyze_frequencies(&dataset);
        assert_eq!(freq.pairs.len(), 19);
        assert_eq!(freq.pairs[&(1, 2)], 2);
        let pairs = freq.top_pairs(1);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].pair, pairs[0].count), ((1, 2), 2));
    }

    #[test]
    fn test_recent_windows_relative_to_newest() {
        let dataset = make_test_dataset(&[
            (0, [1, 2, 3, 4, 5]),
            (50 * DAY, [6, 7, 8, 9, 10]),
            (80 * DAY, [11, 12, 13, 14, 15]),
            (100 * DAY, [16, 17, 18, 19, 20]),
        ]);
        let freq = analyze_frequencies(&dataset);
        assert_eq!(freq.window(30).unwrap().draws, 2);
        assert_eq!(freq.window(60).unwrap().draws, 3);
        assert_eq!(freq.window(90).unwrap().draws, 3);
        assert_eq!(freq.window(30).unwrap().table.count(11), 1);
        assert_eq!(freq.window(30).unwrap().table.count(6), 0);
        assert!(freq.window(45).is_none());
    }
}
