use std::fmt;

use rand::Rng;

use cash5_db::models::{Combo, PICK_COUNT, POOL_SIZE};

use crate::Dataset;
use crate::annealing::{AnnealingParams, best_of_runs};
use crate::frequency::{FrequencyAnalysis, FrequencyTable, NumberCount};

/// Independent short annealing runs behind the annealing pick.
pub const ANNEALING_RUNS: usize = 3;
const HOT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    MostCommonByPosition,
    MostFrequentOverall,
    HotNumbers,
    LeastCommonByPosition,
    SimulatedAnnealing,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strategy::MostCommonByPosition => "Most common by position",
            Strategy::MostFrequentOverall => "Most frequent all-time",
            Strategy::HotNumbers => "Hot numbers last 30 days",
            Strategy::LeastCommonByPosition => "Least common by position",
            Strategy::SimulatedAnnealing => "Simulated annealing",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub combo: Combo,
    pub strategy: Strategy,
}

/// One number per sorted position, each the best-ranked one not already taken.
fn positional_pick(
    tables: &[FrequencyTable],
    rank: fn(&FrequencyTable) -> Vec<NumberCount>,
) -> Combo {
    let mut chosen: Vec<u8> = Vec::with_capacity(PICK_COUNT);
    for table in tables.iter().take(PICK_COUNT) {
        let pick = rank(table)
            .into_iter()
            .map(|nc| nc.number)
            .find(|n| !chosen.contains(n))
            .or_else(|| (1..=POOL_SIZE).find(|n| !chosen.contains(n)));
        if let Some(n) = pick {
            chosen.push(n);
        }
    }
    fill_and_sort(chosen)
}

fn top_five(table: &FrequencyTable) -> Option<Combo> {
    let top = table.top_n(PICK_COUNT);
    if top.len() < PICK_COUNT {
        return None;
    }
    Some(fill_and_sort(top.into_iter().map(|nc| nc.number).collect()))
}

fn fill_and_sort(mut numbers: Vec<u8>) -> Combo {
    let mut candidate = 1;
    while numbers.len() < PICK_COUNT && candidate <= POOL_SIZE {
        if !numbers.contains(&candidate) {
            numbers.push(candidate);
        }
        candidate += 1;
    }
    numbers.sort_unstable();
    let mut sorted = [0u8; PICK_COUNT];
    sorted.copy_from_slice(&numbers[..PICK_COUNT]);
    Combo::from_sorted_unchecked(sorted)
}

/// Candidate combinations in strategy order. The overall and hot picks are
/// omitted when fewer than five numbers were observed.
pub fn recommend<R: Rng + ?Sized>(
    dataset: &Dataset,
    freq: &FrequencyAnalysis,
    rng: &mut R,
) -> Vec<Recommendation> {
    let mut recs = vec![Recommendation {
        combo: positional_pick(&freq.positional, FrequencyTable::ranked_desc),
        strategy: Strategy::MostCommonByPosition,
    }];

    if let Some(combo) = top_five(&freq.overall) {
        recs.push(Recommendation {
            combo,
            strategy: Strategy::MostFrequentOverall,
        });
    }

    if let Some(combo) = freq.window(HOT_WINDOW_DAYS).and_then(|w| top_five(&w.table)) {
        recs.push(Recommendation {
            combo,
            strategy: Strategy::HotNumbers,
        });
    }

    recs.push(Recommendation {
        combo: positional_pick(&freq.positional, FrequencyTable::ranked_asc),
        strategy: Strategy::LeastCommonByPosition,
    });

    let history = dataset.combos();
    if let Some(best) = best_of_runs(&history, ANNEALING_RUNS, &AnnealingParams::quick(), rng) {
        recs.push(Recommendation {
            combo: best.best,
            strategy: Strategy::SimulatedAnnealing,
        });
    }

    recs
}
