use rand::{Rng, RngExt};

use cash5_db::models::{Combo, PICK_COUNT, POOL_SIZE};

/// Distance between two disjoint combinations.
pub const MAX_DISTANCE: u32 = (2 * PICK_COUNT) as u32;

/// Symmetric difference size of two sorted sets of distinct numbers:
/// `|a| + |b| - 2·|a ∩ b|`.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    let mut matches = 0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                matches += 1;
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    (a.len() + b.len() - 2 * matches) as u32
}

/// Half-scale reading of a distance: how many of the five numbers differ.
pub fn numbers_different(distance: f64) -> f64 {
    distance / 2.0
}

/// Worst-case closeness of `combo` to anything ever drawn. Higher is more novel.
///
/// An empty history is infinitely far away, reported as [`MAX_DISTANCE`].
pub fn min_distance_to_history(combo: &Combo, history: &[Combo]) -> u32 {
    history
        .iter()
        .map(|h| hamming_distance(combo.numbers(), h.numbers()))
        .min()
        .unwrap_or(MAX_DISTANCE)
}

pub fn mean_distance_to_history(combo: &Combo, history: &[Combo]) -> f64 {
    if history.is_empty() {
        return MAX_DISTANCE as f64;
    }
    let total: u64 = history
        .iter()
        .map(|h| hamming_distance(combo.numbers(), h.numbers()) as u64)
        .sum();
    total as f64 / history.len() as f64
}

/// Uniform 5-of-45 draw without replacement.
pub fn random_combo<R: Rng + ?Sized>(rng: &mut R) -> Combo {
    let mut numbers = [0u8; PICK_COUNT];
    let mut filled = 0;
    while filled < PICK_COUNT {
        let n = rng.random_range(1..=POOL_SIZE);
        if !numbers[..filled].contains(&n) {
            numbers[filled] = n;
            filled += 1;
        }
    }
    numbers.sort_unstable();
    Combo::from_sorted_unchecked(numbers)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceStats {
    pub samples: usize,
    pub avg_min_distance: f64,
    pub avg_mean_distance: f64,
    pub best_min_distance: u32,
}

/// Baseline: distances of `samples` random combinations to the history.
pub fn sample_distance_stats<R: Rng + ?Sized>(
    history: &[Combo],
    samples: usize,
    rng: &mut R,
) -> DistanceStats {
    let mut sum_min = 0.0;
    let mut sum_mean = 0.0;
    let mut best_min = 0;

    for _ in 0..samples {
        let combo = random_combo(rng);
        let min = min_distance_to_history(&combo, history);
        sum_min += min as f64;
        sum_mean += mean_distance_to_history(&combo, history);
        best_min = best_min.max(min);
    }

    let n = samples.max(1) as f64;
    DistanceStats {
        samples,
        avg_min_distance: sum_min / n,
        avg_mean_distance: sum_mean / n,
        best_min_distance: best_min,
    }
}

/// Best of `samples` random combinations by min distance to history.
pub fn random_search<R: Rng + ?Sized>(
    history: &[Combo],
    samples: usize,
    rng: &mut R,
) -> Option<(Combo, u32)> {
    let mut best: Option<(Combo, u32)> = None;
    for _ in 0..samples {
        let combo = random_combo(rng);
        let score = min_distance_to_history(&combo, history);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((combo, score));
        }
    }
    best
}
