use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Local};

use cash5_db::models::{PICK_COUNT, POOL_SIZE};

use crate::Dataset;
use crate::frequency::{FrequencyAnalysis, FrequencyTable};

/// Highest number counted as "low" in the low/high split.
pub const LOW_MAX: u8 = 22;
/// Years with fewer draws are not tested.
pub const MIN_DRAWS_PER_YEAR: usize = 30;
/// Chance that two adjacent sorted numbers are consecutive in a random draw.
pub const EXPECTED_CONSECUTIVE_RATE: f64 = 4.0 / 44.0;
/// Consecutive-pair deviations inside ±10% are considered normal.
pub const CONSECUTIVE_TOLERANCE_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
    pub df: u32,
    pub p05: f64,
    pub p01: f64,
}

/// 45 buckets.
pub const DF44: CriticalValues = CriticalValues {
    df: 44,
    p05: 60.48,
    p01: 66.77,
};
/// Two buckets.
pub const DF1: CriticalValues = CriticalValues {
    df: 1,
    p05: 3.84,
    p01: 6.63,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniformity {
    Uniform,
    PossiblyNonUniform,
    NonUniform,
}

impl fmt::Display for Uniformity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uniformity::Uniform => write!(f, "Uniform distribution (p > 0.05)"),
            Uniformity::PossiblyNonUniform => write!(f, "Possibly non-uniform (0.01 < p < 0.05)"),
            Uniformity::NonUniform => write!(f, "Non-uniform distribution (p < 0.01)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquaredTest {
    pub statistic: f64,
    pub observations: u64,
    pub critical: CriticalValues,
    pub verdict: Uniformity,
}

impl ChiSquaredTest {
    pub fn is_uniform(&self) -> bool {
        self.verdict == Uniformity::Uniform
    }
}

/// Σ (observed - expected)² / expected, skipping buckets with no expectation.
pub fn chi_squared(observed: &[u32], expected: &[f64]) -> f64 {
    observed
        .iter()
        .zip(expected)
        .filter(|(_, e)| **e > 0.0)
        .map(|(&o, &e)| {
            let diff = o as f64 - e;
            diff * diff / e
        })
        .sum()
}

/// χ² against an even spread of `total` observations over every bucket.
pub fn chi_squared_uniform(observed: &[u32], total: u64) -> f64 {
    if observed.is_empty() || total == 0 {
        return 0.0;
    }
    let expected = vec![total as f64 / observed.len() as f64; observed.len()];
    chi_squared(observed, &expected)
}

pub fn classify(statistic: f64, critical: CriticalValues) -> Uniformity {
    if statistic < critical.p05 {
        Uniformity::Uniform
    } else if statistic < critical.p01 {
        Uniformity::PossiblyNonUniform
    } else {
        Uniformity::NonUniform
    }
}

pub fn uniformity_test(table: &FrequencyTable, total: u64) -> ChiSquaredTest {
    let statistic = chi_squared_uniform(table.counts(), total);
    ChiSquaredTest {
        statistic,
        observations: total,
        critical: DF44,
        verdict: classify(statistic, DF44),
    }
}

#[derive(Debug, Clone)]
pub struct YearlyTest {
    pub year: i32,
    pub draws: usize,
    pub test: ChiSquaredTest,
}

#[derive(Debug, Clone)]
pub struct LowHighTest {
    pub low: u64,
    pub high: u64,
    pub expected_low: f64,
    pub expected_high: f64,
    pub test: ChiSquaredTest,
}

#[derive(Debug, Clone)]
pub struct ConsecutiveTest {
    pub consecutive: u64,
    pub pairs: u64,
    pub actual_rate: f64,
    pub expected_rate: f64,
    pub deviation_pct: f64,
}

impl ConsecutiveTest {
    pub fn within_range(&self) -> bool {
        self.deviation_pct.abs() < CONSECUTIVE_TOLERANCE_PCT
    }
}

#[derive(Debug, Clone)]
pub struct UniformityReport {
    pub overall: ChiSquaredTest,
    pub positions: Vec<ChiSquaredTest>,
    pub yearly: Vec<YearlyTest>,
    pub low_high: LowHighTest,
    pub consecutive: ConsecutiveTest,
}

impl UniformityReport {
    pub fn all_positions_uniform(&self) -> bool {
        self.positions.iter().all(|t| t.is_uniform())
    }

    /// Count of failed checks among positional uniformity and the low/high split.
    pub fn issues(&self) -> usize {
        let mut issues = 0;
        if !self.all_positions_uniform() {
            issues += 1;
        }
        if !self.low_high.test.is_uniform() {
            issues += 1;
        }
        issues
    }
}

pub fn analyze_uniformity(dataset: &Dataset, freq: &FrequencyAnalysis) -> UniformityReport {
    let draws = dataset.len() as u64;
    let overall = uniformity_test(&freq.overall, draws * PICK_COUNT as u64);
    let positions = freq
        .positional
        .iter()
        .map(|table| uniformity_test(table, draws))
        .collect();

    UniformityReport {
        overall,
        positions,
        yearly: yearly_tests(dataset),
        low_high: low_high_test(&freq.overall),
        consecutive: consecutive_test(dataset),
    }
}

fn local_year(draw_time: i64) -> Option<i32> {
    DateTime::from_timestamp_millis(draw_time).map(|t| t.with_timezone(&Local).year())
}

pub fn yearly_tests(dataset: &Dataset) -> Vec<YearlyTest> {
    let mut by_year: BTreeMap<i32, (usize, FrequencyTable)> = BTreeMap::new();
    for draw in dataset.draws() {
        let Some(year) = local_year(draw.draw_time) else {
            continue;
        };
        let entry = by_year.entry(year).or_insert_with(|| (0, FrequencyTable::new()));
        entry.0 += 1;
        for &n in draw.combo.numbers() {
            entry.1.record(n);
        }
    }

    by_year
        .into_iter()
        .filter(|(_, (count, _))| *count >= MIN_DRAWS_PER_YEAR)
        .map(|(year, (count, table))| YearlyTest {
            year,
            draws: count,
            test: uniformity_test(&table, (count * PICK_COUNT) as u64),
        })
        .collect()
}

pub fn low_high_test(overall: &FrequencyTable) -> LowHighTest {
    let low: u64 = (1..=LOW_MAX).map(|n| overall.count(n) as u64).sum();
    let high: u64 = ((LOW_MAX + 1)..=POOL_SIZE).map(|n| overall.count(n) as u64).sum();
    let total = (low + high) as f64;
    let expected_low = total * LOW_MAX as f64 / POOL_SIZE as f64;
    let expected_high = total * (POOL_SIZE - LOW_MAX) as f64 / POOL_SIZE as f64;

    let statistic = chi_squared(&[low as u32, high as u32], &[expected_low, expected_high]);
    LowHighTest {
        low,
        high,
        expected_low,
        expected_high,
        test: ChiSquaredTest {
            statistic,
            observations: low + high,
            critical: DF1,
            verdict: classify(statistic, DF1),
        },
    }
}

pub fn consecutive_test(dataset: &Dataset) -> ConsecutiveTest {
    let mut consecutive = 0u64;
    let mut pairs = 0u64;
    for draw in dataset.draws() {
        for w in draw.combo.numbers().windows(2) {
            pairs += 1;
            if w[1] == w[0] + 1 {
                consecutive += 1;
            }
        }
    }
    let actual_rate = if pairs > 0 { consecutive as f64 / pairs as f64 } else { 0.0 };
    let deviation_pct =
        (actual_rate - EXPECTED_CONSECUTIVE_RATE) / EXPECTED_CONSECUTIVE_RATE * 100.0;
    ConsecutiveTest {
        consecutive,
        pairs,
        actual_rate,
        expected_rate: EXPECTED_CONSECUTIVE_RATE,
        deviation_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::dataset::make_test_dataset;
    use crate::frequency::analyze_frequencies;

    fn mid_year_millis(year: i32, day: u32) -> i64 {
        Local
            .with_ymd_and_hms(year, 6, 1, 12, 0, 0)
            .single()
            .unwrap()
            .timestamp_millis()
            + day as i64 * crate::MILLIS_PER_DAY
    }

    /// Nine draws covering every number exactly once.
    fn perfectly_even() -> Vec<(i64, [u8; 5])> {
        (0..9u8)
            .map(|i| {
                let b = i * 5 + 1;
                (i as i64 * crate::MILLIS_PER_DAY, [b, b + 1, b + 2, b + 3, b + 4])
            })
            .collect()
    }

    #[test]
    fn test_chi_squared_zero_when_exact() {
        let observed = vec![4u32; 45];
        assert_eq!(chi_squared_uniform(&observed, 180), 0.0);
        assert_eq!(chi_squared(&[3, 7], &[3.0, 7.0]), 0.0);
    }

    #[test]
    fn test_chi_squared_known_value() {
        // expected 5 each: (10-5)²/5 + (0-5)²/5 = 10
        assert!((chi_squared_uniform(&[10, 0], 10) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_chi_squared_no_observations() {
        assert_eq!(chi_squared_uniform(&[0; 45], 0), 0.0);
        assert_eq!(chi_squared_uniform(&[], 10), 0.0);
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(10.0, DF44), Uniformity::Uniform);
        assert_eq!(classify(60.48, DF44), Uniformity::PossiblyNonUniform);
        assert_eq!(classify(66.0, DF44), Uniformity::PossiblyNonUniform);
        assert_eq!(classify(66.77, DF44), Uniformity::NonUniform);
        assert_eq!(classify(3.83, DF1), Uniformity::Uniform);
        assert_eq!(classify(7.0, DF1), Uniformity::NonUniform);
    }

    #[test]
    fn test_even_history_is_uniform() {
        let dataset = make_test_dataset(&perfectly_even());
        let freq = analyze_frequencies(&dataset);
        let report = analyze_uniformity(&dataset, &freq);
        assert_eq!(report.overall.statistic, 0.0);
        assert!(report.overall.is_uniform());
        assert_eq!(report.positions.len(), 5);
        assert_eq!(report.low_high.low, 22);
        assert_eq!(report.low_high.high, 23);
        assert!(report.low_high.test.statistic.abs() < 1e-12);
    }

    #[test]
    fn test_skewed_history_is_not_uniform() {
        let draws: Vec<(i64, [u8; 5])> = (0..40)
            .map(|i| (i * crate::MILLIS_PER_DAY, [1, 2, 3, 4, 5]))
            .collect();
        let dataset = make_test_dataset(&draws);
        let freq = analyze_frequencies(&dataset);
        let report = analyze_uniformity(&dataset, &freq);
        assert_eq!(report.overall.verdict, Uniformity::NonUniform);
        assert!(!report.all_positions_uniform());
        assert_eq!(report.low_high.high, 0);
        assert_eq!(report.issues(), 2);
    }

    #[test]
    fn test_yearly_requires_thirty_draws() {
        let mut draws = Vec::new();
        for d in 0..30 {
            draws.push((mid_year_millis(2020, d), [1, 12, 23, 34, 45]));
        }
        for d in 0..29 {
            draws.push((mid_year_millis(2021, d), [2, 13, 24, 35, 44]));
        }
        let dataset = make_test_dataset(&draws);
        let yearly = yearly_tests(&dataset);
        assert_eq!(yearly.len(), 1);
        assert_eq!(yearly[0].year, 2020);
        assert_eq!(yearly[0].draws, 30);
        assert_eq!(yearly[0].test.observations, 150);
    }

    #[test]
    fn test_consecutive_rate() {
        let dataset = make_test_dataset(&[(0, [1, 2, 3, 10, 20]), (1, [5, 15, 25, 35, 45])]);
        let result = consecutive_test(&dataset);
        assert_eq!(result.pairs, 8);
        assert_eq!(result.consecutive, 2);
        assert!((result.actual_rate - 0.25).abs() < 1e-12);
        assert!(!result.within_range());
    }
}
