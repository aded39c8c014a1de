use cash5_db::models::TOTAL_COMBINATIONS;

/// Future draw counts the repeat probability is projected over.
pub const HORIZONS: [u64; 4] = [30, 90, 365, 3650];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonProbability {
    pub draws: u64,
    pub probability: f64,
}

/// Chance that a future draw reproduces an already-drawn combination.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatEstimate {
    pub historical: u64,
    pub total: u64,
    pub per_draw: f64,
    pub horizons: Vec<HorizonProbability>,
}

impl RepeatEstimate {
    pub fn coverage_pct(&self) -> f64 {
        self.per_draw * 100.0
    }
}

/// `1 - (1 - p)^n`, stable for tiny `p`.
pub fn repeat_probability(per_draw: f64, draws: u64) -> f64 {
    if per_draw <= 0.0 {
        return 0.0;
    }
    if per_draw >= 1.0 {
        return if draws == 0 { 0.0 } else { 1.0 };
    }
    -(draws as f64 * (-per_draw).ln_1p()).exp_m1()
}

/// `historical` unique combinations out of `total` possible.
pub fn estimate_repeat_probability(historical: u64, total: u64) -> RepeatEstimate {
    let historical = historical.min(total);
    let per_draw = if total == 0 { 0.0 } else { historical as f64 / total as f64 };
    RepeatEstimate {
        historical,
        total,
        per_draw,
        horizons: HORIZONS
            .iter()
            .map(|&draws| HorizonProbability {
                draws,
                probability: repeat_probability(per_draw, draws),
            })
            .collect(),
    }
}

pub fn estimate_for_cash5(unique_combos: usize) -> RepeatEstimate {
    estimate_repeat_probability(unique_combos as u64, TOTAL_COMBINATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_never_repeats() {
        let est = estimate_for_cash5(0);
        assert_eq!(est.per_draw, 0.0);
        assert!(est.horizons.iter().all(|h| h.probability == 0.0));
    }

    #[test]
    fn test_full_coverage_always_repeats() {
        let est = estimate_repeat_probability(TOTAL_COMBINATIONS, TOTAL_COMBINATIONS);
        assert_eq!(est.per_draw, 1.0);
        assert!(est.horizons.iter().all(|h| h.probability == 1.0));
        assert_eq!(est.coverage_pct(), 100.0);
    }

    #[test]
    fn test_history_clamped_to_total() {
        let est = estimate_repeat_probability(50, 10);
        assert_eq!(est.historical, 10);
        assert_eq!(est.per_draw, 1.0);
    }

    #[test]
    fn test_matches_direct_formula() {
        let est = estimate_for_cash5(3000);
        let p = 3000.0 / TOTAL_COMBINATIONS as f64;
        for h in &est.horizons {
            let direct = 1.0 - (1.0 - p).powf(h.draws as f64);
            assert!((h.probability - direct).abs() < 1e-9, "{} draws", h.draws);
        }
        assert_eq!(est.horizons.iter().map(|h| h.draws).collect::<Vec<_>>(), HORIZONS);
        assert!(est.horizons.windows(2).all(|w| w[0].probability < w[1].probability));
    }

    #[test]
    fn test_zero_draws() {
        assert_eq!(repeat_probability(0.5, 0), 0.0);
    }
}
