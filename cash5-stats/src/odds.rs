use cash5_db::models::TOTAL_COMBINATIONS;

pub const TICKET_COST_DOLLARS: u64 = 2;
pub const DEFAULT_ODDS_ROWS: u64 = 30;

/// Odds of hitting the jackpot when playing `combos` distinct combinations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OddsRow {
    pub combos: u64,
    pub cost_dollars: u64,
    /// Ceiling of `C / combos`.
    pub one_in: u64,
    pub probability: f64,
    pub expected_value: Option<f64>,
}

pub fn odds_row(combos: u64, jackpot_dollars: Option<i64>) -> OddsRow {
    let cost = combos * TICKET_COST_DOLLARS;
    let probability = combos as f64 / TOTAL_COMBINATIONS as f64;
    OddsRow {
        combos,
        cost_dollars: cost,
        one_in: TOTAL_COMBINATIONS.div_ceil(combos.max(1)),
        probability,
        expected_value: jackpot_dollars
            .filter(|&j| j > 0)
            .map(|j| probability * j as f64 - cost as f64),
    }
}

/// Rows for 1..=max combinations, capped at the size of the game.
pub fn odds_table(max: u64, jackpot_dollars: Option<i64>) -> Vec<OddsRow> {
    (1..=max.min(TOTAL_COMBINATIONS))
        .map(|n| odds_row(n, jackpot_dollars))
        .collect()
}
