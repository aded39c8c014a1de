use rand::{Rng, RngExt};

use cash5_db::models::{Combo, PICK_COUNT, POOL_SIZE};

use crate::distance::{min_distance_to_history, random_combo};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingParams {
    pub iterations: usize,
    pub initial_temperature: f64,
    /// Multiplier applied to the temperature after every move.
    pub cooling_rate: f64,
}

impl Default for AnnealingParams {
    fn default() -> Self {
        Self {
            iterations: 5000,
            initial_temperature: 100.0,
            cooling_rate: 0.95,
        }
    }
}

impl AnnealingParams {
    /// Shorter schedule used when several restarts are combined.
    pub fn quick() -> Self {
        Self {
            iterations: 1000,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnealingOutcome {
    pub best: Combo,
    pub best_score: u32,
    pub initial_score: u32,
    pub final_score: u32,
    pub accepted_moves: usize,
    pub total_moves: usize,
    /// Best score after each move.
    pub best_trace: Vec<u32>,
}

impl AnnealingOutcome {
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_moves == 0 {
            return 0.0;
        }
        self.accepted_moves as f64 / self.total_moves as f64
    }

    pub fn improvement(&self) -> i64 {
        self.best_score as i64 - self.initial_score as i64
    }
}

struct SearchState {
    current: Combo,
    current_score: u32,
    best: Combo,
    best_score: u32,
}

/// Swap one randomly chosen position for a number not already in the combo.
fn neighbor<R: Rng + ?Sized>(combo: &Combo, rng: &mut R) -> Combo {
    let mut numbers = *combo.numbers();
    let pos = rng.random_range(0..PICK_COUNT);
    loop {
        let n = rng.random_range(1..=POOL_SIZE);
        if !combo.contains(n) {
            numbers[pos] = n;
            break;
        }
    }
    numbers.sort_unstable();
    Combo::from_sorted_unchecked(numbers)
}

/// Probability of moving to a neighbour whose score differs by `delta`.
fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta >= 0.0 {
        1.0
    } else if temperature <= 0.0 {
        0.0
    } else {
        (delta / temperature).exp()
    }
}

/// Maximise min distance to history by simulated annealing.
pub fn simulated_annealing<R: Rng + ?Sized>(
    history: &[Combo],
    params: &AnnealingParams,
    rng: &mut R,
) -> AnnealingOutcome {
    let start = random_combo(rng);
    let start_score = min_distance_to_history(&start, history);
    let mut state = SearchState {
        current: start,
        current_score: start_score,
        best: start,
        best_score: start_score,
    };

    let mut temperature = params.initial_temperature;
    let mut accepted = 0;
    let mut trace = Vec::with_capacity(params.iterations);

    for _ in 0..params.iterations {
        let candidate = neighbor(&state.current, rng);
        let score = min_distance_to_history(&candidate, history);
        let delta = score as f64 - state.current_score as f64;

        if rng.random::<f64>() < acceptance_probability(delta, temperature) {
            state.current = candidate;
            state.current_score = score;
            accepted += 1;
            if score > state.best_score {
                state.best = candidate;
                state.best_score = score;
            }
        }

        trace.push(state.best_score);
        temperature *= params.cooling_rate;
    }

    log::debug!(
        "Annealing: start {} best {} ({}/{} accepted)",
        start_score,
        state.best_score,
        accepted,
        params.iterations
    );

    AnnealingOutcome {
        best: state.best,
        best_score: state.best_score,
        initial_score: start_score,
        final_score: state.current_score,
        accepted_moves: accepted,
        total_moves: params.iterations,
        best_trace: trace,
    }
}

/// Independent restarts; the first run reaching the highest score wins.
pub fn best_of_runs<R: Rng + ?Sized>(
    history: &[Combo],
    runs: usize,
    params: &AnnealingParams,
    rng: &mut R,
) -> Option<AnnealingOutcome> {
    let mut best: Option<AnnealingOutcome> = None;
    for _ in 0..runs {
        let outcome = simulated_annealing(history, params, rng);
        if best.as_ref().map_or(true, |b| outcome.best_score > b.best_score) {
            best = Some(outcome);
        }
    }
    best
}
