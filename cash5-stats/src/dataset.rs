use cash5_db::archive::merge_draws;
use cash5_db::models::{Combo, DrawRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no draws found ({skipped} records without valid winning numbers)")]
    NoValidDraws { skipped: usize },
}

/// A draw whose winning numbers passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraw {
    pub id: String,
    pub draw_time: i64,
    pub combo: Combo,
    /// Numbers in the order they were drawn.
    pub drawn: [u8; 5],
    pub payout_cents: i64,
    pub estimated_jackpot_cents: i64,
}

/// The analysable subset of the archive: unique by id, sorted ascending by
/// draw time, malformed records excluded.
#[derive(Debug, Clone)]
pub struct Dataset {
    draws: Vec<ValidDraw>,
    skipped: usize,
}

impl Dataset {
    pub fn from_records(records: &[DrawRecord]) -> Result<Self, AnalysisError> {
        let unique = merge_draws(&[], records);
        let mut draws = Vec::with_capacity(unique.len());
        let mut skipped = 0;

        for record in &unique {
            match (record.primary_numbers(), record.combo()) {
                (Ok(drawn), Ok(combo)) => draws.push(ValidDraw {
                    id: record.id.clone(),
                    draw_time: record.draw_time,
                    combo,
                    drawn,
                    payout_cents: record.payout_cents(),
                    estimated_jackpot_cents: record.estimated_jackpot,
                }),
                (_, Err(e)) | (Err(e), _) => {
                    log::warn!("Skipping draw {}: {:#}", record.id, e);
                    skipped += 1;
                }
            }
        }

        if draws.is_empty() {
            return Err(AnalysisError::NoValidDraws { skipped });
        }
        Ok(Self { draws, skipped })
    }

    pub fn draws(&self) -> &[ValidDraw] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Records excluded for malformed winning numbers.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn earliest(&self) -> &ValidDraw {
        &self.draws[0]
    }

    pub fn latest(&self) -> &ValidDraw {
        &self.draws[self.draws.len() - 1]
    }

    pub fn combos(&self) -> Vec<Combo> {
        self.draws.iter().map(|d| d.combo).collect()
    }
}

#[cfg(test)]
pub(crate) fn make_test_dataset(draws: &[(i64, [u8; 5])]) -> Dataset {
    let records: Vec<DrawRecord> = draws
        .iter()
        .enumerate()
        .map(|(i, (t, nums))| cash5_db::models::make_test_draw(&format!("{:04}", i), *t, *nums))
        .collect();
    Dataset::from_records(&records).unwrap()
}
