use std::collections::BTreeMap;

use cash5_db::models::Combo;

use crate::{Dataset, ValidDraw};

pub const MIN_CLOSE_MATCHES: usize = 3;
pub const CLOSE_MATCH_LIMIT: usize = 5;

/// Draw times for every distinct combination, oldest first.
pub fn combo_history(dataset: &Dataset) -> BTreeMap<Combo, Vec<i64>> {
    let mut history: BTreeMap<Combo, Vec<i64>> = BTreeMap::new();
    for draw in dataset.draws() {
        history.entry(draw.combo).or_default().push(draw.draw_time);
    }
    history
}

/// Combinations drawn more than once.
pub fn duplicate_combos(dataset: &Dataset) -> Vec<(Combo, Vec<i64>)> {
    combo_history(dataset)
        .into_iter()
        .filter(|(_, times)| times.len() > 1)
        .collect()
}

/// Other draws with exactly the same combination as `target`.
pub fn prior_occurrences<'a>(dataset: &'a Dataset, target: &ValidDraw) -> Vec<&'a ValidDraw> {
    dataset
        .draws()
        .iter()
        .filter(|d| d.id != target.id && d.combo == target.combo)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseMatch {
    pub draw_time: i64,
    pub combo: Combo,
    pub matches: usize,
}

/// Previous draws sharing at least `min_matches` numbers with `target`,
/// most matches first, then most recent.
pub fn closest_matches(
    dataset: &Dataset,
    target: &ValidDraw,
    min_matches: usize,
    limit: usize,
) -> Vec<CloseMatch> {
    let mut found: Vec<CloseMatch> = dataset
        .draws()
        .iter()
        .filter(|d| d.id != target.id)
        .filter_map(|d| {
            let matches = d.combo.matches(&target.combo);
            (matches >= min_matches).then(|| CloseMatch {
                draw_time: d.draw_time,
                combo: d.combo,
                matches,
            })
        })
        .collect();
    found.sort_by(|a, b| b.matches.cmp(&a.matches).then(b.draw_time.cmp(&a.draw_time)));
    found.truncate(limit);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::make_test_dataset;

    #[test]
    fn test_duplicates_and_prior_occurrences() {
        let dataset = make_test_dataset(&[
            (100, [1, 2, 3, 4, 5]),
            (200, [6, 7, 8, 9, 10]),
            (300, [5, 4, 3, 2, 1]),
        ]);
        let dups = duplicate_combos(&dataset);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].1, vec![100, 300]);

        let prior = prior_occurrences(&dataset, dataset.latest());
        assert_eq!(prior.len(), 1);
        assert_eq!(prior[0].draw_time, 100);
        assert!(prior_occurrences(&dataset, &dataset.draws()[1]).is_empty());
    }

    #[test]
    fn test_closest_matches_order_and_threshold() {
        let dataset = make_test_dataset(&[
            (100, [1, 2, 3, 40, 41]),
            (200, [1, 2, 3, 4, 42]),
            (300, [1, 2, 30, 31, 32]),
            (400, [1, 2, 3, 43, 44]),
            (500, [1, 2, 3, 4, 5]),
        ]);
        let target = dataset.latest();
        let close = closest_matches(&dataset, target, MIN_CLOSE_MATCHES, CLOSE_MATCH_LIMIT);
        let times: Vec<i64> = close.iter().map(|c| c.draw_time).collect();
        assert_eq!(times, vec![200, 400, 100]);
        assert_eq!(close[0].matches, 4);

        let one = closest_matches(&dataset, target, MIN_CLOSE_MATCHES, 1);
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_closest_matches_excludes_target_only() {
        let dataset = make_test_dataset(&[(100, [1, 2, 3, 4, 5]), (200, [1, 2, 3, 4, 5])]);
        let close = closest_matches(
            &dataset,
            dataset.latest(),
            MIN_CLOSE_MATCHES,
            CLOSE_MATCH_LIMIT,
        );
        assert_eq!(close.len(), 1);
        assert_eq!(close[0].matches, 5);
    }
}
