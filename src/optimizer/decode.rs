use crate::grid::Coord;
use itertools::Itertools;

/// Slot order for a sample vector: indices sorted by ascending `|v_i|`.
///
/// The sort is stable, so components with equal magnitude keep the lower
/// original index first.
pub fn argsort_abs(sample: &[f64]) -> Vec<usize> {
    sample
        .iter()
        .enumerate()
        .sorted_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
        .map(|(i, _)| i)
        .collect()
}

/// Reorders `goals` by the order statistics of `|sample|`.
///
/// Position `k` of the result is `goals[argsort_abs(sample)[k]]`, i.e. agent
/// `k` receives that goal. Any vector of length `goals.len()` decodes to a
/// bijection onto the goal set.
pub fn decode(sample: &[f64], goals: &[Coord]) -> Vec<Coord> {
    debug_assert_eq!(sample.len(), goals.len());
    argsort_abs(sample).into_iter().map(|i| goals[i]).collect()
}
