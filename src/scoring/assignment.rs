//! Greedy injective assignment of model ligands to reference ligands

use ordered_float::OrderedFloat;

use crate::scoring::ScoreOrder;
use crate::scoring::matrix::ScoreMatrices;

/// Repeatedly pick the best remaining assignable pair
///
/// Ties are broken by the lower reference index, then the lower model index.
/// Yields pairs of (reference index, model index) sorted by reference index.
pub fn greedy(matrices: &ScoreMatrices, order: ScoreOrder, min_coverage: f64) -> Vec<(usize, usize)> {
    let (rows, cols) = matrices.shape();

    let sign = match order {
        ScoreOrder::HigherIsBetter => -1.0,
        ScoreOrder::LowerIsBetter => 1.0
    };
    let mut candidates: Vec<(OrderedFloat<f64>, usize, usize)> = (0..rows)
        .flat_map(|r| (0..cols).map(move |m| (r, m)))
        .filter(|&(r, m)| matrices.is_assignable(r, m, min_coverage))
        .map(|(r, m)| (OrderedFloat(sign * matrices.score[(r, m)]), r, m))
        .collect();
    candidates.sort();

    let mut reference_taken = vec![false; rows];
    let mut model_taken = vec![false; cols];
    let mut assignment = Vec::new();
    for (_, r, m) in candidates {
        if reference_taken[r] || model_taken[m] {
            continue;
        }
        reference_taken[r] = true;
        model_taken[m] = true;
        assignment.push((r, m));
    }

    assignment.sort();
    assignment
}
