//! Explanations for ligands left without a partner

use std::collections::BTreeMap;

use serde::Serialize;

use crate::scoring::matrix::{meets_coverage, ScoreMatrices};
use crate::scoring::state::PairState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnassignedReason {
    pub key: String,
    pub message: String
}

impl UnassignedReason {
    fn new(key: &str, message: String) -> UnassignedReason {
        UnassignedReason {key: key.to_owned(), message}
    }
}

/// Which ligand set an index refers to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Reference,
    Model
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::Reference => "target",
            Side::Model => "model"
        }
    }

    fn opposite(self) -> Side {
        match self {
            Side::Reference => Side::Model,
            Side::Model => Side::Reference
        }
    }
}

/// Most specific failure state, ties broken by frequency, then by code
fn dominant_failure(states: &[PairState]) -> Option<PairState> {
    let mut counts: BTreeMap<PairState, usize> = BTreeMap::new();
    for state in states.iter().filter(|state| !state.is_valid()) {
        *counts.entry(*state).or_insert(0) += 1;
    }

    counts.into_iter()
        .max_by(|(a, a_count), (b, b_count)| {
            a.specificity().cmp(&b.specificity())
                .then(a_count.cmp(b_count))
                .then(b.code().cmp(&a.code()))
        })
        .map(|(state, _)| state)
}

/// Explain why a ligand was not assigned
///
/// Never fails: indices out of range or already assigned yield a reason too.
pub fn unassigned_reason(
    side: Side,
    index: usize,
    matrices: &ScoreMatrices,
    assignment: &[(usize, usize)],
    min_coverage: f64
) -> UnassignedReason {
    let (rows, cols) = matrices.shape();
    let (own, opposite) = match side {
        Side::Reference => (rows, cols),
        Side::Model => (cols, rows)
    };

    if index >= own {
        return UnassignedReason::new(
            "invalid_index",
            format!("There is no {} ligand with index {}", side.name(), index)
        );
    }

    let is_assigned = assignment.iter().any(|&(r, m)| match side {
        Side::Reference => r == index,
        Side::Model => m == index
    });
    if is_assigned {
        return UnassignedReason::new("assigned", format!("The {} ligand was assigned", side.name()));
    }

    if opposite == 0 {
        return UnassignedReason::new("no_ligand", format!("No ligand in the {}", side.opposite().name()));
    }

    let cell = |other: usize| match side {
        Side::Reference => (index, other),
        Side::Model => (other, index)
    };
    let valid: Vec<(usize, usize)> = (0..opposite)
        .map(cell)
        .filter(|&c| matrices.state[c].is_valid())
        .collect();

    if valid.iter().any(|&c| meets_coverage(matrices.coverage[c], min_coverage)) {
        return UnassignedReason::new(
            "stoichiometry",
            "Ligand was already assigned to another ligand (different stoichiometry)".to_owned()
        );
    }

    if let Some(best) = valid.iter().map(|&c| matrices.coverage[c]).max_by(f64::total_cmp) {
        return UnassignedReason::new(
            "coverage",
            format!("Insufficient atom coverage (best {:.2}, required {:.2})", best, min_coverage)
        );
    }

    let states: Vec<PairState> = (0..opposite).map(|other| matrices.state[cell(other)]).collect();
    match dominant_failure(&states) {
        Some(PairState::ElementMismatch) => UnassignedReason::new(
            PairState::ElementMismatch.key(),
            "No compatible candidate found, ligands could not be matched by graph isomorphism".to_owned()
        ),
        Some(state) => UnassignedReason::new(state.key(), state.description().to_owned()),
        None => UnassignedReason::new("identity", "No compatible candidate found".to_owned())
    }
}
