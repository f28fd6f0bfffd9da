//! All-pairs score, coverage and state matrices
//!
//! Matrices are indexed `[reference ligand][model ligand]`. Every pair is
//! matched and scored independently, in parallel.

use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::debug;

use crate::chain_mapping::ChainMapping;
use crate::ligand::LigandSet;
use crate::matching::{find_symmetries, MatchSettings};
use crate::scoring::{AuxData, PairContext, PairScorer};
use crate::scoring::state::PairState;
use crate::structure::Structure;

pub struct MatrixInput<'a> {
    pub reference_ligands: &'a LigandSet,
    pub model_ligands: &'a LigandSet,
    pub reference_structure: &'a Structure,
    pub model_structure: &'a Structure,
    pub chain_mapping: &'a ChainMapping
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMatrices {
    /// Pair scores, NaN unless the pair is valid
    pub score: DMatrix<f64>,
    /// Fraction of the model ligand covered, zero unless the pair is valid
    pub coverage: DMatrix<f64>,
    pub state: DMatrix<PairState>,
    pub aux: DMatrix<Option<AuxData>>
}

impl ScoreMatrices {
    /// (reference ligands, model ligands)
    pub fn shape(&self) -> (usize, usize) {
        self.state.shape()
    }

    pub fn is_assignable(&self, reference: usize, model: usize, min_coverage: f64) -> bool {
        self.state[(reference, model)].is_valid()
            && self.score[(reference, model)].is_finite()
            && meets_coverage(self.coverage[(reference, model)], min_coverage)
    }
}

/// Coverage comparison with tolerance for `1 - delta` rounding
pub fn meets_coverage(coverage: f64, min_coverage: f64) -> bool {
    coverage >= min_coverage - 1e-9
}

struct Cell {
    state: PairState,
    score: f64,
    coverage: f64,
    aux: Option<AuxData>
}

fn score_cell(input: &MatrixInput, reference: usize, model: usize, scorer: &dyn PairScorer, settings: &MatchSettings) -> Cell {
    let failed = |state: PairState| Cell {state, score: f64::NAN, coverage: 0.0, aux: None};

    let (reference_ligand, model_ligand) = (&input.reference_ligands[reference], &input.model_ligands[model]);
    let symmetries = match find_symmetries(reference_ligand, model_ligand, settings) {
        Ok(symmetries) => symmetries,
        Err(failure) => return failed(failure.into())
    };

    let context = PairContext {
        reference: reference_ligand,
        model: model_ligand,
        reference_structure: input.reference_structure,
        model_structure: input.model_structure,
        chain_mapping: input.chain_mapping,
        symmetries: &symmetries
    };

    match scorer.score_pair(&context) {
        Ok(pair) => Cell {
            state: PairState::Valid,
            score: pair.score,
            coverage: symmetries.coverage.clamp(0.0, 1.0),
            aux: Some(pair.aux)
        },
        Err(state) => failed(state)
    }
}

/// Match and score every ligand pair
pub fn build(input: &MatrixInput, scorer: &dyn PairScorer, settings: &MatchSettings) -> ScoreMatrices {
    let (rows, cols) = (input.reference_ligands.len(), input.model_ligands.len());

    // Column-major, as nalgebra stores matrices
    let cells: Vec<Cell> = (0..rows * cols)
        .into_par_iter()
        .map(|k| score_cell(input, k % rows, k / rows, scorer, settings))
        .collect();

    debug!(
        pairs = cells.len(),
        valid = cells.iter().filter(|cell| cell.state.is_valid()).count(),
        "Built score matrices"
    );

    let score = DMatrix::from_iterator(rows, cols, cells.iter().map(|cell| cell.score));
    let coverage = DMatrix::from_iterator(rows, cols, cells.iter().map(|cell| cell.coverage));
    let state = DMatrix::from_iterator(rows, cols, cells.iter().map(|cell| cell.state));
    let aux = DMatrix::from_iterator(rows, cols, cells.into_iter().map(|cell| cell.aux));

    ScoreMatrices {score, coverage, state, aux}
}
