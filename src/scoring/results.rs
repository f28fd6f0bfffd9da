//! Results of a scoring run

use nalgebra::DMatrix;
use serde::Serialize;

use crate::chain_mapping::ChainPair;
use crate::ligand::LigandSet;
use crate::scoring::{AuxData, PairScorer, ScoreOrder};
use crate::scoring::matrix::ScoreMatrices;
use crate::scoring::reason::{unassigned_reason, Side, UnassignedReason};
use crate::scoring::state::{PairState, StateDescription};

/// Scores of one assigned ligand pair, keyed by ligand output keys
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssignedPair {
    pub target_ligand: String,
    pub model_ligand: String,
    pub score: f64,
    pub coverage: f64,
    pub aux: AuxData
}

#[derive(Clone, Debug)]
pub struct LigandScores {
    scorer: &'static str,
    score_order: ScoreOrder,
    target_ligands: LigandSet,
    model_ligands: LigandSet,
    matrices: ScoreMatrices,
    assignment: Vec<(usize, usize)>,
    chain_mapping: Vec<ChainPair>,
    min_coverage: f64
}

impl LigandScores {
    pub fn new(
        scorer: &dyn PairScorer,
        target_ligands: LigandSet,
        model_ligands: LigandSet,
        matrices: ScoreMatrices,
        assignment: Vec<(usize, usize)>,
        chain_mapping: Vec<ChainPair>,
        min_coverage: f64
    ) -> LigandScores {
        LigandScores {
            scorer: scorer.name(),
            score_order: scorer.score_order(),
            target_ligands,
            model_ligands,
            matrices,
            assignment,
            chain_mapping,
            min_coverage
        }
    }

    /// Name of the pair scorer that produced the results
    pub fn scorer(&self) -> &'static str {
        self.scorer
    }

    pub fn score_order(&self) -> ScoreOrder {
        self.score_order
    }

    pub fn target_ligands(&self) -> &LigandSet {
        &self.target_ligands
    }

    pub fn model_ligands(&self) -> &LigandSet {
        &self.model_ligands
    }

    /// Scores indexed `[target][model]`, NaN for invalid pairs
    pub fn score_matrix(&self) -> &DMatrix<f64> {
        &self.matrices.score
    }

    pub fn coverage_matrix(&self) -> &DMatrix<f64> {
        &self.matrices.coverage
    }

    pub fn state_matrix(&self) -> &DMatrix<PairState> {
        &self.matrices.state
    }

    /// Numeric state codes, decodable with [`LigandScores::state_decoding`]
    pub fn state_codes(&self) -> DMatrix<u8> {
        self.matrices.state.map(PairState::code)
    }

    pub fn state_decoding(&self) -> Vec<(u8, StateDescription)> {
        PairState::decoding()
    }

    pub fn aux_matrix(&self) -> &DMatrix<Option<AuxData>> {
        &self.matrices.aux
    }

    /// Assigned (target index, model index) pairs, ascending by target
    pub fn assignment(&self) -> &[(usize, usize)] {
        &self.assignment
    }

    /// Global chain mapping of the run
    pub fn chain_mapping(&self) -> &[ChainPair] {
        &self.chain_mapping
    }

    pub fn unassigned_target_ligands(&self) -> Vec<usize> {
        (0..self.target_ligands.len())
            .filter(|t| !self.assignment.iter().any(|(r, _)| r == t))
            .collect()
    }

    pub fn unassigned_model_ligands(&self) -> Vec<usize> {
        (0..self.model_ligands.len())
            .filter(|m| !self.assignment.iter().any(|(_, a)| a == m))
            .collect()
    }

    pub fn assigned_pairs(&self) -> Vec<AssignedPair> {
        self.assignment.iter()
            .filter_map(|&(t, m)| {
                let cell = (t, m);
                Some(AssignedPair {
                    target_ligand: self.target_ligands.get(t)?.key().to_owned(),
                    model_ligand: self.model_ligands.get(m)?.key().to_owned(),
                    score: self.matrices.score[cell],
                    coverage: self.matrices.coverage[cell],
                    aux: self.matrices.aux[cell].clone()?
                })
            })
            .collect()
    }

    fn assigned_cell(&self, model_key: &str) -> Option<(usize, usize)> {
        let m = self.model_ligands.index_of(model_key)?;
        self.assignment.iter().find(|(_, a)| *a == m).copied()
    }

    /// Score of the target ligand assigned to a model ligand
    pub fn score_of(&self, model_key: &str) -> Option<f64> {
        self.assigned_cell(model_key).map(|cell| self.matrices.score[cell])
    }

    pub fn aux_of(&self, model_key: &str) -> Option<&AuxData> {
        self.matrices.aux[self.assigned_cell(model_key)?].as_ref()
    }

    pub fn guess_model_ligand_unassigned_reason(&self, model_index: usize) -> UnassignedReason {
        unassigned_reason(Side::Model, model_index, &self.matrices, &self.assignment, self.min_coverage)
    }

    pub fn guess_target_ligand_unassigned_reason(&self, target_index: usize) -> UnassignedReason {
        unassigned_reason(Side::Reference, target_index, &self.matrices, &self.assignment, self.min_coverage)
    }

    /// Reasons for every unassigned model ligand, keyed by ligand output key
    pub fn unassigned_model_ligand_reasons(&self) -> Vec<(String, UnassignedReason)> {
        self.unassigned_model_ligands().into_iter()
            .map(|m| (self.model_ligands[m].key().to_owned(), self.guess_model_ligand_unassigned_reason(m)))
            .collect()
    }

    pub fn unassigned_target_ligand_reasons(&self) -> Vec<(String, UnassignedReason)> {
        self.unassigned_target_ligands().into_iter()
            .map(|t| (self.target_ligands[t].key().to_owned(), self.guess_target_ligand_unassigned_reason(t)))
            .collect()
    }
}
