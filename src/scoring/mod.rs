//! Pairwise ligand scoring, score matrices and ligand assignment
//!
//! A run extracts the ligands of both structures, scores every (target,
//! model) ligand pair with a [`PairScorer`] and greedily assigns model ligands
//! to target ligands.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{info, instrument};

use crate::chain_mapping::ChainMapping;
use crate::compound::CompoundLibrary;
use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::extract::{ligand_set, LigandSource};
use crate::ligand::Ligand;
use crate::matching::Symmetries;
use crate::quaternions::Matrix3N;
use crate::structure::{Atom, ResidueHandle, Structure};

pub mod state;
pub mod lddt_pli;
pub mod scrmsd;
pub mod matrix;
pub mod assignment;
pub mod reason;
pub mod results;

#[cfg(test)]
pub(crate) mod testing;

use state::PairState;
use lddt_pli::LddtPliAux;
use scrmsd::ScrmsdAux;
use results::LigandScores;

/// Direction in which scores improve
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ScoreOrder {
    HigherIsBetter,
    LowerIsBetter
}

impl ScoreOrder {
    /// Orders `a` before `b` if `a` is the better score
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        match self {
            ScoreOrder::HigherIsBetter => b.total_cmp(&a),
            ScoreOrder::LowerIsBetter => a.total_cmp(&b)
        }
    }

    pub fn is_better(self, a: f64, b: f64) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Everything a scorer may look at for one ligand pair
pub struct PairContext<'a> {
    pub reference: &'a Ligand,
    pub model: &'a Ligand,
    pub reference_structure: &'a Structure,
    pub model_structure: &'a Structure,
    pub chain_mapping: &'a ChainMapping,
    pub symmetries: &'a Symmetries
}

impl<'a> PairContext<'a> {
    /// Reject candidate sets that are empty or point outside of the ligands
    pub fn checked_correspondences(&self) -> Result<(), PairState> {
        let correspondences = &self.symmetries.correspondences;
        let consistent = correspondences.iter()
            .all(|c| !c.is_empty() && c.is_consistent_with(self.reference, self.model));

        match !correspondences.is_empty() && consistent {
            true => Ok(()),
            false => Err(PairState::BrokenCorrespondence)
        }
    }
}

/// Scorer-specific per-pair details, for reporting only
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuxData {
    LddtPli(LddtPliAux),
    Scrmsd(ScrmsdAux)
}

#[derive(Clone, Debug, PartialEq)]
pub struct PairScore {
    pub score: f64,
    pub aux: AuxData
}

/// Scores a single matched ligand pair
pub trait PairScorer: Sync {
    fn name(&self) -> &'static str;

    fn score_order(&self) -> ScoreOrder;

    /// Score the best of the candidate correspondences of a pair
    fn score_pair(&self, context: &PairContext) -> Result<PairScore, PairState>;
}

/// Polymer heavy atoms within `radius` of any of `points`
pub(crate) fn polymer_atoms_within<'s>(structure: &'s Structure, points: &Matrix3N, radius: f64) -> Vec<(ResidueHandle, &'s Atom)> {
    let squared = radius * radius;
    structure.residues_within(points, radius)
        .into_iter()
        .filter_map(|handle| Some((handle, structure.residue_at(handle)?)))
        .flat_map(|(handle, residue)| residue.heavy_atoms().map(move |atom| (handle, atom)))
        .filter(|(_, atom)| points.column_iter().any(|p| (p - atom.position).norm_squared() <= squared))
        .collect()
}

/// Same-named atom of a residue in another structure
pub(crate) fn counterpart<'s>(structure: &'s Structure, handle: Option<ResidueHandle>, name: &str) -> Option<&'s Atom> {
    structure.residue_at(handle?)?.find_atom(name)
}

/// Structures and optional explicit ligands of one run
#[derive(Clone, Copy)]
pub struct ScoringInput<'a> {
    pub model: &'a Structure,
    pub target: &'a Structure,
    /// Explicit model ligands, detected from `model` if `None`
    pub model_ligands: Option<&'a [LigandSource]>,
    /// Explicit target ligands, detected from `target` if `None`
    pub target_ligands: Option<&'a [LigandSource]>
}

impl<'a> ScoringInput<'a> {
    pub fn new(model: &'a Structure, target: &'a Structure) -> ScoringInput<'a> {
        ScoringInput {model, target, model_ligands: None, target_ligands: None}
    }
}

/// Extract, match, score and assign the ligands of a model against a target
#[instrument(skip_all, fields(scorer = scorer.name()))]
pub fn score_ligands(
    input: &ScoringInput,
    library: &dyn CompoundLibrary,
    scorer: &dyn PairScorer,
    config: &ScoringConfig
) -> Result<LigandScores, ScoringError> {
    config.validate()?;

    let target_ligands = ligand_set(input.target, input.target_ligands, library, config.extract_options())?;
    let model_ligands = ligand_set(input.model, input.model_ligands, library, config.extract_options())?;
    let chain_mapping = ChainMapping::new(input.target, input.model, config.resnum_alignments);

    let matrices = matrix::build(
        &matrix::MatrixInput {
            reference_ligands: &target_ligands,
            model_ligands: &model_ligands,
            reference_structure: input.target,
            model_structure: input.model,
            chain_mapping: &chain_mapping
        },
        scorer,
        &config.match_settings()
    );

    let expected = (target_ligands.len(), model_ligands.len());
    if matrices.shape() != expected {
        return Err(ScoringError::ShapeMismatch {expected, found: matrices.shape()});
    }

    let assignment = assignment::greedy(&matrices, scorer.score_order(), config.min_coverage());
    info!(
        target_ligands = target_ligands.len(),
        model_ligands = model_ligands.len(),
        assigned = assignment.len(),
        "Scored ligands"
    );

    Ok(LigandScores::new(
        scorer,
        target_ligands,
        model_ligands,
        matrices,
        assignment,
        chain_mapping.named_pairs(input.target, input.model),
        config.min_coverage()
    ))
}
