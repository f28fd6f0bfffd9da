//! Per-pair scoring states and their decoding

use std::fmt;

use serde::Serialize;

use crate::matching::MatchFailure;

/// Outcome class of scoring one (reference, model) ligand pair
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PairState {
    Valid,
    /// No compatible element composition or graph
    ElementMismatch,
    TooManySymmetries,
    /// Only a substructure match exists, or none at all
    NoIsomorphism,
    DisconnectedGraph,
    /// No reference ligand to binding site contacts
    NoContact,
    /// No reference polymer residues close to the ligand
    TargetBindingSite,
    /// Too few binding site residues could be mapped onto the model
    ModelBindingSite,
    /// Correspondence refers to atoms outside of a ligand
    BrokenCorrespondence
}

/// Short key and human readable description of a state code
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateDescription {
    pub key: &'static str,
    pub description: &'static str
}

impl PairState {
    pub const ALL: [PairState; 9] = [
        PairState::Valid,
        PairState::ElementMismatch,
        PairState::TooManySymmetries,
        PairState::NoIsomorphism,
        PairState::DisconnectedGraph,
        PairState::NoContact,
        PairState::TargetBindingSite,
        PairState::ModelBindingSite,
        PairState::BrokenCorrespondence,
    ];

    /// Stable numeric code, zero for valid pairs
    pub fn code(self) -> u8 {
        match self {
            PairState::Valid => 0,
            PairState::ElementMismatch => 1,
            PairState::TooManySymmetries => 2,
            PairState::NoIsomorphism => 3,
            PairState::DisconnectedGraph => 4,
            PairState::NoContact => 9,
            PairState::TargetBindingSite => 10,
            PairState::ModelBindingSite => 11,
            PairState::BrokenCorrespondence => 20
        }
    }

    pub fn from_code(code: u8) -> Option<PairState> {
        PairState::ALL.iter().copied().find(|state| state.code() == code)
    }

    pub fn is_valid(self) -> bool {
        self == PairState::Valid
    }

    pub fn key(self) -> &'static str {
        match self {
            PairState::Valid => "OK",
            PairState::ElementMismatch => "identity",
            PairState::TooManySymmetries => "symmetries",
            PairState::NoIsomorphism => "no_iso",
            PairState::DisconnectedGraph => "disconnected",
            PairState::NoContact => "no_contact",
            PairState::TargetBindingSite => "target_binding_site",
            PairState::ModelBindingSite => "model_binding_site",
            PairState::BrokenCorrespondence => "unknown"
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PairState::Valid => "OK",
            PairState::ElementMismatch => "Ligands could not be matched (by subgraph isomorphism)",
            PairState::TooManySymmetries => "Too many symmetries between ligand atoms were found - increasing max_symmetries might help",
            PairState::NoIsomorphism => "No fully isomorphic match could be found - enabling substructure_match might allow a match",
            PairState::DisconnectedGraph => "Ligand graph is disconnected",
            PairState::NoContact => "There were no lDDT contacts between the binding site and the ligand, and lDDT-PLI is undefined",
            PairState::TargetBindingSite => "No residues were in proximity of the target ligand",
            PairState::ModelBindingSite => "Binding site was not found in the model, i.e. too few binding site residues could be mapped",
            PairState::BrokenCorrespondence => "Unknown error"
        }
    }

    /// Rank used to pick the most specific failure of a row or column, higher first
    pub fn specificity(self) -> u8 {
        match self {
            PairState::DisconnectedGraph => 6,
            PairState::TooManySymmetries => 5,
            PairState::NoContact | PairState::TargetBindingSite | PairState::ModelBindingSite => 4,
            PairState::BrokenCorrespondence => 3,
            PairState::NoIsomorphism => 2,
            PairState::ElementMismatch => 1,
            PairState::Valid => 0
        }
    }

    /// Table of all state codes
    pub fn decoding() -> Vec<(u8, StateDescription)> {
        PairState::ALL.iter()
            .map(|state| (state.code(), StateDescription {key: state.key(), description: state.description()}))
            .collect()
    }
}

impl fmt::Display for PairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl From<MatchFailure> for PairState {
    fn from(failure: MatchFailure) -> Self {
        match failure {
            MatchFailure::NoIsomorphism => PairState::NoIsomorphism,
            MatchFailure::TooManySymmetries => PairState::TooManySymmetries,
            MatchFailure::DisconnectedGraph => PairState::DisconnectedGraph,
            MatchFailure::ElementMismatch => PairState::ElementMismatch
        }
    }
}
