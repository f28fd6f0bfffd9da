#[macro_use]
extern crate lazy_static;

pub mod strong;
pub mod quaternions;
pub mod structure;
pub mod compound;
pub mod ligand;
pub mod extract;
pub mod matching;
pub mod chain_mapping;
pub mod config;
pub mod error;
pub mod scoring;

pub use config::ScoringConfig;
pub use error::ScoringError;
pub use scoring::{score_ligands, PairScorer, ScoringInput};
pub use scoring::lddt_pli::LddtPliScorer;
pub use scoring::scrmsd::ScrmsdScorer;
pub use scoring::results::LigandScores;
