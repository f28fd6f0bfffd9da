use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ExtractError;

/// Fatal errors of a scoring run
///
/// Per-pair failures are not errors, but states in the state matrix.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Ligand extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("Score matrices have shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize)
    }
}
