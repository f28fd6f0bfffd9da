//! Run configuration, deserializable from TOML
//!
//! ```toml
//! substructure_match = true
//! coverage_delta = 0.2
//!
//! [lddt_pli]
//! radius = 6.0
//!
//! [scrmsd]
//! full_bs_search = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::ExtractOptions;
use crate::matching::MatchSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error
    },
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String
    }
}

/// Distance-difference scorer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LddtPliConfig {
    /// Contact inclusion radius between ligand and binding site atoms
    pub radius: f64,
    /// Also penalize contacts only present in the model
    pub add_mdl_contacts: bool
}

impl Default for LddtPliConfig {
    fn default() -> Self {
        LddtPliConfig {radius: 6.0, add_mdl_contacts: true}
    }
}

/// Binding-site superposition scorer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrmsdConfig {
    /// Binding site inclusion radius around the reference ligand
    pub bs_radius: f64,
    /// Pocket radius for the lDDT-LP reporting value
    pub lddt_lp_radius: f64,
    /// Try every chain placement of the binding site
    pub full_bs_search: bool
}

impl Default for ScrmsdConfig {
    fn default() -> Self {
        ScrmsdConfig {bs_radius: 4.0, lddt_lp_radius: 15.0, full_bs_search: false}
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Map chains by residue numbers instead of sequence alignment
    pub resnum_alignments: bool,
    pub substructure_match: bool,
    /// Accepted coverage shortfall for substructure matches
    pub coverage_delta: f64,
    pub max_symmetries: usize,
    pub check_compounds: bool,
    pub fault_tolerant: bool,
    pub lddt_pli: LddtPliConfig,
    pub scrmsd: ScrmsdConfig
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            resnum_alignments: false,
            substructure_match: false,
            coverage_delta: 0.2,
            max_symmetries: 100_000,
            check_compounds: true,
            fault_tolerant: false,
            lddt_pli: LddtPliConfig::default(),
            scrmsd: ScrmsdConfig::default()
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {field, reason: format!("{} is not a positive distance", value)})
    }
}

impl ScoringConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<ScoringConfig, ConfigError> {
        let config: ScoringConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<ScoringConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e
        })?;
        ScoringConfig::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.coverage_delta) {
            return Err(ConfigError::Invalid {
                field: "coverage_delta",
                reason: format!("{} is outside of [0, 1]", self.coverage_delta)
            });
        }

        if self.max_symmetries == 0 {
            return Err(ConfigError::Invalid {field: "max_symmetries", reason: "must be positive".to_owned()});
        }

        positive("lddt_pli.radius", self.lddt_pli.radius)?;
        positive("scrmsd.bs_radius", self.scrmsd.bs_radius)?;
        positive("scrmsd.lddt_lp_radius", self.scrmsd.lddt_lp_radius)?;
        Ok(())
    }

    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            substructure_match: self.substructure_match,
            max_symmetries: self.max_symmetries
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            check_compounds: self.check_compounds,
            fault_tolerant: self.fault_tolerant
        }
    }

    /// Minimal coverage for a pair to be assignable
    pub fn min_coverage(&self) -> f64 {
        1.0 - self.coverage_delta
    }
}
