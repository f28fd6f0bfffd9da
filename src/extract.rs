//! Ligand extraction and validation
//!
//! Ligands either come from an explicit list (e.g. individually loaded SDF
//! files) or are detected from residues annotated as non-polymer entities.

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, warn};

use crate::compound::CompoundLibrary;
use crate::ligand::{Ligand, LigandAtom, LigandError, LigandSet};
use crate::quaternions::Vector3;
use crate::structure::{BondOrder, Residue, ResidueKind, Structure};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Structure contains no atoms")]
    EmptyStructure,
    #[error("Ligand source '{0}' holds no residues")]
    EmptySource(String),
    #[error("Ligand {key} has residue name {residue}, which is not in the compound dictionary")]
    UnknownCompound { residue: String, key: String },
    #[error("Invalid ligand {key}: {source}")]
    Ligand { key: String, source: LigandError },
    #[error("Found {found} distinct ligands, but {expected} were supplied")]
    LigandCountMismatch { expected: usize, found: usize }
}

/// An explicitly supplied ligand file's content
#[derive(Clone, Debug)]
pub struct LigandSource {
    /// Identifying label, usually the file path
    pub label: String,
    pub residues: Vec<Residue>
}

impl LigandSource {
    pub fn new(label: &str, residues: Vec<Residue>) -> LigandSource {
        LigandSource {label: label.to_owned(), residues}
    }
}

/// Validation behavior during extraction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Require a dictionary entry for every detected ligand residue name
    pub check_compounds: bool,
    /// Downgrade dictionary failures to warnings
    pub fault_tolerant: bool
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {check_compounds: true, fault_tolerant: false}
    }
}

/// Extract the ligands of a structure
///
/// If `explicit` is given, those sources define the ligands. Otherwise,
/// residues flagged as ligands in `structure` are used.
pub fn ligand_set(
    structure: &Structure,
    explicit: Option<&[LigandSource]>,
    library: &dyn CompoundLibrary,
    options: ExtractOptions
) -> Result<LigandSet, ExtractError> {
    if structure.is_empty() {
        return Err(ExtractError::EmptyStructure);
    }

    match explicit {
        Some(sources) => load_ligands(sources, library),
        None => detect_ligands(structure, library, options)
    }
}

/// Detect ligands from residues annotated as non-polymer entities
///
/// Connectivity is derived from the compound dictionary by atom name. Atoms
/// whose names the dictionary doesn't know stay unbonded.
pub fn detect_ligands(
    structure: &Structure,
    library: &dyn CompoundLibrary,
    options: ExtractOptions
) -> Result<LigandSet, ExtractError> {
    let mut ligands = Vec::new();
    for chain in structure.chains.iter() {
        for residue in chain.residues.iter().filter(|r| r.is_ligand && r.kind != ResidueKind::Water) {
            let key = format!("{}.{}", chain.name, residue.number);

            let bonds = match library.find_compound(&residue.name) {
                Some(compound) => {
                    let heavy: Vec<&str> = residue.heavy_atoms().map(|a| a.name.as_str()).collect();
                    for name in heavy.iter().filter(|name| !compound.has_atom(name)) {
                        debug!(ligand = %key, atom = %name, "Atom name not in compound dictionary, leaving it unbonded");
                    }
                    compound.bonds_between(&heavy)
                },
                None if options.check_compounds && !options.fault_tolerant => {
                    return Err(ExtractError::UnknownCompound {residue: residue.name.clone(), key});
                },
                None => {
                    if options.check_compounds {
                        warn!(ligand = %key, residue = %residue.name, "Residue name not in compound dictionary");
                    }
                    heavy_atom_bonds(residue)
                }
            };

            let ligand = heavy_atom_ligand(residue, key.clone(), chain.name.clone(), &bonds)
                .map_err(|source| ExtractError::Ligand {key, source})?;
            ligands.push(ligand);
        }
    }

    debug!(count = ligands.len(), "Detected ligands");
    Ok(LigandSet::new(ligands))
}

/// Ligands from explicitly supplied sources
///
/// Each residue becomes one ligand on a unique chain label. A source holding a
/// single residue is keyed by its label, otherwise residues are keyed
/// `label:index`. Explicit bonds take precedence, the compound dictionary is
/// the fallback for sources without bonds. Every supplied residue must end up
/// as a ligand with a distinct key.
pub fn load_ligands(
    sources: &[LigandSource],
    library: &dyn CompoundLibrary
) -> Result<LigandSet, ExtractError> {
    let supplied: usize = sources.iter().map(|source| source.residues.len()).sum();
    let mut ligands = Vec::with_capacity(supplied);
    for source in sources {
        if source.residues.is_empty() {
            return Err(ExtractError::EmptySource(source.label.clone()));
        }

        for (i, residue) in source.residues.iter().enumerate() {
            let key = match source.residues.len() {
                1 => source.label.clone(),
                _ => format!("{}:{}", source.label, i)
            };
            let chain = format!("{:05}_", ligands.len() + 1);

            let bonds = if residue.bonds.is_empty() {
                library.find_compound(&residue.name)
                    .map(|compound| {
                        let heavy: Vec<&str> = residue.heavy_atoms().map(|a| a.name.as_str()).collect();
                        compound.bonds_between(&heavy)
                    })
                    .unwrap_or_default()
            } else {
                heavy_atom_bonds(residue)
            };

            let ligand = heavy_atom_ligand(residue, key.clone(), chain, &bonds)
                .map_err(|source| ExtractError::Ligand {key, source})?;
            ligands.push(ligand);
        }
    }

    let ligands = LigandSet::new(ligands);
    let distinct = ligands.keys().into_iter().unique().count();
    if distinct != supplied {
        return Err(ExtractError::LigandCountMismatch {expected: supplied, found: distinct});
    }

    Ok(ligands)
}

/// Explicit residue bonds re-indexed onto heavy atoms only
fn heavy_atom_bonds(residue: &Residue) -> Vec<(usize, usize, BondOrder)> {
    let mut heavy_index = Vec::with_capacity(residue.atoms.len());
    let mut next = 0;
    for atom in residue.atoms.iter() {
        if atom.element.is_hydrogen() {
            heavy_index.push(None);
        } else {
            heavy_index.push(Some(next));
            next += 1;
        }
    }

    residue.bonds.iter()
        .filter_map(|bond| {
            let a = (*heavy_index.get(bond.a)?)?;
            let b = (*heavy_index.get(bond.b)?)?;
            Some((a, b, bond.order))
        })
        .collect()
}

fn heavy_atom_ligand(
    residue: &Residue,
    key: String,
    chain: String,
    bonds: &[(usize, usize, BondOrder)]
) -> Result<Ligand, LigandError> {
    let atoms: Vec<(LigandAtom, Vector3)> = residue.heavy_atoms()
        .map(|atom| (LigandAtom {name: atom.name.clone(), element: atom.element}, atom.position))
        .collect();

    Ligand::new(key, residue.name.clone(), chain, residue.number, atoms, bonds)
}
