//! Small protein-ligand complexes for scorer tests

use crate::chain_mapping::ChainMapping;
use crate::compound::{Compound, CompoundDictionary};
use crate::extract::{ligand_set, ExtractOptions};
use crate::matching::{find_symmetries, MatchSettings};
use crate::quaternions::{Transform, Vector3};
use crate::scoring::{PairContext, PairScore, PairScorer};
use crate::scoring::state::PairState;
use crate::structure::{BondOrder, Chain, Element, Residue, ResidueKind, Structure};

const C: Element = Element::CARBON;

/// Phenyl ring with an aminoethanol-like tail, centered on the origin
pub(crate) const LIGAND_ATOMS: [(&str, Element, [f64; 3]); 10] = [
    ("C1", C, [1.4, 0.0, 0.0]),
    ("C2", C, [0.7, 1.212, 0.0]),
    ("C3", C, [-0.7, 1.212, 0.0]),
    ("C4", C, [-1.4, 0.0, 0.0]),
    ("C5", C, [-0.7, -1.212, 0.0]),
    ("C6", C, [0.7, -1.212, 0.0]),
    ("C7", C, [2.9, 0.0, 0.1]),
    ("C8", C, [3.6, 1.25, 0.4]),
    ("N1", Element::NITROGEN, [3.0, 2.45, 0.8]),
    ("O1", Element::OXYGEN, [3.6, 3.6, 1.2]),
];

pub(crate) const LIGAND_BONDS: [(&str, &str); 10] = [
    ("C1", "C2"), ("C2", "C3"), ("C3", "C4"), ("C4", "C5"), ("C5", "C6"), ("C6", "C1"),
    ("C1", "C7"), ("C7", "C8"), ("C8", "N1"), ("N1", "O1"),
];

pub(crate) fn compound() -> Compound {
    let compound = LIGAND_ATOMS.iter().fold(Compound::new("LIG"), |c, (name, element, _)| c.with_atom(name, *element));
    LIGAND_BONDS.iter().fold(compound, |c, (a, b)| c.with_bond(a, b, BondOrder::Single))
}

pub(crate) fn dictionary() -> CompoundDictionary {
    [compound()].into_iter().collect()
}

/// Ligand residue, leaving out atoms by name
pub(crate) fn ligand_residue(number: i32, offset: Vector3, skip: &[&str]) -> Residue {
    LIGAND_ATOMS.iter()
        .filter(|(name, _, _)| !skip.contains(name))
        .fold(Residue::new("LIG", number, ResidueKind::NonPolymer), |residue, (name, element, p)| {
            residue.with_atom(name, *element, Vector3::new(p[0], p[1], p[2]) + offset)
        })
}

/// Eight residues on a ring around the z axis, side chains pointing inwards
pub(crate) fn pocket_chain(name: &str) -> Chain {
    const NAMES: [&str; 8] = ["ALA", "SER", "LEU", "PHE", "THR", "VAL", "ASP", "LYS"];
    NAMES.iter().enumerate().fold(Chain::new(name), |chain, (i, residue_name)| {
        let angle = i as f64 * std::f64::consts::FRAC_PI_4;
        let direction = Vector3::new(angle.cos(), angle.sin(), 0.0);
        let ca = 6.0 * direction + Vector3::new(0.0, 0.0, 0.4 * i as f64 - 1.4);
        chain.with_residue(
            Residue::new(residue_name, i as i32 + 1, ResidueKind::Peptide)
                .with_atom("N", Element::NITROGEN, ca + Vector3::new(0.0, 0.0, 1.3))
                .with_atom("CA", C, ca)
                .with_atom("C", C, ca + Vector3::new(0.0, 1.2, -0.6))
                .with_atom("CB", C, ca - 1.5 * direction)
                .with_atom("HA", Element::HYDROGEN, ca + Vector3::new(0.0, -1.0, 0.0))
        )
    })
}

pub(crate) fn complex(ligands: Vec<Residue>) -> Structure {
    let ligand_chain = ligands.into_iter().fold(Chain::new("L"), Chain::with_residue);
    Structure::new(vec![pocket_chain("A"), ligand_chain])
}

/// Apply a rigid motion to all atoms
pub(crate) fn moved(structure: &Structure, transform: &Transform) -> Structure {
    let mut moved = structure.clone();
    for atom in moved.chains.iter_mut().flat_map(|c| c.residues.iter_mut()).flat_map(|r| r.atoms.iter_mut()) {
        atom.position = transform.apply(&atom.position);
    }
    moved
}

pub(crate) fn arbitrary_motion() -> Transform {
    let rotation = nalgebra::Rotation3::from_euler_angles(0.3, -1.1, 2.0).into_inner();
    Transform {rotation, translation: Vector3::new(10.0, -4.0, 2.5)}
}

/// Score the first ligands of two structures against each other
pub(crate) fn score_first(
    scorer: &dyn PairScorer,
    target: &Structure,
    model: &Structure,
    settings: &MatchSettings
) -> Result<PairScore, PairState> {
    let library = dictionary();
    let reference_ligands = ligand_set(target, None, &library, ExtractOptions::default()).expect("Valid target");
    let model_ligands = ligand_set(model, None, &library, ExtractOptions::default()).expect("Valid model");
    let chain_mapping = ChainMapping::new(target, model, false);
    let symmetries = find_symmetries(&reference_ligands[0], &model_ligands[0], settings)?;

    scorer.score_pair(&PairContext {
        reference: &reference_ligands[0],
        model: &model_ligands[0],
        reference_structure: target,
        model_structure: model,
        chain_mapping: &chain_mapping,
        symmetries: &symmetries
    })
}
