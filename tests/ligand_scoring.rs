use ligscore::compound::{Compound, CompoundDictionary};
use ligscore::extract::LigandSource;
use ligscore::quaternions::Vector3;
use ligscore::scoring::AuxData;
use ligscore::scoring::state::PairState;
use ligscore::structure::{BondOrder, Chain, Element, Residue, ResidueKind, Structure};
use ligscore::*;

const C: Element = Element::CARBON;

const LIGAND_ATOMS: [(&str, Element, [f64; 3]); 10] = [
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

const LIGAND_BONDS: [(&str, &str); 10] = [
    ("C1", "C2"), ("C2", "C3"), ("C3", "C4"), ("C4", "C5"), ("C5", "C6"), ("C6", "C1"),
    ("C1", "C7"), ("C7", "C8"), ("C8", "N1"), ("N1", "O1"),
];

fn dictionary() -> CompoundDictionary {
    let lig = LIGAND_ATOMS.iter().fold(Compound::new("LIG"), |c, (name, element, _)| c.with_atom(name, *element));
    let lig = LIGAND_BONDS.iter().fold(lig, |c, (a, b)| c.with_bond(a, b, BondOrder::Single));

    let benzene = (1..=6).fold(Compound::new("BNZ"), |c, i| c.with_atom(&format!("C{}", i), C));
    let benzene = (1..=6).fold(benzene, |c, i| {
        c.with_bond(&format!("C{}", i), &format!("C{}", i % 6 + 1), BondOrder::Aromatic)
    });

    let ethanol = Compound::new("EOH")
        .with_atom("C1", C)
        .with_atom("C2", C)
        .with_atom("O", Element::OXYGEN)
        .with_bond("C1", "C2", BondOrder::Single)
        .with_bond("C2", "O", BondOrder::Single);

    [lig, benzene, ethanol].into_iter().collect()
}

fn lig(number: i32, offset: Vector3, skip: &[&str]) -> Residue {
    LIGAND_ATOMS.iter()
        .filter(|(name, _, _)| !skip.contains(name))
        .fold(Residue::new("LIG", number, ResidueKind::NonPolymer), |residue, (name, element, p)| {
            residue.with_atom(name, *element, Vector3::new(p[0], p[1], p[2]) + offset)
        })
}

fn benzene(number: i32) -> Residue {
    (0..6).fold(Residue::new("BNZ", number, ResidueKind::NonPolymer), |residue, i| {
        let angle = i as f64 * std::f64::consts::FRAC_PI_3;
        residue.with_atom(&format!("C{}", i + 1), C, Vector3::new(1.4 * angle.cos(), 1.4 * angle.sin(), 0.0))
    })
}

fn ethanol(number: i32) -> Residue {
    Residue::new("EOH", number, ResidueKind::NonPolymer)
        .with_atom("C1", C, Vector3::new(-2.0, 0.0, 3.0))
        .with_atom("C2", C, Vector3::new(-0.6, 0.4, 3.0))
        .with_atom("O", Element::OXYGEN, Vector3::new(0.3, -0.6, 3.2))
}

fn pocket() -> Chain {
    const NAMES: [&str; 8] = ["ALA", "SER", "LEU", "PHE", "THR", "VAL", "ASP", "LYS"];
    NAMES.iter().enumerate().fold(Chain::new("A"), |chain, (i, name)| {
        let angle = i as f64 * std::f64::consts::FRAC_PI_4;
        let direction = Vector3::new(angle.cos(), angle.sin(), 0.0);
        let ca = 6.0 * direction + Vector3::new(0.0, 0.0, 0.4 * i as f64 - 1.4);
        chain.with_residue(
            Residue::new(name, i as i32 + 1, ResidueKind::Peptide)
                .with_atom("N", Element::NITROGEN, ca + Vector3::new(0.0, 0.0, 1.3))
                .with_atom("CA", C, ca)
                .with_atom("C", C, ca + Vector3::new(0.0, 1.2, -0.6))
                .with_atom("CB", C, ca - 1.5 * direction)
        )
    })
}

fn complex(ligands: Vec<Residue>) -> Structure {
    Structure::new(vec![pocket(), ligands.into_iter().fold(Chain::new("L"), Chain::with_residue)])
}

fn lddt_pli(config: &ScoringConfig) -> LddtPliScorer {
    LddtPliScorer::new(&config.lddt_pli)
}

fn scrmsd(config: &ScoringConfig) -> ScrmsdScorer {
    ScrmsdScorer::new(&config.scrmsd)
}

#[test]
fn copy_of_second_target_ligand() {
    let target = complex(vec![ethanol(1), lig(2, Vector3::zeros(), &[])]);
    let model = complex(vec![lig(1, Vector3::zeros(), &[])]);
    let config = ScoringConfig::default();
    let library = dictionary();
    let input = ScoringInput::new(&model, &target);

    let scorers: [&dyn PairScorer; 2] = [&lddt_pli(&config), &scrmsd(&config)];
    for scorer in scorers {
        let scores = score_ligands(&input, &library, scorer, &config).expect("Valid run");

        assert_eq!(scores.assignment(), &[(1, 0)]);
        assert_eq!(scores.score_matrix().shape(), (2, 1));
        assert_eq!(scores.coverage_matrix().shape(), (2, 1));
        assert_eq!(scores.state_matrix().shape(), (2, 1));
        assert_eq!(scores.coverage_matrix()[(1, 0)], 1.0);
        assert_eq!(scores.state_codes()[(1, 0)], 0);
        assert_eq!(scores.state_matrix()[(0, 0)], PairState::ElementMismatch);

        assert_eq!(scores.unassigned_target_ligands(), vec![0]);
        assert!(scores.unassigned_model_ligands().is_empty());
        let reason = scores.guess_target_ligand_unassigned_reason(0);
        assert_eq!(reason.key, "identity");
        assert!(reason.message.starts_with("No compatible candidate found"));

        let pairs = scores.assigned_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].target_ligand, "L.2");
        assert_eq!(pairs[0].model_ligand, "L.1");
        assert!(scores.aux_of("L.1").is_some());

        let score = scores.score_of("L.1").expect("Assigned");
        match scorer.score_order() {
            scoring::ScoreOrder::HigherIsBetter => approx::assert_relative_eq!(score, 1.0, epsilon = 1e-9),
            scoring::ScoreOrder::LowerIsBetter => approx::assert_relative_eq!(score, 0.0, epsilon = 1e-6)
        }
    }
}

#[test]
fn partial_reference_needs_substructure_matching() {
    let target = complex(vec![lig(1, Vector3::zeros(), &["N1", "O1"])]);
    let model = complex(vec![lig(1, Vector3::zeros(), &[])]);
    let library = dictionary();
    let input = ScoringInput::new(&model, &target);

    let exact = ScoringConfig::default();
    let scores = score_ligands(&input, &library, &scrmsd(&exact), &exact).expect("Valid run");
    assert!(scores.assignment().is_empty());
    assert_eq!(scores.state_matrix()[(0, 0)], PairState::NoIsomorphism);
    assert_eq!(scores.guess_model_ligand_unassigned_reason(0).key, "no_iso");

    let substructure = ScoringConfig {substructure_match: true, ..ScoringConfig::default()};
    let scores = score_ligands(&input, &library, &scrmsd(&substructure), &substructure).expect("Valid run");
    assert_eq!(scores.assignment(), &[(0, 0)]);
    approx::assert_relative_eq!(scores.coverage_matrix()[(0, 0)], 0.8);
    approx::assert_relative_eq!(scores.score_matrix()[(0, 0)], 0.0, epsilon = 1e-6);

    // Atoms missing from the target cost coverage, not contact score
    let scores = score_ligands(&input, &library, &lddt_pli(&substructure), &substructure).expect("Valid run");
    assert_eq!(scores.assignment(), &[(0, 0)]);
    approx::assert_relative_eq!(scores.score_matrix()[(0, 0)], 1.0, epsilon = 1e-9);

    let strict_coverage = ScoringConfig {substructure_match: true, coverage_delta: 0.1, ..ScoringConfig::default()};
    let scores = score_ligands(&input, &library, &scrmsd(&strict_coverage), &strict_coverage).expect("Valid run");
    assert!(scores.assignment().is_empty());
    assert_eq!(scores.state_matrix()[(0, 0)], PairState::Valid);
    assert_eq!(scores.guess_target_ligand_unassigned_reason(0).key, "coverage");
}

#[test]
fn symmetry_cap() {
    let target = complex(vec![benzene(1)]);
    let model = target.clone();
    let library = dictionary();
    let input = ScoringInput::new(&model, &target);

    let enough = ScoringConfig {max_symmetries: 12, ..ScoringConfig::default()};
    let scores = score_ligands(&input, &library, &lddt_pli(&enough), &enough).expect("Valid run");
    assert_eq!(scores.assignment(), &[(0, 0)]);

    let too_few = ScoringConfig {max_symmetries: 11, ..ScoringConfig::default()};
    let scores = score_ligands(&input, &library, &lddt_pli(&too_few), &too_few).expect("Valid run");
    assert!(scores.assignment().is_empty());
    assert_eq!(scores.state_matrix()[(0, 0)], PairState::TooManySymmetries);
    assert_eq!(scores.guess_model_ligand_unassigned_reason(0).key, "symmetries");
}

#[test]
fn stoichiometry_and_determinism() {
    let target = complex(vec![lig(1, Vector3::zeros(), &[])]);
    let model = complex(vec![lig(1, Vector3::zeros(), &[]), lig(2, Vector3::new(0.0, 0.0, 0.8), &[])]);
    let config = ScoringConfig::default();
    let library = dictionary();
    let input = ScoringInput::new(&model, &target);

    let first = score_ligands(&input, &library, &lddt_pli(&config), &config).expect("Valid run");
    let second = score_ligands(&input, &library, &lddt_pli(&config), &config).expect("Valid run");

    assert_eq!(first.assignment(), &[(0, 0)]);
    assert_eq!(first.assignment(), second.assignment());
    assert_eq!(first.state_codes(), second.state_codes());
    assert_eq!(first.score_matrix().map(f64::to_bits), second.score_matrix().map(f64::to_bits));

    for m in first.unassigned_model_ligands() {
        let reason = first.guess_model_ligand_unassigned_reason(m);
        assert_eq!(reason.key, "stoichiometry");
        assert!(!reason.message.is_empty());
    }
    for (key, reason) in first.unassigned_model_ligand_reasons() {
        assert_eq!(key, "L.2");
        assert!(!reason.message.is_empty());
    }

    // Out of range indices still yield a reason
    assert!(!first.guess_model_ligand_unassigned_reason(17).message.is_empty());
    assert!(!first.guess_target_ligand_unassigned_reason(17).message.is_empty());
}

#[test]
fn explicit_model_ligands() {
    let target = complex(vec![lig(1, Vector3::zeros(), &[])]);
    let model = complex(vec![]);
    let config = ScoringConfig::default();
    let library = dictionary();

    let sources = [LigandSource::new("model.sdf", vec![lig(1, Vector3::zeros(), &[])])];
    let input = ScoringInput {model_ligands: Some(&sources), ..ScoringInput::new(&model, &target)};
    let scores = score_ligands(&input, &library, &scrmsd(&config), &config).expect("Valid run");

    assert_eq!(scores.model_ligands().keys(), vec!["model.sdf"]);
    assert_eq!(scores.assignment(), &[(0, 0)]);
    match scores.aux_of("model.sdf") {
        Some(AuxData::Scrmsd(aux)) => {
            approx::assert_relative_eq!(aux.rmsd, 0.0, epsilon = 1e-6);
            assert_eq!(aux.correspondence.len(), 10);
        },
        _ => panic!("Expected binding site superposition details")
    }
}

#[test]
fn no_model_ligands() {
    let target = complex(vec![lig(1, Vector3::zeros(), &[])]);
    let model = complex(vec![]);
    let config = ScoringConfig::default();
    let scores = score_ligands(&ScoringInput::new(&model, &target), &dictionary(), &lddt_pli(&config), &config)
        .expect("Valid run");

    assert_eq!(scores.score_matrix().shape(), (1, 0));
    assert_eq!(scores.guess_target_ligand_unassigned_reason(0).key, "no_ligand");
}

#[test]
fn input_errors() {
    let config = ScoringConfig::default();
    let empty = Structure::default();
    let target = complex(vec![lig(1, Vector3::zeros(), &[])]);
    let result = score_ligands(&ScoringInput::new(&empty, &target), &dictionary(), &lddt_pli(&config), &config);
    assert!(matches!(result, Err(ScoringError::Extract(_))));

    let invalid = ScoringConfig {coverage_delta: -0.5, ..ScoringConfig::default()};
    let result = score_ligands(&ScoringInput::new(&target, &target), &dictionary(), &lddt_pli(&invalid), &invalid);
    assert!(matches!(result, Err(ScoringError::Config(_))));
}
