//! Ligands as minimal molecular fragments: heavy atoms, positions and a bond graph

use std::collections::BTreeMap;

use delegate::delegate;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use thiserror::Error;

use crate::quaternions::Vector3;
use crate::strong::{Index, Nucleus};
use crate::strong::matrix::Positions;
use crate::structure::{BondOrder, Element, ResidueNumber};

/// Underlying graph representation: elements as vertices, bond orders as edges
///
/// Vertex indices coincide with [`Nucleus`] indices.
type Graph = petgraph::graph::UnGraph<Element, BondOrder, u32>;

/// Errors while assembling a ligand
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LigandError {
    #[error("Ligand has no heavy atoms")]
    NoAtoms,
    #[error("Bond {0}-{1} refers to an atom outside of the ligand ({2} atoms)")]
    BondOutOfRange(usize, usize, usize),
    #[error("Atom {0} is bonded to itself")]
    SelfBond(usize)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LigandAtom {
    pub name: String,
    pub element: Element
}

/// Immutable heavy-atom ligand
#[derive(Clone, Debug)]
pub struct Ligand {
    key: String,
    identity: String,
    chain: String,
    number: ResidueNumber,
    atoms: Vec<LigandAtom>,
    positions: Positions<Nucleus>,
    graph: Graph
}

impl Ligand {
    /// Assemble a ligand from atoms and bonds between atom indices
    ///
    /// Repeated bonds collapse into one.
    pub fn new(
        key: String,
        identity: String,
        chain: String,
        number: ResidueNumber,
        atoms: Vec<(LigandAtom, Vector3)>,
        bonds: &[(usize, usize, BondOrder)]
    ) -> Result<Ligand, LigandError> {
        let n = atoms.len();
        if n == 0 {
            return Err(LigandError::NoAtoms);
        }

        let mut graph = Graph::with_capacity(n, bonds.len());
        for (atom, _) in atoms.iter() {
            graph.add_node(atom.element);
        }

        for &(a, b, order) in bonds {
            if a >= n || b >= n {
                return Err(LigandError::BondOutOfRange(a, b, n));
            }
            if a == b {
                return Err(LigandError::SelfBond(a));
            }
            graph.update_edge(Nucleus(a).into_node(), Nucleus(b).into_node(), order);
        }

        let positions = Positions::from_points(atoms.iter().map(|(_, p)| p));
        let atoms = atoms.into_iter().map(|(atom, _)| atom).collect();

        Ok(Ligand {key, identity, chain, number, atoms, positions, graph})
    }

    /// Output key, e.g. `L.301` or `ligand.sdf:1`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Chemical identity: residue name or SDF-derived name
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn number(&self) -> ResidueNumber {
        self.number
    }

    /// Number of heavy atoms
    pub fn size(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[LigandAtom] {
        &self.atoms
    }

    pub fn atom(&self, nucleus: Nucleus) -> Option<&LigandAtom> {
        self.atoms.get(nucleus.position())
    }

    pub fn positions(&self) -> &Positions<Nucleus> {
        &self.positions
    }

    pub fn element(&self, nucleus: Nucleus) -> Element {
        self.graph[nucleus.into_node()]
    }

    pub fn nuclei(&self) -> impl Iterator<Item = Nucleus> {
        (0..self.size()).map(Nucleus)
    }

    pub fn neighbors(&self, nucleus: Nucleus) -> impl Iterator<Item = Nucleus> + '_ {
        self.graph.neighbors(nucleus.into_node()).map(|n| Nucleus(n.index()))
    }

    pub fn degree(&self, nucleus: Nucleus) -> usize {
        self.graph.edges(nucleus.into_node()).count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_bond(&self, a: Nucleus, b: Nucleus) -> bool {
        self.graph.find_edge(a.into_node(), b.into_node()).is_some()
    }

    /// Bonds as ordered index pairs
    pub fn bonds(&self) -> impl Iterator<Item = (Nucleus, Nucleus, BondOrder)> + '_ {
        self.graph.edge_references().map(|edge| {
            let (a, b) = (edge.source().index(), edge.target().index());
            (Nucleus(a.min(b)), Nucleus(a.max(b)), *edge.weight())
        })
    }

    /// Number of connected components of the bond graph
    pub fn component_count(&self) -> usize {
        let mut vertex_sets = UnionFind::new(self.size());
        for (a, b, _) in self.bonds() {
            vertex_sets.union(a.position(), b.position());
        }

        let mut labels = vertex_sets.into_labeling();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }

    pub fn is_connected(&self) -> bool {
        self.component_count() == 1
    }

    /// Element multiset
    pub fn element_counts(&self) -> BTreeMap<Element, usize> {
        let mut counts = BTreeMap::new();
        for atom in self.atoms.iter() {
            *counts.entry(atom.element).or_insert(0) += 1;
        }
        counts
    }
}

impl Nucleus {
    fn into_node(self) -> petgraph::graph::NodeIndex {
        petgraph::graph::NodeIndex::new(self.0)
    }
}

/// Ordered ligands of one structure
///
/// Insertion order is the canonical ligand index.
#[derive(Clone, Debug, Default)]
pub struct LigandSet {
    ligands: Vec<Ligand>
}

impl LigandSet {
    pub fn new(ligands: Vec<Ligand>) -> LigandSet {
        LigandSet {ligands}
    }

    delegate! {
        to self.ligands {
            /// Number of ligands
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
            /// Ligand at a canonical index
            pub fn get(&self, index: usize) -> Option<&Ligand>;
            pub fn iter(&self) -> std::slice::Iter<'_, Ligand>;
        }
    }

    /// Output keys in canonical order
    pub fn keys(&self) -> Vec<&str> {
        self.ligands.iter().map(Ligand::key).collect()
    }

    /// Canonical index of a ligand by its output key
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.ligands.iter().position(|ligand| ligand.key() == key)
    }
}

impl std::ops::Index<usize> for LigandSet {
    type Output = Ligand;

    fn index(&self, index: usize) -> &Self::Output {
        &self.ligands[index]
    }
}

impl FromIterator<Ligand> for LigandSet {
    fn from_iter<T: IntoIterator<Item = Ligand>>(iter: T) -> Self {
        LigandSet::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a LigandSet {
    type Item = &'a Ligand;
    type IntoIter = std::slice::Iter<'a, Ligand>;

    fn into_iter(self) -> Self::IntoIter {
        self.ligands.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::ligand::*;

    fn atom(name: &str, element: Element, x: f64) -> (LigandAtom, Vector3) {
        (LigandAtom {name: name.to_owned(), element}, Vector3::new(x, 0.0, 0.0))
    }

    fn carbon_dioxide() -> Ligand {
        Ligand::new(
            "L.1".to_owned(), "CO2".to_owned(), "L".to_owned(), ResidueNumber::new(1),
            vec![
                atom("O1", Element::OXYGEN, -1.16),
                atom("C", Element::CARBON, 0.0),
                atom("O2", Element::OXYGEN, 1.16),
            ],
            &[(0, 1, BondOrder::Double), (1, 2, BondOrder::Double), (2, 1, BondOrder::Double)]
        ).expect("Valid ligand")
    }

    #[test]
    fn graph_basics() {
        let ligand = carbon_dioxide();
        assert_eq!(ligand.size(), 3);
        assert_eq!(ligand.bond_count(), 2);
        assert_eq!(ligand.degree(Nucleus(1)), 2);
        assert!(ligand.has_bond(Nucleus(2), Nucleus(1)));
        assert!(!ligand.has_bond(Nucleus(0), Nucleus(2)));
        assert_eq!(ligand.element(Nucleus(1)), Element::CARBON);
        assert!(ligand.is_connected());
        assert_eq!(ligand.element_counts()[&Element::OXYGEN], 2);
        assert_eq!(ligand.number(), ResidueNumber::new(1));
        assert_eq!(ligand.atom(Nucleus(2)).map(|a| a.name.as_str()), Some("O2"));
        assert_eq!(ligand.atom(Nucleus(3)), None);

        let mut neighbors: Vec<Nucleus> = ligand.neighbors(Nucleus(1)).collect();
        neighbors.sort();
        assert_eq!(neighbors, vec![Nucleus(0), Nucleus(2)]);
    }

    #[test]
    fn components() {
        let ligand = Ligand::new(
            "x".to_owned(), "X".to_owned(), "L".to_owned(), ResidueNumber::new(1),
            vec![atom("C1", Element::CARBON, 0.0), atom("C2", Element::CARBON, 1.5), atom("C3", Element::CARBON, 9.0)],
            &[(0, 1, BondOrder::Single)]
        ).expect("Valid ligand");
        assert_eq!(ligand.component_count(), 2);
        assert!(!ligand.is_connected());
    }

    #[test]
    fn invalid_bonds() {
        let make = |bonds: &[(usize, usize, BondOrder)]| Ligand::new(
            "x".to_owned(), "X".to_owned(), "L".to_owned(), ResidueNumber::new(1),
            vec![atom("C1", Element::CARBON, 0.0)],
            bonds
        );
        assert_eq!(make(&[(0, 3, BondOrder::Single)]).err(), Some(LigandError::BondOutOfRange(0, 3, 1)));
        assert_eq!(make(&[(0, 0, BondOrder::Single)]).err(), Some(LigandError::SelfBond(0)));
        assert!(Ligand::new("x".to_owned(), "X".to_owned(), "L".to_owned(), ResidueNumber::new(1), vec![], &[]).is_err());
    }

    #[test]
    fn ligand_set_lookup() {
        let set: LigandSet = [carbon_dioxide()].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(set.keys(), vec!["L.1"]);
        assert_eq!(set.index_of("L.1"), Some(0));
        assert_eq!(set.index_of("L.2"), None);
        assert_eq!(set[0].identity(), "CO2");
    }
}
