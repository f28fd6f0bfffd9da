//! Symmetry-aware atom correspondences between a reference and a model ligand
//!
//! A depth-first search enumerates all element- and bond-consistent mappings
//! of reference atoms onto model atoms. For identical graphs these are the
//! automorphisms, for partially resolved reference ligands they are the
//! node-induced subgraph embeddings into the model. The search stops as soon
//! as the number of mappings exceeds the configured cap.

use std::collections::VecDeque;

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::ligand::Ligand;
use crate::strong::{Index, Nucleus};

/// Reasons why no correspondence could be established
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MatchFailure {
    #[error("No graph isomorphism between the ligands")]
    NoIsomorphism,
    #[error("More symmetries than the configured maximum")]
    TooManySymmetries,
    #[error("Ligand graph is disconnected")]
    DisconnectedGraph,
    #[error("Element composition of the ligands is incompatible")]
    ElementMismatch
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchSettings {
    /// Allow the reference ligand to be a subgraph of the model ligand
    pub substructure_match: bool,
    /// Upper bound on the number of enumerated correspondences
    pub max_symmetries: usize
}

impl Default for MatchSettings {
    fn default() -> Self {
        MatchSettings {substructure_match: false, max_symmetries: 100_000}
    }
}

/// Mapping from reference ligand atoms to model ligand atoms
///
/// Pairs are kept sorted by reference atom.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Correspondence {
    pairs: Vec<(Nucleus, Nucleus)>
}

impl Correspondence {
    /// Sort pairs by reference atom
    ///
    /// Yields `None` if either side repeats an atom.
    pub fn new(mut pairs: Vec<(Nucleus, Nucleus)>) -> Option<Correspondence> {
        pairs.sort();
        let injective = pairs.iter().map(|(r, _)| r).all_unique()
            && pairs.iter().map(|(_, m)| m).all_unique();
        injective.then_some(Correspondence {pairs})
    }

    /// Identity mapping of `n` atoms
    pub fn identity(n: usize) -> Correspondence {
        Correspondence {pairs: (0..n).map(|i| (Nucleus(i), Nucleus(i))).collect()}
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(Nucleus, Nucleus)] {
        &self.pairs
    }

    /// Model atom mapped onto a reference atom
    pub fn model_of(&self, reference: Nucleus) -> Option<Nucleus> {
        self.pairs.binary_search_by_key(&reference, |(r, _)| *r)
            .ok()
            .map(|i| self.pairs[i].1)
    }

    /// Reference atom mapped onto a model atom
    pub fn reference_of(&self, model: Nucleus) -> Option<Nucleus> {
        self.pairs.iter().find(|(_, m)| *m == model).map(|(r, _)| *r)
    }

    /// Check that every pair is in range of the two ligands and element-consistent
    pub fn is_consistent_with(&self, reference: &Ligand, model: &Ligand) -> bool {
        self.pairs.iter().all(|&(r, m)| {
            r.position() < reference.size()
                && m.position() < model.size()
                && reference.element(r) == model.element(m)
        })
    }
}

/// All correspondences found for a ligand pair
#[derive(Clone, Debug, PartialEq)]
pub struct Symmetries {
    /// Candidate correspondences in search order
    pub correspondences: Vec<Correspondence>,
    /// Fraction of model ligand atoms covered by the correspondences
    pub coverage: f64,
    /// Whether the correspondences are subgraph embeddings rather than isomorphisms
    pub is_substructure: bool
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mode {
    /// Equal graphs
    Isomorphism,
    /// Reference is a node-induced subgraph of the model
    Induced
}

enum Outcome {
    Found(Vec<Correspondence>),
    /// More correspondences than the cap
    Overflow,
    /// Node budget spent before the search completed
    Exhausted
}

/// Find all atom correspondences between a reference and a model ligand
pub fn find_symmetries(reference: &Ligand, model: &Ligand, settings: &MatchSettings) -> Result<Symmetries, MatchFailure> {
    if !reference.is_connected() || !model.is_connected() {
        return Err(MatchFailure::DisconnectedGraph);
    }

    let reference_counts = reference.element_counts();
    let model_counts = model.element_counts();
    let contained = reference_counts.iter()
        .all(|(element, count)| model_counts.get(element).map_or(false, |available| available >= count));

    if reference_counts == model_counts {
        return match Search::new(reference, model, Mode::Isomorphism, settings.max_symmetries).run() {
            Outcome::Overflow | Outcome::Exhausted => Err(MatchFailure::TooManySymmetries),
            Outcome::Found(found) if found.is_empty() => Err(MatchFailure::NoIsomorphism),
            Outcome::Found(correspondences) => Ok(Symmetries {correspondences, coverage: 1.0, is_substructure: false})
        };
    }

    if !contained {
        return Err(MatchFailure::ElementMismatch);
    }

    if !settings.substructure_match {
        // Distinguish a partial ligand (worth a hint) from an unrelated one.
        // The first embedding ends the search, an unfinished search gives no hint.
        let hint = Search::new(reference, model, Mode::Induced, 0)
            .with_node_budget(settings.max_symmetries)
            .run();
        return match hint {
            Outcome::Overflow => Err(MatchFailure::NoIsomorphism),
            Outcome::Found(_) | Outcome::Exhausted => Err(MatchFailure::ElementMismatch)
        };
    }

    match Search::new(reference, model, Mode::Induced, settings.max_symmetries).run() {
        Outcome::Overflow | Outcome::Exhausted => Err(MatchFailure::TooManySymmetries),
        Outcome::Found(found) if found.is_empty() => Err(MatchFailure::NoIsomorphism),
        Outcome::Found(correspondences) => {
            let coverage = reference.size() as f64 / model.size() as f64;
            Ok(Symmetries {correspondences, coverage, is_substructure: true})
        }
    }
}

/// Backtracking state of a single search
struct Search<'a> {
    reference: &'a Ligand,
    model: &'a Ligand,
    mode: Mode,
    cap: usize,
    /// Reference atoms in the order they are mapped
    order: Vec<Nucleus>,
    /// For each entry of `order`, an earlier-mapped neighbor, if any
    anchors: Vec<Option<Nucleus>>,
    reference_to_model: Vec<Option<Nucleus>>,
    model_used: Vec<bool>,
    found: Vec<Correspondence>,
    overflow: bool,
    /// Maximum number of partial mappings to extend
    node_budget: usize,
    nodes: usize,
    exhausted: bool
}

impl<'a> Search<'a> {
    fn new(reference: &'a Ligand, model: &'a Ligand, mode: Mode, cap: usize) -> Search<'a> {
        let (order, anchors) = search_order(reference, model);
        Search {
            reference,
            model,
            mode,
            cap,
            order,
            anchors,
            reference_to_model: vec![None; reference.size()],
            model_used: vec![false; model.size()],
            found: Vec::new(),
            overflow: false,
            node_budget: usize::MAX,
            nodes: 0,
            exhausted: false
        }
    }

    fn with_node_budget(mut self, node_budget: usize) -> Search<'a> {
        self.node_budget = node_budget;
        self
    }

    fn run(mut self) -> Outcome {
        if self.reference.size() <= self.model.size() {
            self.extend(0);
        }

        match (self.overflow, self.exhausted) {
            (true, _) => Outcome::Overflow,
            (false, true) => Outcome::Exhausted,
            (false, false) => Outcome::Found(self.found)
        }
    }

    fn extend(&mut self, depth: usize) {
        if self.overflow || self.exhausted {
            return;
        }

        if depth == self.order.len() {
            if self.found.len() >= self.cap {
                self.overflow = true;
                return;
            }

            let pairs = self.reference_to_model.iter()
                .enumerate()
                .filter_map(|(r, m)| m.map(|m| (Nucleus(r), m)))
                .collect();
            self.found.push(Correspondence {pairs});
            return;
        }

        let r = self.order[depth];
        for m in self.candidates(depth) {
            if !self.is_feasible(r, m) {
                continue;
            }

            if self.nodes == self.node_budget {
                self.exhausted = true;
                return;
            }
            self.nodes += 1;

            self.reference_to_model[r.position()] = Some(m);
            self.model_used[m.position()] = true;

            self.extend(depth + 1);

            self.reference_to_model[r.position()] = None;
            self.model_used[m.position()] = false;

            if self.overflow || self.exhausted {
                return;
            }
        }
    }

    /// Unused model atoms that may take the reference atom at `depth`, ascending
    fn candidates(&self, depth: usize) -> Vec<Nucleus> {
        match self.anchors[depth].and_then(|anchor| self.reference_to_model[anchor.position()]) {
            Some(mapped_anchor) => self.model.neighbors(mapped_anchor)
                .filter(|m| !self.model_used[m.position()])
                .sorted()
                .collect(),
            None => self.model.nuclei()
                .filter(|m| !self.model_used[m.position()])
                .collect()
        }
    }

    fn is_feasible(&self, r: Nucleus, m: Nucleus) -> bool {
        if self.reference.element(r) != self.model.element(m) {
            return false;
        }

        let (reference_degree, model_degree) = (self.reference.degree(r), self.model.degree(m));
        let degree_ok = match self.mode {
            Mode::Isomorphism => reference_degree == model_degree,
            Mode::Induced => reference_degree <= model_degree
        };
        if !degree_ok {
            return false;
        }

        // Every mapped reference neighbor must be bonded to m in the model
        let mut mapped_reference_neighbors = 0;
        for neighbor in self.reference.neighbors(r) {
            if let Some(mapped) = self.reference_to_model[neighbor.position()] {
                if !self.model.has_bond(m, mapped) {
                    return false;
                }
                mapped_reference_neighbors += 1;
            }
        }

        // And m must have no further bonds to mapped atoms
        let mapped_model_neighbors = self.model.neighbors(m)
            .filter(|n| self.model_used[n.position()])
            .count();

        mapped_model_neighbors == mapped_reference_neighbors
    }
}

/// Breadth-first mapping order starting from the reference atom with the
/// rarest element in the model, so that every later atom has a mapped anchor
fn search_order(reference: &Ligand, model: &Ligand) -> (Vec<Nucleus>, Vec<Option<Nucleus>>) {
    let model_counts = model.element_counts();
    let n = reference.size();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut anchors = Vec::with_capacity(n);

    let rarity = |r: &Nucleus| {
        let count = model_counts.get(&reference.element(*r)).copied().unwrap_or(0);
        (count, std::cmp::Reverse(reference.degree(*r)), *r)
    };

    while order.len() < n {
        let start = match reference.nuclei().filter(|r| !visited[r.position()]).min_by_key(rarity) {
            Some(start) => start,
            None => break
        };

        let mut queue = VecDeque::from([(start, None)]);
        visited[start.position()] = true;
        while let Some((r, anchor)) = queue.pop_front() {
            order.push(r);
            anchors.push(anchor);
            for neighbor in reference.neighbors(r).sorted() {
                if !visited[neighbor.position()] {
                    visited[neighbor.position()] = true;
                    queue.push_back((neighbor, Some(r)));
                }
            }
        }
    }

    (order, anchors)
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::ligand::{Ligand, LigandAtom};
    use crate::matching::*;
    use crate::quaternions::Vector3;
    use crate::structure::{BondOrder, Element, ResidueNumber};

    /// Build a ligand from element symbols, bonds and optional coordinates on a line
    pub(crate) fn ligand(key: &str, elements: &[Element], bonds: &[(usize, usize)]) -> Ligand {
        let atoms = elements.iter()
            .enumerate()
            .map(|(i, &element)| {
                let atom = LigandAtom {name: format!("{}{}", element, i + 1), element};
                let angle = i as f64 * 0.7;
                (atom, Vector3::new(1.5 * angle.cos(), 1.5 * angle.sin(), 0.3 * i as f64))
            })
            .collect();
        let bonds: Vec<_> = bonds.iter().map(|&(a, b)| (a, b, BondOrder::Single)).collect();
        Ligand::new(key.to_owned(), key.to_owned(), "L".to_owned(), ResidueNumber::new(1), atoms, &bonds)
            .expect("Valid test ligand")
    }

    const C: Element = Element::CARBON;
    const N: Element = Element::NITROGEN;
    const O: Element = Element::OXYGEN;

    fn benzene() -> Ligand {
        ligand("BNZ", &[C; 6], &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)])
    }

    /// Ten heavy atom chain-and-ring: phenyl ring with an ethanolamine tail
    pub(crate) fn ten_atoms() -> Ligand {
        ligand(
            "TEN",
            &[C, C, C, C, C, C, C, C, N, O],
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 6), (6, 7), (7, 8), (8, 9)]
        )
    }

    /// The first eight atoms of `ten_atoms`
    pub(crate) fn eight_of_ten() -> Ligand {
        ligand(
            "TEN",
            &[C, C, C, C, C, C, C, C],
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 6), (6, 7)]
        )
    }

    fn settings(substructure_match: bool, max_symmetries: usize) -> MatchSettings {
        MatchSettings {substructure_match, max_symmetries}
    }

    #[test]
    fn identical_asymmetric_ligands() {
        let a = ligand("X", &[C, N, O], &[(0, 1), (1, 2)]);
        let symmetries = find_symmetries(&a, &a, &MatchSettings::default()).expect("Isomorphic");
        assert_eq!(symmetries.correspondences, vec![Correspondence::identity(3)]);
        assert_eq!(symmetries.coverage, 1.0);
        assert!(!symmetries.is_substructure);
    }

    #[test]
    fn permuted_atom_order() {
        let a = ligand("X", &[C, N, O], &[(0, 1), (1, 2)]);
        let b = ligand("X", &[O, C, N], &[(0, 2), (2, 1)]);
        let symmetries = find_symmetries(&a, &b, &MatchSettings::default()).expect("Isomorphic");
        let only = &symmetries.correspondences[0];
        assert_eq!(symmetries.correspondences.len(), 1);
        assert_eq!(only.model_of(Nucleus(0)), Some(Nucleus(1)));
        assert_eq!(only.model_of(Nucleus(1)), Some(Nucleus(2)));
        assert_eq!(only.model_of(Nucleus(2)), Some(Nucleus(0)));
        assert_eq!(only.reference_of(Nucleus(0)), Some(Nucleus(2)));
        assert!(only.is_consistent_with(&a, &b));
    }

    #[test]
    fn ring_automorphisms_and_cap() {
        let ring = benzene();
        // Dihedral group of the hexagon
        let symmetries = find_symmetries(&ring, &ring, &settings(false, 12)).expect("Within cap");
        assert_eq!(symmetries.correspondences.len(), 12);
        assert!(symmetries.correspondences.iter().all_unique());

        assert_eq!(find_symmetries(&ring, &ring, &settings(false, 11)), Err(MatchFailure::TooManySymmetries));
    }

    #[test]
    fn substructure_only_when_enabled() {
        let reference = eight_of_ten();
        let model = ten_atoms();

        let partial = find_symmetries(&reference, &model, &settings(true, 1000)).expect("Subgraph");
        approx::assert_relative_eq!(partial.coverage, 0.8);
        assert!(partial.is_substructure);
        // Mirror image of the ring about the substituent axis
        assert_eq!(partial.correspondences.len(), 2);

        assert_eq!(find_symmetries(&reference, &model, &settings(false, 1000)), Err(MatchFailure::NoIsomorphism));
    }

    #[test]
    fn partial_ligand_hint_is_bounded() {
        let reference = eight_of_ten();
        let model = ten_atoms();
        // Eight atoms need at least eight extensions before an embedding is known
        assert_eq!(find_symmetries(&reference, &model, &settings(false, 4)), Err(MatchFailure::ElementMismatch));
        assert_eq!(find_symmetries(&reference, &model, &settings(false, 8)), Err(MatchFailure::NoIsomorphism));
    }

    #[test]
    fn induced_subgraph_required() {
        // Open chain is not an induced subgraph of the closed ring
        let chain = ligand("C3", &[C, C, C], &[(0, 1), (1, 2)]);
        let triangle = ligand("C3R", &[C, C, C, N], &[(0, 1), (1, 2), (2, 0), (0, 3)]);
        assert_eq!(find_symmetries(&chain, &triangle, &settings(true, 100)), Err(MatchFailure::NoIsomorphism));
    }

    #[test]
    fn failure_classes() {
        let a = ligand("X", &[C, N, O], &[(0, 1), (1, 2)]);
        let cyclic = ligand("X", &[C, N, O], &[(0, 1), (1, 2), (2, 0)]);
        assert_eq!(find_symmetries(&a, &cyclic, &MatchSettings::default()), Err(MatchFailure::NoIsomorphism));

        let sulfur = ligand("S", &[C, Element::SULFUR], &[(0, 1)]);
        assert_eq!(find_symmetries(&a, &sulfur, &settings(true, 100)), Err(MatchFailure::ElementMismatch));

        let disconnected = ligand("X", &[C, N, O], &[(0, 1)]);
        assert_eq!(find_symmetries(&disconnected, &a, &MatchSettings::default()), Err(MatchFailure::DisconnectedGraph));
        assert_eq!(find_symmetries(&a, &disconnected, &MatchSettings::default()), Err(MatchFailure::DisconnectedGraph));
    }

    #[test]
    fn single_atoms() {
        let zinc = ligand("ZN", &[Element::from_symbol("Zn").unwrap()], &[]);
        let symmetries = find_symmetries(&zinc, &zinc, &MatchSettings::default()).expect("Trivially isomorphic");
        assert_eq!(symmetries.correspondences.len(), 1);
    }

    #[test]
    fn correspondence_construction() {
        assert!(Correspondence::new(vec![(Nucleus(1), Nucleus(0)), (Nucleus(0), Nucleus(1))]).is_some());
        assert!(Correspondence::new(vec![(Nucleus(1), Nucleus(0)), (Nucleus(0), Nucleus(0))]).is_none());
        let sorted = Correspondence::new(vec![(Nucleus(2), Nucleus(0)), (Nucleus(0), Nucleus(1))]).unwrap();
        assert_eq!(sorted.pairs()[0], (Nucleus(0), Nucleus(1)));
        assert_eq!(sorted.model_of(Nucleus(1)), None);
    }

    #[test]
    fn correspondence_serializes_plain_indices() {
        let correspondence = Correspondence::new(vec![(Nucleus(2), Nucleus(0)), (Nucleus(0), Nucleus(1))]).unwrap();
        let value = toml::Value::try_from(&correspondence).unwrap();
        let expected: toml::Value = toml::from_str("pairs = [[0, 1], [2, 0]]").unwrap();
        assert_eq!(value, expected);
    }
}
