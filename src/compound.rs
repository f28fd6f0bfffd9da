//! Compound dictionary access
//!
//! The dictionary is an injected, read-only dependency: extraction borrows it
//! for the duration of a run and never mutates it.

use std::collections::HashMap;

use crate::structure::{BondOrder, Element};

/// Expected chemistry of a residue name
#[derive(Clone, Debug, PartialEq)]
pub struct Compound {
    pub id: String,
    /// Atom names with their elements, hydrogens included
    pub atoms: Vec<(String, Element)>,
    /// Bonds between atom names
    pub bonds: Vec<(String, String, BondOrder)>
}

impl Compound {
    pub fn new(id: &str) -> Compound {
        Compound {id: id.to_owned(), atoms: Vec::new(), bonds: Vec::new()}
    }

    pub fn with_atom(mut self, name: &str, element: Element) -> Compound {
        self.atoms.push((name.to_owned(), element));
        self
    }

    pub fn with_bond(mut self, a: &str, b: &str, order: BondOrder) -> Compound {
        self.bonds.push((a.to_owned(), b.to_owned(), order));
        self
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atoms.iter().any(|(atom, _)| atom == name)
    }

    /// Bonds touching only atoms in `present`, as pairs of positions within `present`
    pub fn bonds_between(&self, present: &[&str]) -> Vec<(usize, usize, BondOrder)> {
        let position = |name: &str| present.iter().position(|p| *p == name);
        self.bonds.iter()
            .filter_map(|(a, b, order)| Some((position(a)?, position(b)?, *order)))
            .collect()
    }
}

/// Lookup of compounds by residue name
pub trait CompoundLibrary: Sync {
    fn find_compound(&self, name: &str) -> Option<&Compound>;
}

/// In-memory compound dictionary
#[derive(Clone, Debug, Default)]
pub struct CompoundDictionary {
    compounds: HashMap<String, Compound>
}

impl CompoundDictionary {
    pub fn new() -> CompoundDictionary {
        CompoundDictionary::default()
    }

    /// Add or replace a compound
    pub fn insert(&mut self, compound: Compound) {
        self.compounds.insert(compound.id.clone(), compound);
    }

    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }
}

impl FromIterator<Compound> for CompoundDictionary {
    fn from_iter<T: IntoIterator<Item = Compound>>(iter: T) -> Self {
        let mut dictionary = CompoundDictionary::new();
        for compound in iter {
            dictionary.insert(compound);
        }
        dictionary
    }
}

impl CompoundLibrary for CompoundDictionary {
    fn find_compound(&self, name: &str) -> Option<&Compound> {
        self.compounds.get(name)
    }
}
