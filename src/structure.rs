//! Loaded macromolecular structure as handed over by the file readers
//!
//! Chains hold residues, residues hold atoms. Residues flagged as ligands are
//! candidates for ligand extraction, polymer residues form binding sites.

extern crate nalgebra as na;

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::quaternions::{Matrix3N, Vector3};

/// Chemical element, stored as an upper-case symbol of up to two letters
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element([u8; 2]);

impl Element {
    pub const HYDROGEN: Element = Element(*b"H\0");
    pub const DEUTERIUM: Element = Element(*b"D\0");
    pub const CARBON: Element = Element(*b"C\0");
    pub const NITROGEN: Element = Element(*b"N\0");
    pub const OXYGEN: Element = Element(*b"O\0");
    pub const PHOSPHORUS: Element = Element(*b"P\0");
    pub const SULFUR: Element = Element(*b"S\0");

    /// Parse an element symbol, case-insensitively
    ///
    /// ```
    /// # use ligscore::structure::Element;
    /// assert_eq!(Element::from_symbol("Cl"), Element::from_symbol("CL"));
    /// assert_eq!(Element::from_symbol("c"), Some(Element::CARBON));
    /// assert_eq!(Element::from_symbol("Xyz"), None);
    /// ```
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        let symbol = symbol.trim();
        let bytes = symbol.as_bytes();
        if bytes.is_empty() || bytes.len() > 2 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return None;
        }

        let mut packed = [0u8; 2];
        for (slot, byte) in packed.iter_mut().zip(bytes) {
            *slot = byte.to_ascii_uppercase();
        }
        Some(Element(packed))
    }

    /// Upper-case element symbol
    pub fn symbol(&self) -> &str {
        let len = if self.0[1] == 0 { 1 } else { 2 };
        std::str::from_utf8(&self.0[..len]).unwrap_or("X")
    }

    /// Hydrogen and deuterium are both treated as hydrogens
    pub fn is_hydrogen(&self) -> bool {
        *self == Element::HYDROGEN || *self == Element::DEUTERIUM
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.symbol())
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

/// Bond order information
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
    /// Connectivity is known, the order is not
    Unknown
}

/// Residue sequence number with optional insertion code
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResidueNumber {
    pub num: i32,
    pub ins_code: Option<char>
}

impl ResidueNumber {
    pub fn new(num: i32) -> ResidueNumber {
        ResidueNumber {num, ins_code: None}
    }
}

impl From<i32> for ResidueNumber {
    fn from(num: i32) -> Self {
        ResidueNumber::new(num)
    }
}

impl fmt::Display for ResidueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ins_code {
            Some(code) => write!(f, "{}{}", self.num, code),
            None => write!(f, "{}", self.num)
        }
    }
}

/// Residue identity across the structure, e.g. `A.42`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResidueKey {
    pub chain: String,
    pub number: ResidueNumber
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.chain, self.number)
    }
}

/// Position of a residue within a structure's chains
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueHandle {
    pub chain: usize,
    pub residue: usize
}

/// Chemical class of a residue
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ResidueKind {
    Peptide,
    Nucleotide,
    NonPolymer,
    Water
}

lazy_static! {
    static ref ONE_LETTER_CODES: HashMap<&'static str, char> = HashMap::from([
        ("ALA", 'A'), ("ARG", 'R'), ("ASN", 'N'), ("ASP", 'D'), ("CYS", 'C'),
        ("GLN", 'Q'), ("GLU", 'E'), ("GLY", 'G'), ("HIS", 'H'), ("ILE", 'I'),
        ("LEU", 'L'), ("LYS", 'K'), ("MET", 'M'), ("PHE", 'F'), ("PRO", 'P'),
        ("SER", 'S'), ("THR", 'T'), ("TRP", 'W'), ("TYR", 'Y'), ("VAL", 'V'),
        ("MSE", 'M'), ("SEC", 'U'), ("PYL", 'O'),
        ("A", 'A'), ("C", 'C'), ("G", 'G'), ("U", 'U'),
        ("DA", 'A'), ("DC", 'C'), ("DG", 'G'), ("DT", 'T'),
    ]);
}

#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    pub name: String,
    pub element: Element,
    pub position: Vector3
}

impl Atom {
    pub fn new(name: &str, element: Element, position: Vector3) -> Atom {
        Atom {name: name.to_owned(), element, position}
    }
}

/// Explicit bond between two atoms of the same residue, by atom index
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder
}

#[derive(Clone, Debug, PartialEq)]
pub struct Residue {
    pub name: String,
    pub number: ResidueNumber,
    pub kind: ResidueKind,
    /// Annotated as a non-polymer ligand in the source file
    pub is_ligand: bool,
    pub atoms: Vec<Atom>,
    /// Explicit connectivity, e.g. from SDF input. Empty for most residues.
    pub bonds: Vec<Bond>
}

impl Residue {
    pub fn new(name: &str, number: impl Into<ResidueNumber>, kind: ResidueKind) -> Residue {
        Residue {
            name: name.to_owned(),
            number: number.into(),
            kind,
            is_ligand: kind == ResidueKind::NonPolymer,
            atoms: Vec::new(),
            bonds: Vec::new()
        }
    }

    /// Append an atom, builder style
    pub fn with_atom(mut self, name: &str, element: Element, position: Vector3) -> Residue {
        self.atoms.push(Atom::new(name, element, position));
        self
    }

    /// Append an explicit bond between atom indices, builder style
    pub fn with_bond(mut self, a: usize, b: usize, order: BondOrder) -> Residue {
        self.bonds.push(Bond {a, b, order});
        self
    }

    pub fn find_atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|atom| atom.name == name)
    }

    pub fn heavy_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(|atom| !atom.element.is_hydrogen())
    }

    pub fn is_polymer(&self) -> bool {
        matches!(self.kind, ResidueKind::Peptide | ResidueKind::Nucleotide)
    }

    /// Representative backbone atom: CA for peptides, C3' for nucleotides
    pub fn backbone_atom(&self) -> Option<&Atom> {
        match self.kind {
            ResidueKind::Peptide => self.find_atom("CA"),
            ResidueKind::Nucleotide => self.find_atom("C3'"),
            _ => None
        }
    }

    /// One-letter code, `X` for anything non-standard
    pub fn one_letter_code(&self) -> char {
        ONE_LETTER_CODES.get(self.name.as_str()).copied().unwrap_or('X')
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub name: String,
    pub residues: Vec<Residue>
}

impl Chain {
    pub fn new(name: &str) -> Chain {
        Chain {name: name.to_owned(), residues: Vec::new()}
    }

    pub fn with_residue(mut self, residue: Residue) -> Chain {
        self.residues.push(residue);
        self
    }

    /// Polymer residue class of the chain, if it has one
    pub fn polymer_kind(&self) -> Option<ResidueKind> {
        self.residues.iter()
            .find(|residue| residue.is_polymer())
            .map(|residue| residue.kind)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Structure {
    pub chains: Vec<Chain>
}

impl Structure {
    pub fn new(chains: Vec<Chain>) -> Structure {
        Structure {chains}
    }

    pub fn atom_count(&self) -> usize {
        self.chains.iter()
            .flat_map(|chain| chain.residues.iter())
            .map(|residue| residue.atoms.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_count() == 0
    }

    pub fn chain_index(&self, name: &str) -> Option<usize> {
        self.chains.iter().position(|chain| chain.name == name)
    }

    pub fn residue_at(&self, handle: ResidueHandle) -> Option<&Residue> {
        self.chains.get(handle.chain)?.residues.get(handle.residue)
    }

    pub fn key(&self, handle: ResidueHandle) -> Option<ResidueKey> {
        let chain = self.chains.get(handle.chain)?;
        let residue = chain.residues.get(handle.residue)?;
        Some(ResidueKey {chain: chain.name.clone(), number: residue.number})
    }

    pub fn find_residue(&self, key: &ResidueKey) -> Option<ResidueHandle> {
        let chain = self.chain_index(&key.chain)?;
        let residue = self.chains[chain].residues.iter().position(|r| r.number == key.number)?;
        Some(ResidueHandle {chain, residue})
    }

    pub fn residue(&self, key: &ResidueKey) -> Option<&Residue> {
        self.residue_at(self.find_residue(key)?)
    }

    /// All atoms with the key of their residue
    pub fn atoms(&self) -> impl Iterator<Item = (ResidueKey, &Atom)> {
        self.chains.iter().flat_map(|chain| {
            chain.residues.iter().flat_map(move |residue| {
                let key = ResidueKey {chain: chain.name.clone(), number: residue.number};
                residue.atoms.iter().map(move |atom| (key.clone(), atom))
            })
        })
    }

    /// All residues in chain order
    pub fn residues(&self) -> impl Iterator<Item = (ResidueHandle, &Residue)> {
        self.chains.iter().enumerate().flat_map(|(c, chain)| {
            chain.residues.iter().enumerate().map(move |(r, residue)| (ResidueHandle {chain: c, residue: r}, residue))
        })
    }

    /// Polymer residues with any heavy atom within `radius` of any of `points`
    ///
    /// Residues are yielded in chain order.
    pub fn residues_within(&self, points: &Matrix3N, radius: f64) -> Vec<ResidueHandle> {
        let squared = radius * radius;
        self.residues()
            .filter(|(_, residue)| residue.is_polymer())
            .filter(|(_, residue)| {
                residue.heavy_atoms().any(|atom| {
                    points.column_iter().any(|p| (p - atom.position).norm_squared() <= squared)
                })
            })
            .map(|(handle, _)| handle)
            .collect()
    }
}
