//! Reference to model chain and residue correspondence
//!
//! Polymer chains of equal kind are aligned pairwise, either by global
//! sequence alignment or by residue numbers. The global chain mapping
//! maximizes the summed number of identical aligned residues.

use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::structure::{Chain, ResidueHandle, Structure};

/// Linear gap Needleman-Wunsch scores
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AlignmentScoring {
    pub matched: i32,
    pub mismatched: i32,
    pub gap: i32
}

impl Default for AlignmentScoring {
    fn default() -> Self {
        AlignmentScoring {matched: 2, mismatched: -1, gap: -2}
    }
}

/// Aligned residue positions of two chains
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alignment {
    /// Aligned (reference residue, model residue) chain positions, ascending
    pub pairs: Vec<(usize, usize)>,
    /// Number of aligned pairs with identical one-letter codes
    pub identical: usize
}

impl Alignment {
    pub fn model_residue(&self, reference_residue: usize) -> Option<usize> {
        self.pairs.binary_search_by_key(&reference_residue, |(r, _)| *r)
            .ok()
            .map(|i| self.pairs[i].1)
    }
}

/// Global alignment of two sequences, returning aligned index pairs
pub fn global_align(a: &[char], b: &[char], scoring: &AlignmentScoring) -> Vec<(usize, usize)> {
    let (n, m) = (a.len(), b.len());
    let mut table = vec![vec![0i32; m + 1]; n + 1];
    for i in 1..=n {
        table[i][0] = scoring.gap * i as i32;
    }
    for j in 1..=m {
        table[0][j] = scoring.gap * j as i32;
    }

    let substitution = |i: usize, j: usize| match a[i] == b[j] {
        true => scoring.matched,
        false => scoring.mismatched
    };

    for i in 1..=n {
        for j in 1..=m {
            let diagonal = table[i - 1][j - 1] + substitution(i - 1, j - 1);
            let up = table[i - 1][j] + scoring.gap;
            let left = table[i][j - 1] + scoring.gap;
            table[i][j] = diagonal.max(up).max(left);
        }
    }

    // Traceback preferring diagonal moves
    let mut pairs = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        if table[i][j] == table[i - 1][j - 1] + substitution(i - 1, j - 1) {
            pairs.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if table[i][j] == table[i - 1][j] + scoring.gap {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    pairs.reverse();
    pairs
}

/// Polymer residue positions of a chain and their one-letter sequence
fn polymer_sequence(chain: &Chain) -> (Vec<usize>, Vec<char>) {
    chain.residues.iter()
        .enumerate()
        .filter(|(_, residue)| residue.is_polymer())
        .map(|(i, residue)| (i, residue.one_letter_code()))
        .unzip()
}

fn align_by_sequence(reference: &Chain, model: &Chain) -> Alignment {
    let (reference_positions, reference_sequence) = polymer_sequence(reference);
    let (model_positions, model_sequence) = polymer_sequence(model);

    let aligned = global_align(&reference_sequence, &model_sequence, &AlignmentScoring::default());
    let identical = aligned.iter()
        .filter(|&&(i, j)| reference_sequence[i] == model_sequence[j])
        .count();
    let pairs = aligned.into_iter()
        .map(|(i, j)| (reference_positions[i], model_positions[j]))
        .collect();

    Alignment {pairs, identical}
}

fn align_by_number(reference: &Chain, model: &Chain) -> Alignment {
    let model_positions: HashMap<_, _> = model.residues.iter()
        .enumerate()
        .filter(|(_, residue)| residue.is_polymer())
        .map(|(j, residue)| (residue.number, j))
        .collect();

    let mut alignment = Alignment::default();
    for (i, residue) in reference.residues.iter().enumerate().filter(|(_, r)| r.is_polymer()) {
        if let Some(&j) = model_positions.get(&residue.number) {
            alignment.pairs.push((i, j));
            if residue.one_letter_code() == model.residues[j].one_letter_code() {
                alignment.identical += 1;
            }
        }
    }
    alignment
}

/// Minimal cost assignment of rows onto columns of a square cost matrix
fn assign(v: usize, cost_fn: &dyn Fn(usize, usize) -> f64) -> Vec<usize> {
    let brute_force = || {
        (0..v).permutations(v)
            .min_by(|p, q| {
                let cost = |sigma: &Vec<usize>| sigma.iter().enumerate().map(|(i, &j)| cost_fn(i, j)).sum::<f64>();
                cost(p).total_cmp(&cost(q))
            })
            .unwrap_or_default()
    };

    if v <= 3 {
        return brute_force();
    }

    let costs = lapjv::Matrix::from_shape_fn((v, v), |(i, j)| cost_fn(i, j));
    match lapjv::lapjv(&costs) {
        Ok((forward_sigma, _)) => forward_sigma,
        Err(e) => {
            debug!(error = ?e, "Jonker-Volgenant failed, enumerating chain assignments");
            brute_force()
        }
    }
}

/// Correspondence of reference polymer chains and residues onto a model
#[derive(Clone, Debug, Default)]
pub struct ChainMapping {
    /// Globally mapped (reference chain, model chain) pairs, ascending
    chain_pairs: Vec<(usize, usize)>,
    /// Alignments of every pair of chains with equal polymer kind
    alignments: HashMap<(usize, usize), Alignment>
}

/// Chain name pairs of a mapping, for reporting
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainPair {
    pub reference: String,
    pub model: String
}

impl ChainMapping {
    pub fn new(reference: &Structure, model: &Structure, resnum_alignments: bool) -> ChainMapping {
        let mut alignments = HashMap::new();
        for ((r, reference_chain), (m, model_chain)) in reference.chains.iter().enumerate().cartesian_product(model.chains.iter().enumerate()) {
            let kind = match reference_chain.polymer_kind() {
                Some(kind) => kind,
                None => continue
            };
            if model_chain.polymer_kind() != Some(kind) {
                continue;
            }

            let alignment = match resnum_alignments {
                true => align_by_number(reference_chain, model_chain),
                false => align_by_sequence(reference_chain, model_chain)
            };
            if !alignment.pairs.is_empty() {
                alignments.insert((r, m), alignment);
            }
        }

        // Prefer identity, then alignment length
        let weight = |r: usize, m: usize| alignments.get(&(r, m))
            .map_or(0.0, |a: &Alignment| a.identical as f64 + 1e-3 * a.pairs.len() as f64);
        let v = reference.chains.len().max(model.chains.len());
        let sigma = assign(v, &|i, j| -weight(i, j));
        let chain_pairs: Vec<(usize, usize)> = sigma.into_iter()
            .enumerate()
            .filter(|&(r, m)| alignments.contains_key(&(r, m)))
            .collect();

        debug!(
            mapped = chain_pairs.len(),
            reference_chains = reference.chains.len(),
            model_chains = model.chains.len(),
            "Mapped polymer chains"
        );

        ChainMapping {chain_pairs, alignments}
    }

    pub fn chain_pairs(&self) -> &[(usize, usize)] {
        &self.chain_pairs
    }

    pub fn model_chain(&self, reference_chain: usize) -> Option<usize> {
        self.chain_pairs.iter()
            .find(|(r, _)| *r == reference_chain)
            .map(|(_, m)| *m)
    }

    /// Model chains with any alignment to a reference chain, best identity first
    pub fn candidate_chains(&self, reference_chain: usize) -> Vec<usize> {
        self.alignments.iter()
            .filter(|((r, _), _)| *r == reference_chain)
            .map(|((_, m), alignment)| (*m, alignment.identical))
            .sorted_by_key(|&(m, identical)| (std::cmp::Reverse(identical), m))
            .map(|(m, _)| m)
            .collect()
    }

    pub fn alignment(&self, reference_chain: usize, model_chain: usize) -> Option<&Alignment> {
        self.alignments.get(&(reference_chain, model_chain))
    }

    /// Model residue of a reference residue under the global chain mapping
    pub fn map_residue(&self, handle: ResidueHandle) -> Option<ResidueHandle> {
        self.map_residue_onto(handle, self.model_chain(handle.chain)?)
    }

    /// Model residue of a reference residue on a specific model chain
    pub fn map_residue_onto(&self, handle: ResidueHandle, model_chain: usize) -> Option<ResidueHandle> {
        let residue = self.alignment(handle.chain, model_chain)?.model_residue(handle.residue)?;
        Some(ResidueHandle {chain: model_chain, residue})
    }

    /// Reference residue mapped onto a model residue, inverse of `map_residue`
    pub fn reference_residue(&self, model_handle: ResidueHandle) -> Option<ResidueHandle> {
        let (reference_chain, _) = self.chain_pairs.iter().find(|(_, m)| *m == model_handle.chain)?;
        let alignment = self.alignment(*reference_chain, model_handle.chain)?;
        alignment.pairs.iter()
            .find(|(_, j)| *j == model_handle.residue)
            .map(|(i, _)| ResidueHandle {chain: *reference_chain, residue: *i})
    }

    pub fn named_pairs(&self, reference: &Structure, model: &Structure) -> Vec<ChainPair> {
        self.chain_pairs.iter()
            .filter_map(|&(r, m)| Some(ChainPair {
                reference: reference.chains.get(r)?.name.clone(),
                model: model.chains.get(m)?.name.clone()
            }))
            .collect()
    }
}
