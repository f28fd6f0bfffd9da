//! Binding-site superposed, symmetry-corrected ligand RMSD
//!
//! The backbone atoms of the target binding site and their mapped model
//! counterparts are superposed. The ligand RMSD in that frame is minimized over
//! all candidate atom correspondences.

use itertools::Itertools;
use serde::Serialize;

use crate::chain_mapping::{ChainMapping, ChainPair};
use crate::config::ScrmsdConfig;
use crate::matching::Correspondence;
use crate::quaternions::{self, Matrix3N, Superposition, Transform, Vector3};
use crate::scoring::{AuxData, PairContext, PairScore, PairScorer, ScoreOrder};
use crate::scoring::lddt_pli::preserved_fraction;
use crate::scoring::state::PairState;
use crate::strong::matrix::columns_to_matrix;
use crate::structure::{ResidueHandle, ResidueKey, Structure};

/// Pairwise distance cutoff of the pocket lDDT
const POCKET_INCLUSION_RADIUS: f64 = 15.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScrmsdAux {
    pub rmsd: f64,
    /// lDDT of the pocket backbone, absent if the pocket has no atom pairs
    pub lddt_lp: Option<f64>,
    /// Backbone RMSD of the binding site superposition
    pub bb_rmsd: f64,
    pub transform: Transform,
    pub target_binding_site: Vec<ResidueKey>,
    pub mapped_target_binding_site: Vec<ResidueKey>,
    pub mapped_model_binding_site: Vec<ResidueKey>,
    /// Mapped residue pairs with differing residue names
    pub inconsistent_residues: Vec<(ResidueKey, ResidueKey)>,
    pub chain_mapping: Vec<ChainPair>,
    pub correspondence: Correspondence
}

/// Model chain for each target chain
#[derive(Clone, Debug, PartialEq)]
struct Placement {
    chains: Vec<(usize, usize)>
}

impl Placement {
    fn model_residue(&self, mapping: &ChainMapping, handle: ResidueHandle) -> Option<ResidueHandle> {
        let &(_, model_chain) = self.chains.iter().find(|(r, _)| *r == handle.chain)?;
        mapping.map_residue_onto(handle, model_chain)
    }
}

/// Best superposition found for one placement
struct Candidate<'c> {
    rmsd: f64,
    correspondence: &'c Correspondence,
    superposition: Superposition,
    placement: Placement,
    /// Binding site residues with mapped backbone atoms
    mapped: Vec<(ResidueHandle, ResidueHandle)>
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScrmsdScorer {
    pub bs_radius: f64,
    pub lddt_lp_radius: f64,
    pub full_bs_search: bool
}

fn backbone_position(structure: &Structure, handle: ResidueHandle) -> Option<Vector3> {
    structure.residue_at(handle)?.backbone_atom().map(|atom| atom.position)
}

fn keys(structure: &Structure, handles: impl IntoIterator<Item = ResidueHandle>) -> Vec<ResidueKey> {
    handles.into_iter().filter_map(|handle| structure.key(handle)).collect()
}

/// lDDT over all point pairs closer than the inclusion radius in the reference
///
/// Pairs with unresolved model points count as not preserved.
pub fn lddt(reference: &[Vector3], model: &[Option<Vector3>], inclusion_radius: f64) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0;
    for (i, j) in (0..reference.len()).tuple_combinations() {
        let reference_distance = (reference[i] - reference[j]).norm();
        if reference_distance >= inclusion_radius {
            continue;
        }

        count += 1;
        if let (Some(Some(a)), Some(Some(b))) = (model.get(i), model.get(j)) {
            sum += preserved_fraction(reference_distance, (a - b).norm());
        }
    }

    (count > 0).then(|| sum / count as f64)
}

impl ScrmsdScorer {
    pub fn new(config: &ScrmsdConfig) -> ScrmsdScorer {
        ScrmsdScorer {
            bs_radius: config.bs_radius,
            lddt_lp_radius: config.lddt_lp_radius,
            full_bs_search: config.full_bs_search
        }
    }

    /// Chain placements of the binding site to try
    fn placements(&self, mapping: &ChainMapping, binding_site: &[ResidueHandle]) -> Vec<Placement> {
        if !self.full_bs_search {
            return vec![Placement {chains: mapping.chain_pairs().to_vec()}];
        }

        let involved: Vec<usize> = binding_site.iter().map(|handle| handle.chain).unique().sorted().collect();
        involved.iter()
            .map(|&chain| {
                let mut options: Vec<Option<usize>> = mapping.candidate_chains(chain).into_iter().map(Some).collect();
                options.push(None);
                options
            })
            .multi_cartesian_product()
            .filter(|choice| choice.iter().flatten().all_unique())
            .filter(|choice| choice.iter().any(Option::is_some))
            .map(|choice| Placement {
                chains: involved.iter()
                    .zip(choice)
                    .filter_map(|(&r, m)| Some((r, m?)))
                    .collect()
            })
            .collect()
    }

    fn evaluate<'c>(&self, context: &PairContext<'c>, binding_site: &[ResidueHandle], placement: Placement) -> Option<Candidate<'c>> {
        let mut mapped = Vec::new();
        let mut reference_backbone = Vec::new();
        let mut model_backbone = Vec::new();
        for &handle in binding_site {
            let model_handle = match placement.model_residue(context.chain_mapping, handle) {
                Some(model_handle) => model_handle,
                None => continue
            };
            let reference_position = backbone_position(context.reference_structure, handle);
            let model_position = backbone_position(context.model_structure, model_handle);
            if let (Some(r), Some(m)) = (reference_position, model_position) {
                mapped.push((handle, model_handle));
                reference_backbone.push(r);
                model_backbone.push(m);
            }
        }

        let superposition = quaternions::superpose(&columns_to_matrix(&reference_backbone), &columns_to_matrix(&model_backbone))?;

        let (rmsd, correspondence) = context.symmetries.correspondences.iter()
            .map(|correspondence| (self.ligand_rmsd(context, correspondence, &superposition.transform), correspondence))
            .fold(None, |best: Option<(f64, &Correspondence)>, (rmsd, correspondence)| match best {
                Some((best_rmsd, _)) if best_rmsd <= rmsd => best,
                _ => Some((rmsd, correspondence))
            })?;

        Some(Candidate {rmsd, correspondence, superposition, placement, mapped})
    }

    fn ligand_rmsd(&self, context: &PairContext, correspondence: &Correspondence, transform: &Transform) -> f64 {
        let reference: Matrix3N = context.reference.positions().gather(correspondence.pairs().iter().map(|(r, _)| *r));
        let model: Matrix3N = context.model.positions().gather(correspondence.pairs().iter().map(|(_, m)| *m));
        quaternions::rmsd(&reference, &transform.apply_matrix(&model))
    }

    /// Pocket backbone lDDT under a placement
    fn pocket_lddt(&self, context: &PairContext, placement: &Placement) -> Option<f64> {
        let pocket = context.reference_structure.residues_within(&context.reference.positions().matrix, self.lddt_lp_radius);
        let (reference, model): (Vec<Vector3>, Vec<Option<Vector3>>) = pocket.into_iter()
            .filter_map(|handle| {
                let reference = backbone_position(context.reference_structure, handle)?;
                let model = placement.model_residue(context.chain_mapping, handle)
                    .and_then(|model_handle| backbone_position(context.model_structure, model_handle));
                Some((reference, model))
            })
            .unzip();

        lddt(&reference, &model, POCKET_INCLUSION_RADIUS)
    }
}

impl PairScorer for ScrmsdScorer {
    fn name(&self) -> &'static str {
        "scrmsd"
    }

    fn score_order(&self) -> ScoreOrder {
        ScoreOrder::LowerIsBetter
    }

    fn score_pair(&self, context: &PairContext) -> Result<PairScore, PairState> {
        context.checked_correspondences()?;

        let binding_site = context.reference_structure.residues_within(&context.reference.positions().matrix, self.bs_radius);
        if binding_site.is_empty() {
            return Err(PairState::TargetBindingSite);
        }

        let best = self.placements(context.chain_mapping, &binding_site)
            .into_iter()
            .filter_map(|placement| self.evaluate(context, &binding_site, placement))
            .fold(None, |best: Option<Candidate>, candidate| match best {
                Some(best) if best.rmsd <= candidate.rmsd => Some(best),
                _ => Some(candidate)
            })
            .ok_or(PairState::ModelBindingSite)?;

        let inconsistent_residues = best.mapped.iter()
            .filter(|&&(r, m)| {
                let reference_name = context.reference_structure.residue_at(r).map(|residue| &residue.name);
                let model_name = context.model_structure.residue_at(m).map(|residue| &residue.name);
                reference_name != model_name
            })
            .filter_map(|&(r, m)| Some((context.reference_structure.key(r)?, context.model_structure.key(m)?)))
            .collect();

        let chain_mapping = best.placement.chains.iter()
            .filter_map(|&(r, m)| Some(ChainPair {
                reference: context.reference_structure.chains.get(r)?.name.clone(),
                model: context.model_structure.chains.get(m)?.name.clone()
            }))
            .collect();

        let aux = ScrmsdAux {
            rmsd: best.rmsd,
            lddt_lp: self.pocket_lddt(context, &best.placement),
            bb_rmsd: best.superposition.rmsd,
            transform: best.superposition.transform.clone(),
            target_binding_site: keys(context.reference_structure, binding_site),
            mapped_target_binding_site: keys(context.reference_structure, best.mapped.iter().map(|(r, _)| *r)),
            mapped_model_binding_site: keys(context.model_structure, best.mapped.iter().map(|(_, m)| *m)),
            inconsistent_residues,
            chain_mapping,
            correspondence: best.correspondence.clone()
        };

        Ok(PairScore {score: best.rmsd, aux: AuxData::Scrmsd(aux)})
    }
}
