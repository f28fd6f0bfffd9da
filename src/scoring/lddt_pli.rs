//! Distance-difference scoring of protein-ligand contacts (lDDT-PLI)

use itertools::Itertools;
use serde::Serialize;

use crate::chain_mapping::ChainPair;
use crate::config::LddtPliConfig;
use crate::matching::Correspondence;
use crate::quaternions::Vector3;
use crate::scoring::{counterpart, polymer_atoms_within, AuxData, PairContext, PairScore, PairScorer, ScoreOrder};
use crate::scoring::state::PairState;
use crate::strong::Nucleus;
use crate::structure::{ResidueHandle, ResidueKey};

/// Distance difference thresholds in Angstrom
pub const LDDT_THRESHOLDS: [f64; 4] = [0.5, 1.0, 2.0, 4.0];

/// Fraction of thresholds within which a distance is preserved
pub fn preserved_fraction(reference_distance: f64, model_distance: f64) -> f64 {
    let difference = (reference_distance - model_distance).abs();
    let preserved = LDDT_THRESHOLDS.iter().filter(|&&t| difference < t).count();
    preserved as f64 / LDDT_THRESHOLDS.len() as f64
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LddtPliAux {
    pub lddt_pli: f64,
    /// Contacts in the target
    pub lddt_pli_n_contacts: usize,
    /// Model-only contacts counted in addition
    pub added_model_contacts: usize,
    pub target_binding_site: Vec<ResidueKey>,
    pub model_binding_site: Vec<ResidueKey>,
    pub chain_mapping: Vec<ChainPair>,
    pub correspondence: Correspondence
}

/// A target ligand atom to binding site atom contact
struct Contact {
    ligand_atom: Nucleus,
    residue: ResidueHandle,
    distance: f64,
    /// Position of the binding site atom's counterpart in the model
    model_partner: Option<Vector3>
}

/// A model ligand atom to mapped binding site atom contact
struct ModelContact {
    ligand_atom: Nucleus,
    distance: f64,
    /// Position of the binding site atom's counterpart in the target
    reference_partner: Option<Vector3>
}

#[derive(Clone, Debug, PartialEq)]
pub struct LddtPliScorer {
    pub radius: f64,
    pub add_mdl_contacts: bool
}

impl LddtPliScorer {
    pub fn new(config: &LddtPliConfig) -> LddtPliScorer {
        LddtPliScorer {radius: config.radius, add_mdl_contacts: config.add_mdl_contacts}
    }

    fn reference_contacts(&self, context: &PairContext) -> Vec<Contact> {
        let ligand = context.reference.positions();
        polymer_atoms_within(context.reference_structure, &ligand.matrix, self.radius)
            .into_iter()
            .flat_map(|(residue, atom)| {
                let model_partner = counterpart(context.model_structure, context.chain_mapping.map_residue(residue), &atom.name)
                    .map(|a| a.position);
                context.reference.nuclei().filter_map(move |ligand_atom| {
                    let distance = (ligand.point(ligand_atom) - atom.position).norm();
                    (distance <= self.radius).then_some(Contact {ligand_atom, residue, distance, model_partner})
                })
            })
            .collect()
    }

    fn model_contacts(&self, context: &PairContext) -> Vec<ModelContact> {
        let ligand = context.model.positions();
        polymer_atoms_within(context.model_structure, &ligand.matrix, self.radius)
            .into_iter()
            .filter_map(|(residue, atom)| {
                let reference_residue = context.chain_mapping.reference_residue(residue)?;
                let reference_partner = counterpart(context.reference_structure, Some(reference_residue), &atom.name)
                    .map(|a| a.position);
                Some((atom, reference_partner))
            })
            .flat_map(|(atom, reference_partner)| {
                context.model.nuclei().filter_map(move |ligand_atom| {
                    let distance = (ligand.point(ligand_atom) - atom.position).norm();
                    (distance <= self.radius).then_some(ModelContact {ligand_atom, distance, reference_partner})
                })
            })
            .collect()
    }

    /// Summed contact scores and the number of added model contacts
    fn evaluate(&self, context: &PairContext, correspondence: &Correspondence, contacts: &[Contact], model_contacts: &[ModelContact]) -> (f64, usize) {
        let reference_ligand = context.reference.positions();
        let model_ligand = context.model.positions();

        let mut sum: f64 = contacts.iter()
            .filter_map(|contact| {
                let model_atom = correspondence.model_of(contact.ligand_atom)?;
                let partner = contact.model_partner?;
                let model_distance = (model_ligand.point(model_atom) - partner).norm();
                Some(preserved_fraction(contact.distance, model_distance))
            })
            .sum();

        let mut added = 0;
        for contact in model_contacts {
            // Model atoms unresolved in the target are covered by the coverage
            let Some(reference_atom) = correspondence.reference_of(contact.ligand_atom) else {
                continue;
            };
            let reference_distance = contact.reference_partner
                .map(|partner| (reference_ligand.point(reference_atom) - partner).norm());

            match reference_distance {
                // Already counted among the target contacts
                Some(d) if d <= self.radius => {},
                Some(d) => {
                    added += 1;
                    sum += preserved_fraction(d, contact.distance);
                },
                None => added += 1
            }
        }

        (sum, added)
    }
}

impl PairScorer for LddtPliScorer {
    fn name(&self) -> &'static str {
        "lddt_pli"
    }

    fn score_order(&self) -> ScoreOrder {
        ScoreOrder::HigherIsBetter
    }

    fn score_pair(&self, context: &PairContext) -> Result<PairScore, PairState> {
        context.checked_correspondences()?;

        let contacts = self.reference_contacts(context);
        if contacts.is_empty() {
            return Err(PairState::NoContact);
        }

        let model_contacts = match self.add_mdl_contacts {
            true => self.model_contacts(context),
            false => Vec::new()
        };

        let mut best: Option<(f64, usize, &Correspondence)> = None;
        for correspondence in context.symmetries.correspondences.iter() {
            let (sum, added) = self.evaluate(context, correspondence, &contacts, &model_contacts);
            let score = sum / (contacts.len() + added) as f64;
            if best.map_or(true, |(best_score, _, _)| score > best_score) {
                best = Some((score, added, correspondence));
            }
        }

        let (score, added, correspondence) = best.ok_or(PairState::BrokenCorrespondence)?;

        let target_binding_site: Vec<ResidueHandle> = contacts.iter().map(|c| c.residue).unique().collect();
        let model_binding_site = target_binding_site.iter()
            .filter_map(|&handle| context.chain_mapping.map_residue(handle))
            .filter_map(|handle| context.model_structure.key(handle))
            .collect();
        let target_binding_site = target_binding_site.into_iter()
            .filter_map(|handle| context.reference_structure.key(handle))
            .collect();

        let aux = LddtPliAux {
            lddt_pli: score,
            lddt_pli_n_contacts: contacts.len(),
            added_model_contacts: added,
            target_binding_site,
            model_binding_site,
            chain_mapping: context.chain_mapping.named_pairs(context.reference_structure, context.model_structure),
            correspondence: correspondence.clone()
        };

        Ok(PairScore {score, aux: AuxData::LddtPli(aux)})
    }
}
