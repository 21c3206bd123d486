//! Candidate profiling: append drug-likeness, kinase-likeness and ADMET
//! descriptor columns to the top-ranked ligands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ligscreen_common::{format_float, normalize_key, stats, CsvTable, Result};

use crate::admet::{AdmetPredictor, AdmetProperties, BbbPermeability, Risk};
use crate::descriptors::MolecularDescriptors;
use crate::druglikeness::{lipinski, qed, LipinskiResult, QedClass};
use crate::ligand::ID_COLUMN;
use crate::scoring::KinaseScorer;

/// Columns appended to the candidate list, in output order.
pub const PROFILE_COLUMNS: [&str; 33] = [
    "molecular_weight",
    "logP",
    "num_h_donors",
    "num_h_acceptors",
    "num_rotatable_bonds",
    "lipinski_violations",
    "lipinski_pass",
    "qed_score",
    "qed_classification",
    "tpsa",
    "num_aromatic_rings",
    "num_heteroatoms",
    "num_rings",
    "fraction_csp3",
    "num_hba_lipinski",
    "num_hbd_lipinski",
    "molar_refractivity",
    "num_aliphatic_rings",
    "num_saturated_rings",
    "kinase_score",
    "num_stereo_centers",
    "formal_charge",
    "num_sp3_carbons",
    "num_aliphatic_carbocycles",
    "num_bridgehead_atoms",
    "num_spiro_atoms",
    "bertz_complexity",
    "solubility_logs",
    "solubility_class",
    "bbb_permeability",
    "cyp3a4_inhibitor",
    "herg_liability",
    "clearance_pred",
];

/// Round half away from zero to `dp` decimal places.
pub fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

/// Full profile of one parsed candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeProfile {
    pub descriptors: MolecularDescriptors,
    pub lipinski: LipinskiResult,
    pub qed: f64,
    pub qed_class: QedClass,
    pub kinase_score: u32,
    pub admet: AdmetProperties,
}

impl MoleculeProfile {
    pub fn compute(descriptors: MolecularDescriptors, scorer: &KinaseScorer, predictor: &AdmetPredictor) -> Self {
        let qed_score = qed(&descriptors);
        Self {
            lipinski: lipinski(&descriptors),
            qed: qed_score,
            qed_class: QedClass::from_score(qed_score),
            kinase_score: scorer.score(&descriptors),
            admet: predictor.predict(&descriptors),
            descriptors,
        }
    }

    /// Cell values matching [`PROFILE_COLUMNS`].
    pub fn cells(&self) -> Vec<String> {
        let d = &self.descriptors;
        let a = &self.admet;
        let f2 = |v: f64| format_float(round_to(v, 2));
        let f3 = |v: f64| format_float(round_to(v, 3));
        vec![
            f2(d.molecular_weight),
            f2(d.logp),
            d.num_h_donors.to_string(),
            d.num_h_acceptors.to_string(),
            d.num_rotatable_bonds.to_string(),
            self.lipinski.violations.to_string(),
            self.lipinski.label().to_string(),
            f3(self.qed),
            self.qed_class.to_string(),
            f2(d.tpsa),
            d.num_aromatic_rings.to_string(),
            d.num_heteroatoms.to_string(),
            d.num_rings.to_string(),
            f3(d.fraction_csp3),
            d.num_hba_lipinski.to_string(),
            d.num_hbd_lipinski.to_string(),
            f2(d.molar_refractivity),
            d.num_aliphatic_rings.to_string(),
            d.num_saturated_rings.to_string(),
            self.kinase_score.to_string(),
            d.num_stereo_centers.to_string(),
            d.formal_charge.to_string(),
            d.num_sp3_carbons.to_string(),
            d.num_aliphatic_carbocycles.to_string(),
            d.num_bridgehead_atoms.to_string(),
            d.num_spiro_atoms.to_string(),
            f2(d.bertz_complexity),
            f2(a.solubility_logs),
            a.solubility_class.to_string(),
            a.bbb_permeability.to_string(),
            a.cyp3a4_inhibitor.to_string(),
            a.herg_liability.to_string(),
            a.clearance.to_string(),
        ]
    }
}

/// Cells for a structure that could not be parsed.
fn unparseable_cells() -> Vec<String> {
    PROFILE_COLUMNS
        .iter()
        .map(|c| match *c {
            "qed_classification" | "solubility_class" => "N/A".to_string(),
            _ => String::new(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCandidate {
    /// Ligand id, or the row index when the list has no id column.
    pub label: String,
    pub kinase_score: u32,
    pub qed: f64,
    pub tpsa: f64,
    pub num_aromatic_rings: usize,
    pub solubility: String,
    pub herg: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub total: usize,
    pub parsed: usize,
    pub lipinski_pass: usize,
    pub avg_qed: Option<f64>,
    pub qed_excellent: usize,
    pub avg_aromatic_rings: Option<f64>,
    pub avg_tpsa: Option<f64>,
    pub tpsa_in_range: usize,
    pub avg_kinase_score: Option<f64>,
    pub high_kinase_score: usize,
    pub avg_solubility_logs: Option<f64>,
    pub soluble: usize,
    pub bbb_likely: usize,
    pub cyp3a4_low_risk: usize,
    pub herg_low_risk: usize,
    pub top: Vec<TopCandidate>,
    pub output: PathBuf,
}

impl CandidateSummary {
    fn from_profiles(profiles: &[(String, Option<MoleculeProfile>)], output: &Path) -> Self {
        let parsed: Vec<(&String, &MoleculeProfile)> = profiles
            .iter()
            .filter_map(|(label, p)| p.as_ref().map(|p| (label, p)))
            .collect();
        let avg = |f: fn(&MoleculeProfile) -> f64| {
            let values: Vec<f64> = parsed.iter().map(|(_, p)| f(p)).collect();
            stats::mean(&values)
        };
        let count = |f: fn(&MoleculeProfile) -> bool| parsed.iter().filter(|(_, p)| f(p)).count();

        // Stable sort: the first of equal kinase scores wins.
        let mut ranked = parsed.clone();
        ranked.sort_by(|a, b| b.1.kinase_score.cmp(&a.1.kinase_score));
        let top = ranked
            .into_iter()
            .take(3)
            .map(|(label, p)| TopCandidate {
                label: label.clone(),
                kinase_score: p.kinase_score,
                qed: round_to(p.qed, 3),
                tpsa: round_to(p.descriptors.tpsa, 2),
                num_aromatic_rings: p.descriptors.num_aromatic_rings,
                solubility: p.admet.solubility_class.to_string(),
                herg: p.admet.herg_liability.to_string(),
            })
            .collect();

        Self {
            total: profiles.len(),
            parsed: parsed.len(),
            lipinski_pass: count(|p| p.lipinski.passes),
            avg_qed: avg(|p| round_to(p.qed, 3)),
            qed_excellent: count(|p| round_to(p.qed, 3) >= 0.7),
            avg_aromatic_rings: avg(|p| p.descriptors.num_aromatic_rings as f64),
            avg_tpsa: avg(|p| round_to(p.descriptors.tpsa, 2)),
            tpsa_in_range: count(|p| {
                let tpsa = round_to(p.descriptors.tpsa, 2);
                (40.0..=100.0).contains(&tpsa)
            }),
            avg_kinase_score: avg(|p| p.kinase_score as f64),
            high_kinase_score: count(|p| p.kinase_score >= 8),
            avg_solubility_logs: avg(|p| round_to(p.admet.solubility_logs, 2)),
            soluble: count(|p| p.admet.solubility_class.is_soluble()),
            bbb_likely: count(|p| p.admet.bbb_permeability == BbbPermeability::Likely),
            cyp3a4_low_risk: count(|p| p.admet.cyp3a4_inhibitor == Risk::Low),
            herg_low_risk: count(|p| p.admet.herg_liability == Risk::Low),
            top,
            output: output.to_path_buf(),
        }
    }
}

/// Profile every molecule of `best_csv` and write the extended table to
/// `candidates_csv`.
pub fn profile_candidates(best_csv: &Path, candidates_csv: &Path) -> Result<CandidateSummary> {
    let mut table = CsvTable::read(best_csv)?;
    let smiles_col = table.require_column("smiles")?;
    let id_col = table.column_index(ID_COLUMN);
    info!(rows = table.len(), path = %best_csv.display(), "Loaded molecules");

    let scorer = KinaseScorer::new();
    let predictor = AdmetPredictor::new();

    let mut profiles = Vec::with_capacity(table.len());
    let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(table.len()); PROFILE_COLUMNS.len()];

    for row in 0..table.len() {
        let smiles = table.value(row, smiles_col).trim();
        info!("Processing molecule {}/{}", row + 1, table.len());

        let label = match id_col {
            Some(col) => normalize_key(table.value(row, col)),
            None => row.to_string(),
        };
        let profile = match MolecularDescriptors::from_smiles(smiles) {
            Ok(desc) => Some(MoleculeProfile::compute(desc, &scorer, &predictor)),
            Err(e) => {
                warn!(smiles, error = %e, "Could not parse SMILES");
                None
            }
        };

        let cells = profile.as_ref().map_or_else(unparseable_cells, MoleculeProfile::cells);
        for (column, cell) in columns.iter_mut().zip(cells) {
            column.push(cell);
        }
        profiles.push((label, profile));
    }

    for (name, values) in PROFILE_COLUMNS.iter().zip(columns) {
        table.set_column(name, values)?;
    }
    table.write(candidates_csv)?;
    info!(count = table.len(), path = %candidates_csv.display(), "Saved candidates");

    Ok(CandidateSummary::from_profiles(&profiles, candidates_csv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(180.1587, 2), 180.16);
        assert_eq!(round_to(0.73856, 3), 0.739);
        assert_eq!(round_to(-1.2349, 2), -1.23);
    }

    #[test]
    fn test_cells_match_columns() {
        let desc = MolecularDescriptors::from_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let profile = MoleculeProfile::compute(desc, &KinaseScorer::new(), &AdmetPredictor::new());
        let cells = profile.cells();
        assert_eq!(cells.len(), PROFILE_COLUMNS.len());

        let cell = |name: &str| {
            let i = PROFILE_COLUMNS.iter().position(|c| *c == name).unwrap();
            cells[i].clone()
        };
        assert_eq!(cell("molecular_weight"), "180.16");
        assert_eq!(cell("tpsa"), "63.6");
        assert_eq!(cell("lipinski_pass"), "Yes");
        assert_eq!(cell("num_aromatic_rings"), "1");
        assert_eq!(cell("cyp3a4_inhibitor"), "Low risk");
    }

    #[test]
    fn test_unparseable_cells() {
        let cells = unparseable_cells();
        assert_eq!(cells.iter().filter(|c| *c == "N/A").count(), 2);
        assert_eq!(cells[0], "");
    }

    #[test]
    fn test_profile_candidates() {
        let dir = tempdir().unwrap();
        let best = dir.path().join("list-best10.csv");
        fs::write(
            &best,
            "smiles,id-num,vina_affinity\n\
             CC(=O)Oc1ccccc1C(=O)O,4,-7.1\n\
             not-a-smiles,9,-6.0\n\
             CCO,2,-3.0\n",
        )
        .unwrap();
        let out = dir.path().join("candidates.csv");

        let summary = profile_candidates(&best, &out).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.lipinski_pass, 2);
        assert_eq!(summary.top.len(), 2);

        let table = CsvTable::read(&out).unwrap();
        assert_eq!(table.headers().len(), 3 + PROFILE_COLUMNS.len());
        assert_eq!(&table.headers()[..3], &["smiles", "id-num", "vina_affinity"]);
        let qed_class = table.require_column("qed_classification").unwrap();
        let mw = table.require_column("molecular_weight").unwrap();
        assert_eq!(table.value(1, qed_class), "N/A");
        assert_eq!(table.value(1, mw), "");
        assert_eq!(table.value(2, mw), "46.07");
    }

    #[test]
    fn test_invalid_structures_get_blank_profiles() {
        let dir = tempdir().unwrap();
        let best = dir.path().join("best.csv");
        fs::write(&best, "smiles,id-num\nCC(C)(C)(C)C,1\nc1cccc1,2\nc1ccccc1,3\n").unwrap();
        let out = dir.path().join("candidates.csv");

        let summary = profile_candidates(&best, &out).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.parsed, 1);

        let table = CsvTable::read(&out).unwrap();
        let solubility = table.require_column("solubility_class").unwrap();
        let tpsa = table.require_column("tpsa").unwrap();
        for row in 0..2 {
            assert_eq!(table.value(row, solubility), "N/A");
            assert_eq!(table.value(row, tpsa), "");
        }
        assert_eq!(table.value(2, tpsa), "0");
    }

    #[test]
    fn test_top_candidates_keep_first_on_ties() {
        let dir = tempdir().unwrap();
        let best = dir.path().join("best.csv");
        fs::write(&best, "smiles,id-num\nCCO,7\nCCN,3\nCCC,5\nCCCC,1\n").unwrap();
        let summary = profile_candidates(&best, &dir.path().join("c.csv")).unwrap();
        let labels: Vec<&str> = summary.top.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["7", "3", "5"]);
    }
}
