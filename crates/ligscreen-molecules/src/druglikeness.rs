//! Drug-likeness: Lipinski's Rule of Five, QED and the structural alerts QED
//! penalises.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptors::MolecularDescriptors;
use crate::rings::RingInfo;
use crate::smiles::{BondOrder, Molecule};

/// Rule-of-five evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LipinskiResult {
    pub violations: u32,
    /// At most one violation.
    pub passes: bool,
}

impl LipinskiResult {
    pub fn label(&self) -> &'static str {
        if self.passes {
            "Yes"
        } else {
            "No"
        }
    }
}

/// Count MW > 500, logP > 5, HBD > 5 and HBA > 10.
pub fn lipinski(desc: &MolecularDescriptors) -> LipinskiResult {
    let mut violations = 0;
    if desc.molecular_weight > 500.0 {
        violations += 1;
    }
    if desc.logp > 5.0 {
        violations += 1;
    }
    if desc.num_h_donors > 5 {
        violations += 1;
    }
    if desc.num_h_acceptors > 10 {
        violations += 1;
    }
    LipinskiResult {
        violations,
        passes: violations <= 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QedClass {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl QedClass {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            QedClass::Excellent
        } else if score >= 0.5 {
            QedClass::Good
        } else if score >= 0.3 {
            QedClass::Moderate
        } else {
            QedClass::Poor
        }
    }
}

impl fmt::Display for QedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QedClass::Excellent => "Excellent",
            QedClass::Good => "Good",
            QedClass::Moderate => "Moderate",
            QedClass::Poor => "Poor",
        };
        f.write_str(label)
    }
}

/// Asymmetric double-sigmoid parameters `[A, B, C, D, E, F, DMAX]` per
/// property, in the order MW, ALOGP, HBA, HBD, PSA, ROTB, AROM, ALERTS.
const ADS_PARAMS: [[f64; 7]; 8] = [
    [2.817065973, 392.5754953, 290.7489764, 2.419764353, 49.22325677, 65.37051707, 104.9805561],
    [3.172690585, 137.8624751, 2.534937431, 4.581497897, 0.822739154, 0.576295591, 131.3186604],
    [2.948620388, 160.4605972, 3.615294657, 4.435986202, 0.290141953, 1.300669958, 148.7763046],
    [1.618662227, 1010.051101, 0.985094388, 0.000000001, 0.713820843, 0.920922555, 258.1632616],
    [1.876861559, 125.2232657, 62.90773554, 87.83366614, 12.01999824, 28.51324732, 104.5686167],
    [0.010000000, 272.4121427, 2.558379970, 1.566762840, 1.271567166, 2.758063707, 105.4420403],
    [3.217788970, 957.7374108, 2.274627939, 0.000000001, 1.317690384, 0.375760881, 312.3372610],
    [0.010000000, 1199.094025, -0.09002883, 0.000000001, 0.185904477, 0.875193782, 417.7253140],
];

const QED_WEIGHTS: [f64; 8] = [0.66, 0.46, 0.05, 0.61, 0.06, 0.65, 0.48, 0.95];

fn desirability(x: f64, p: &[f64; 7]) -> f64 {
    let [a, b, c, d, e, f, dmax] = *p;
    let rise = 1.0 + (-(x - c + d / 2.0) / e).exp();
    let fall = 1.0 + (-(x - c - d / 2.0) / f).exp();
    (a + b / rise * (1.0 - 1.0 / fall)) / dmax
}

/// Weighted QED (Bickerton et al. 2012).
pub fn qed(desc: &MolecularDescriptors) -> f64 {
    let properties = [
        desc.molecular_weight,
        desc.logp,
        desc.num_h_acceptors as f64,
        desc.num_h_donors as f64,
        desc.tpsa,
        desc.num_rotatable_bonds as f64,
        desc.num_aromatic_rings as f64,
        desc.num_structural_alerts as f64,
    ];

    let mut log_sum = 0.0;
    for ((x, params), w) in properties.iter().zip(&ADS_PARAMS).zip(QED_WEIGHTS) {
        let d = desirability(*x, params).max(f64::MIN_POSITIVE);
        log_sum += w * d.ln();
    }
    let weight_sum: f64 = QED_WEIGHTS.iter().sum();
    (log_sum / weight_sum).exp().clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Structural alerts
// ---------------------------------------------------------------------------

fn neighbors<'a>(mol: &'a Molecule, atom: usize) -> impl Iterator<Item = (usize, BondOrder)> + 'a {
    mol.adjacency[atom]
        .iter()
        .map(move |&(n, b)| (n, mol.bonds[b].order))
}

fn is_carbonyl_carbon(mol: &Molecule, atom: usize) -> bool {
    let a = &mol.atoms[atom];
    a.is("C")
        && !a.aromatic
        && neighbors(mol, atom).any(|(n, o)| o == BondOrder::Double && mol.atoms[n].is("O"))
}

fn single_bonded_to(mol: &Molecule, atom: usize, symbols: &[&str]) -> bool {
    neighbors(mol, atom).any(|(n, o)| o == BondOrder::Single && symbols.contains(&mol.atoms[n].symbol()))
}

fn count_double_to(mol: &Molecule, atom: usize, symbol: &str) -> usize {
    neighbors(mol, atom)
        .filter(|&(n, o)| o == BondOrder::Double && mol.atoms[n].is(symbol))
        .count()
}

const HALOGENS: &[&str] = &["F", "Cl", "Br", "I"];

/// Names of the structural alerts present in `mol`.
pub fn structural_alerts(mol: &Molecule, rings: &RingInfo) -> Vec<&'static str> {
    let n = mol.atom_count();
    let any = |pred: &dyn Fn(usize) -> bool| (0..n).any(pred);
    let mut hits = Vec::new();

    if any(&|i| is_carbonyl_carbon(mol, i) && single_bonded_to(mol, i, HALOGENS)) {
        hits.push("acyl halide");
    }
    if any(&|i| mol.atoms[i].is("S") && count_double_to(mol, i, "O") >= 2 && single_bonded_to(mol, i, HALOGENS)) {
        hits.push("sulfonyl halide");
    }
    if any(&|i| is_carbonyl_carbon(mol, i) && mol.atoms[i].total_h() > 0) {
        hits.push("aldehyde");
    }
    if any(&|i| (mol.atoms[i].is("O") || mol.atoms[i].is("N")) && !mol.atoms[i].aromatic && rings.atom_in_ring_of_size(i, 3)) {
        hits.push("epoxide or aziridine");
    }
    if any(&|i| mol.atoms[i].is("S") && !mol.atoms[i].aromatic && mol.atoms[i].total_h() > 0) {
        hits.push("thiol");
    }
    if any(&|i| {
        mol.atoms[i].is("C")
            && count_double_to(mol, i, "N") == 1
            && (count_double_to(mol, i, "O") == 1 || count_double_to(mol, i, "S") == 1)
    }) {
        hits.push("isocyanate or isothiocyanate");
    }
    if any(&|i| {
        is_carbonyl_carbon(mol, i)
            && neighbors(mol, i).any(|(nb, o)| o == BondOrder::Single && is_carbonyl_carbon(mol, nb))
    }) {
        hits.push("1,2-dicarbonyl");
    }
    if any(&|i| mol.atoms[i].is("O") && single_bonded_to(mol, i, &["O"])) {
        hits.push("peroxide");
    }
    if any(&|i| mol.atoms[i].is("N") && !mol.atoms[i].aromatic && neighbors(mol, i).any(|(nb, o)| o == BondOrder::Single && mol.atoms[nb].is("N") && !mol.atoms[nb].aromatic)) {
        hits.push("hydrazine");
    }
    if any(&|i| mol.atoms[i].is("N") && !mol.atoms[i].aromatic && count_double_to(mol, i, "N") > 0) {
        hits.push("azo");
    }
    if any(&|i| {
        // C=C-C(=O)
        let a = &mol.atoms[i];
        a.is("C")
            && !a.aromatic
            && neighbors(mol, i).any(|(nb, o)| o == BondOrder::Double && mol.atoms[nb].is("C"))
            && neighbors(mol, i).any(|(nb, o)| o == BondOrder::Single && is_carbonyl_carbon(mol, nb))
    }) {
        hits.push("Michael acceptor");
    }
    if any(&|i| mol.atoms[i].is("N") && !mol.atoms[i].aromatic && neighbors(mol, i).filter(|&(nb, _)| mol.atoms[nb].is("O")).count() >= 2 && count_double_to(mol, i, "O") >= 1) {
        hits.push("nitro");
    }
    if any(&|i| {
        let a = &mol.atoms[i];
        a.is("C") && !a.aromatic && a.total_h() >= 2 && single_bonded_to(mol, i, &["Br", "I"])
    }) {
        hits.push("alkyl halide");
    }
    if any(&|i| {
        mol.atoms[i].is("O")
            && neighbors(mol, i)
                .filter(|&(nb, o)| o == BondOrder::Single && is_carbonyl_carbon(mol, nb))
                .count()
                == 2
    }) {
        hits.push("anhydride");
    }
    if any(&|i| mol.atoms[i].is("C") && !mol.atoms[i].aromatic && count_double_to(mol, i, "S") > 0 && count_double_to(mol, i, "N") == 0) {
        hits.push("thiocarbonyl");
    }

    hits
}
