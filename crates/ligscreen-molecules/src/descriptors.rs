//! Physicochemical descriptors computed on the SMILES graph.
//!
//! Molecular weight uses standard atomic weights, logP and molar refractivity
//! use Wildman-Crippen atom-type contributions, TPSA uses Ertl's N/O fragment
//! contributions, and hydrogen-bond donors/acceptors follow the usual
//! pharmacophore definitions.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::druglikeness::structural_alerts;
use crate::rings::RingInfo;
use crate::smiles::{parse_smiles, BondOrder, Chirality, Molecule, SmilesError};

const HYDROGEN_MASS: f64 = 1.008;

/// Everything the candidate profile needs from one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolecularDescriptors {
    pub molecular_weight: f64,
    pub logp: f64,
    pub molar_refractivity: f64,
    pub tpsa: f64,
    pub num_h_donors: usize,
    pub num_h_acceptors: usize,
    pub num_rotatable_bonds: usize,
    pub num_rings: usize,
    pub num_aromatic_rings: usize,
    pub num_aliphatic_rings: usize,
    pub num_saturated_rings: usize,
    pub num_aliphatic_carbocycles: usize,
    pub num_heteroatoms: usize,
    pub fraction_csp3: f64,
    /// Same acceptor definition as `num_h_acceptors`, reported again under
    /// the Lipinski heading.
    pub num_hba_lipinski: usize,
    pub num_hbd_lipinski: usize,
    pub num_stereo_centers: usize,
    pub formal_charge: i32,
    pub num_sp3_carbons: usize,
    pub num_bridgehead_atoms: usize,
    pub num_spiro_atoms: usize,
    pub bertz_complexity: f64,
    pub num_structural_alerts: usize,
    /// At least one nitrogen carries a hydrogen.
    pub has_nh_nitrogen: bool,
}

impl MolecularDescriptors {
    pub fn from_smiles(smiles: &str) -> Result<Self, SmilesError> {
        parse_smiles(smiles).map(|mol| Self::compute(&mol))
    }

    pub fn compute(mol: &Molecule) -> Self {
        let rings = RingInfo::perceive(mol);
        let (logp, molar_refractivity) = crippen_contributions(mol, &rings);
        let num_h_donors = h_bond_donors(mol);
        let num_h_acceptors = h_bond_acceptors(mol, &rings);

        Self {
            molecular_weight: molecular_weight(mol),
            logp,
            molar_refractivity,
            tpsa: tpsa(mol, &rings),
            num_h_donors,
            num_h_acceptors,
            num_rotatable_bonds: rotatable_bonds(mol, &rings),
            num_rings: rings.num_rings(),
            num_aromatic_rings: rings.num_aromatic_rings(mol),
            num_aliphatic_rings: rings.num_aliphatic_rings(mol),
            num_saturated_rings: rings.num_saturated_rings(mol),
            num_aliphatic_carbocycles: rings.num_aliphatic_carbocycles(mol),
            num_heteroatoms: mol
                .atoms
                .iter()
                .filter(|a| !matches!(a.atomic_number(), 0 | 1 | 6))
                .count(),
            fraction_csp3: fraction_csp3(mol),
            num_hba_lipinski: num_h_acceptors,
            num_hbd_lipinski: num_h_donors,
            num_stereo_centers: stereo_centers(mol),
            formal_charge: mol.atoms.iter().map(|a| a.charge as i32).sum(),
            num_sp3_carbons: (0..mol.atom_count()).filter(|&i| is_sp3_carbon(mol, i)).count(),
            num_bridgehead_atoms: rings.num_bridgehead_atoms(mol),
            num_spiro_atoms: rings.num_spiro_atoms(),
            bertz_complexity: bertz_ct(mol),
            num_structural_alerts: structural_alerts(mol, &rings).len(),
            has_nh_nitrogen: mol.atoms.iter().any(|a| a.is("N") && a.total_h() > 0),
        }
    }
}

/// Average molecular weight including implicit hydrogens.
pub fn molecular_weight(mol: &Molecule) -> f64 {
    mol.atoms
        .iter()
        .map(|a| a.mass() + a.total_h() as f64 * HYDROGEN_MASS)
        .sum()
}

fn is_hetero(mol: &Molecule, atom: usize) -> bool {
    !matches!(mol.atoms[atom].atomic_number(), 0 | 1 | 6)
}

fn has_aromatic_neighbor(mol: &Molecule, atom: usize) -> bool {
    mol.adjacency[atom].iter().any(|&(n, _)| mol.atoms[n].aromatic)
}

/// Neighbour reached through a double bond, if any.
fn double_bond_partner(mol: &Molecule, atom: usize) -> Option<usize> {
    mol.adjacency[atom]
        .iter()
        .find(|&&(_, b)| mol.bonds[b].order == BondOrder::Double)
        .map(|&(n, _)| n)
}

fn is_sp3_carbon(mol: &Molecule, atom: usize) -> bool {
    let a = &mol.atoms[atom];
    a.is("C") && !a.aromatic && mol.bond_orders(atom).all(|o| o == BondOrder::Single)
}

/// Fraction of carbons that are sp3.
pub fn fraction_csp3(mol: &Molecule) -> f64 {
    let carbons = mol.atoms.iter().filter(|a| a.is("C")).count();
    if carbons == 0 {
        return 0.0;
    }
    let sp3 = (0..mol.atom_count()).filter(|&i| is_sp3_carbon(mol, i)).count();
    sp3 as f64 / carbons as f64
}

// ---------------------------------------------------------------------------
// Wildman-Crippen logP / MR
// ---------------------------------------------------------------------------

/// `(logP, MR)` as the sum of per-atom contributions, hydrogens included.
pub fn crippen_contributions(mol: &Molecule, rings: &RingInfo) -> (f64, f64) {
    let mut logp = 0.0;
    let mut mr = 0.0;
    for i in 0..mol.atom_count() {
        let (p, r) = heavy_atom_contribution(mol, rings, i);
        let (hp, hr) = hydrogen_contribution(mol, i);
        let h = mol.atoms[i].total_h() as f64;
        logp += p + h * hp;
        mr += r + h * hr;
    }
    (logp, mr)
}

fn heavy_atom_contribution(mol: &Molecule, rings: &RingInfo, i: usize) -> (f64, f64) {
    let atom = &mol.atoms[i];
    let degree = mol.degree(i);
    match atom.symbol() {
        "C" if atom.aromatic => {
            let aromatic_bonds = mol
                .bond_orders(i)
                .filter(|&o| o == BondOrder::Aromatic)
                .count();
            let substituent = mol.adjacency[i]
                .iter()
                .find(|&&(_, b)| mol.bonds[b].order != BondOrder::Aromatic)
                .map(|&(n, b)| (n, mol.bonds[b].order));
            match substituent {
                None if aromatic_bonds >= 3 => (0.2955, 4.346),
                None => (0.1581, 3.350),
                Some((_, BondOrder::Double)) => (-0.8186, 3.685),
                Some((n, _)) => match mol.atoms[n].symbol() {
                    "C" => (0.1360, 3.509),
                    "N" => (0.4619, 3.067),
                    "O" => (0.5437, 3.853),
                    "S" => (0.1893, 2.673),
                    "F" | "Cl" | "Br" | "I" => (0.2713, 3.904),
                    _ => (0.1360, 3.509),
                },
            }
        }
        "C" => {
            if mol.has_bond_order(i, BondOrder::Triple) {
                return (0.0017, 3.888);
            }
            if let Some(partner) = double_bond_partner(mol, i) {
                return if mol.atoms[partner].is("C") {
                    (0.1551, 3.513)
                } else {
                    (-0.2783, 5.007)
                };
            }
            let hetero = mol.adjacency[i].iter().any(|&(n, _)| is_hetero(mol, n));
            let small = degree <= 2;
            if hetero {
                if small {
                    (-0.2035, 2.753)
                } else {
                    (-0.2051, 2.731)
                }
            } else if has_aromatic_neighbor(mol, i) {
                if small {
                    (0.08452, 2.503)
                } else {
                    (-0.1444, 2.433)
                }
            } else if small {
                (0.1441, 2.503)
            } else {
                (0.0, 2.433)
            }
        }
        "N" if atom.aromatic => {
            if atom.charge > 0 {
                (-1.119, 2.202)
            } else {
                (-0.3239, 2.202)
            }
        }
        "N" => {
            let h = atom.total_h();
            if atom.charge > 0 {
                return if h > 0 { (-1.950, 2.262) } else { (-0.3396, 2.262) };
            }
            if mol.has_bond_order(i, BondOrder::Triple) {
                return (0.01508, 2.262);
            }
            if double_bond_partner(mol, i).is_some() {
                return if h > 0 { (0.08387, 2.262) } else { (0.1836, 2.262) };
            }
            let aromatic = has_aromatic_neighbor(mol, i);
            match (h, aromatic) {
                (2.., true) => (-1.0270, 2.262),
                (2.., false) => (-1.0190, 2.262),
                (1, true) => (-0.5188, 2.173),
                (1, false) => (-0.7096, 2.173),
                (_, true) => (-0.4458, 2.173),
                (_, false) => {
                    if rings.atom_in_ring_of_size(i, 3) {
                        (-0.3396, 2.173)
                    } else {
                        (-0.3187, 2.173)
                    }
                }
            }
        }
        "O" if atom.aromatic => (0.1552, 1.080),
        "O" => {
            if atom.charge < 0 {
                return (-1.326, 0.7774);
            }
            if let Some(partner) = double_bond_partner(mol, i) {
                return if mol.atoms[partner].aromatic {
                    (0.1129, 0.2215)
                } else {
                    (-0.1526, 0.0)
                };
            }
            if atom.total_h() > 0 {
                (-0.2893, 0.8238)
            } else if has_aromatic_neighbor(mol, i) {
                (-0.4195, 1.182)
            } else {
                (-0.0684, 1.182)
            }
        }
        "S" if atom.aromatic => (0.6237, 6.691),
        "S" => {
            if mol.has_bond_order(i, BondOrder::Double) {
                (-0.0024, 7.591)
            } else {
                (0.6482, 7.591)
            }
        }
        "P" => (0.8612, 6.920),
        "F" => (0.4202, 1.108),
        "Cl" => (0.6895, 5.853),
        "Br" => (0.8456, 8.927),
        "I" => (0.8857, 14.02),
        "H" => (0.1230, 1.057),
        _ => (0.0, 0.0),
    }
}

/// Contribution of one hydrogen attached to atom `i`.
fn hydrogen_contribution(mol: &Molecule, i: usize) -> (f64, f64) {
    let atom = &mol.atoms[i];
    match atom.symbol() {
        "N" => (0.2142, 1.057),
        "O" => {
            let acid = mol.adjacency[i].iter().any(|&(n, _)| {
                double_bond_partner(mol, n).is_some_and(|p| p != i && mol.atoms[p].is("O"))
            });
            if acid {
                (0.2980, 1.057)
            } else {
                (-0.2677, 1.057)
            }
        }
        _ => (0.1230, 1.057),
    }
}

// ---------------------------------------------------------------------------
// TPSA
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BondTally {
    single: usize,
    double: usize,
    triple: usize,
    aromatic: usize,
}

fn tally(mol: &Molecule, atom: usize) -> BondTally {
    let mut t = BondTally::default();
    for order in mol.bond_orders(atom) {
        match order {
            BondOrder::Single => t.single += 1,
            BondOrder::Double => t.double += 1,
            BondOrder::Triple | BondOrder::Quadruple => t.triple += 1,
            BondOrder::Aromatic => t.aromatic += 1,
        }
    }
    t
}

/// Topological polar surface area from N and O fragment contributions.
pub fn tpsa(mol: &Molecule, rings: &RingInfo) -> f64 {
    (0..mol.atom_count())
        .map(|i| polar_contribution(mol, rings, i))
        .sum()
}

fn polar_contribution(mol: &Molecule, rings: &RingInfo, i: usize) -> f64 {
    let atom = &mol.atoms[i];
    let h = atom.total_h();
    let t = tally(mol, i);
    let three_ring = rings.atom_in_ring_of_size(i, 3);

    match (atom.symbol(), atom.aromatic, atom.charge) {
        ("N", false, 0) => match (h, t.single, t.double, t.triple) {
            (0, 3, 0, 0) if three_ring => 3.01,
            (0, 3, 0, 0) => 3.24,
            (0, 1, 1, 0) => 12.36,
            (0, 0, 0, 1) => 23.79,
            (0, 1, 2, 0) => 11.68,
            (0, 0, 1, 1) => 13.60,
            (1, 2, 0, 0) if three_ring => 21.94,
            (1, 2, 0, 0) => 12.03,
            (1, 0, 1, 0) => 23.85,
            (2, 1, 0, 0) => 26.02,
            _ => 0.0,
        },
        ("N", false, 1) => match (h, t.single, t.double, t.triple) {
            (0, 4, 0, 0) => 0.0,
            (0, 2, 1, 0) => 3.01,
            (0, 1, 0, 1) => 4.36,
            (1, 3, 0, 0) => 4.44,
            (1, 1, 1, 0) => 13.97,
            (2, 2, 0, 0) => 16.61,
            (2, 0, 1, 0) => 25.59,
            (3, 1, 0, 0) => 27.64,
            _ => 0.0,
        },
        ("N", true, 0) => match (h, t.aromatic, t.single, t.double) {
            (0, 2, 0, 0) => 12.89,
            (0, 3, 0, 0) => 4.41,
            (0, 2, 1, 0) => 4.93,
            (0, 2, 0, 1) => 8.39,
            (1, 2, 0, 0) => 15.79,
            _ => 0.0,
        },
        ("N", true, 1) => match (h, t.aromatic, t.single) {
            (0, 3, 0) => 4.10,
            (0, 2, 1) => 3.88,
            (1, 2, 0) => 14.14,
            _ => 0.0,
        },
        ("O", true, _) => 13.14,
        ("O", false, 0) => match (h, t.single, t.double) {
            (0, 2, 0) if three_ring => 12.53,
            (0, 2, 0) => 9.23,
            (0, 0, 1) => 17.07,
            (1, 1, 0) => 20.23,
            _ => 0.0,
        },
        ("O", false, -1) if t.single == 1 => 23.06,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Hydrogen bonding
// ---------------------------------------------------------------------------

/// Donors: NH (neutral trivalent or cationic tetravalent), neutral OH/SH and
/// aromatic nH.
pub fn h_bond_donors(mol: &Molecule) -> usize {
    (0..mol.atom_count())
        .filter(|&i| {
            let a = &mol.atoms[i];
            let h = a.total_h();
            if h == 0 {
                return false;
            }
            let v = mol.total_valence(i);
            match (a.symbol(), a.aromatic) {
                ("N", false) => (v == 3 && a.charge == 0) || (v == 4 && a.charge == 1),
                ("O" | "S", false) => h == 1 && a.charge == 0,
                ("N", true) => h == 1 && a.charge == 0,
                _ => false,
            }
        })
        .count()
}

/// Whether `atom` carries a double bond to O, N, P or S, optionally only
/// counting bonds outside rings.
fn doubly_bonded_to_heteroatom(mol: &Molecule, atom: usize, rings: Option<&RingInfo>) -> bool {
    mol.adjacency[atom].iter().any(|&(n, b)| {
        mol.bonds[b].order == BondOrder::Double
            && matches!(mol.atoms[n].symbol(), "O" | "N" | "P" | "S")
            && rings.map_or(true, |r| !r.bond_in_ring(b))
    })
}

/// Acceptors: non-acid OH/SH, divalent O/S, anionic O/S, trivalent N that is
/// not conjugated to a carbonyl-like group, pyridine-type n, aromatic o and s,
/// and fluorine.
pub fn h_bond_acceptors(mol: &Molecule, rings: &RingInfo) -> usize {
    (0..mol.atom_count())
        .filter(|&i| {
            let a = &mol.atoms[i];
            let h = a.total_h();
            let v = mol.total_valence(i);
            match (a.symbol(), a.aromatic) {
                ("O" | "S", false) => {
                    if a.charge < 0 {
                        return true;
                    }
                    if h == 1 && v == 2 {
                        return mol.adjacency[i].iter().any(|&(n, b)| {
                            mol.bonds[b].order == BondOrder::Single
                                && !doubly_bonded_to_heteroatom(mol, n, None)
                        });
                    }
                    h == 0 && v == 2
                }
                ("N", false) => {
                    v == 3
                        && !mol.adjacency[i].iter().any(|&(n, b)| {
                            mol.bonds[b].order == BondOrder::Single
                                && doubly_bonded_to_heteroatom(mol, n, Some(rings))
                        })
                }
                ("N", true) => h == 0 && a.charge == 0,
                ("O" | "S", true) => a.charge == 0,
                ("F", _) => true,
                _ => false,
            }
        })
        .count()
}

// ---------------------------------------------------------------------------
// Rotatable bonds
// ---------------------------------------------------------------------------

fn is_methyl(mol: &Molecule, atom: usize) -> bool {
    let a = &mol.atoms[atom];
    a.is("C") && !a.aromatic && a.total_h() == 3
}

/// End atoms that never make a bond rotatable: terminal atoms, atoms in a
/// triple bond, CX3 trihalomethyl and tert-butyl centres.
fn rigid_end(mol: &Molecule, atom: usize) -> bool {
    if mol.degree(atom) <= 1 || mol.has_bond_order(atom, BondOrder::Triple) {
        return true;
    }
    let a = &mol.atoms[atom];
    if a.is("C") && mol.degree(atom) == 4 {
        let neighbors: Vec<usize> = mol.adjacency[atom].iter().map(|&(n, _)| n).collect();
        for symbol in ["F", "Cl", "Br"] {
            if neighbors.iter().filter(|&&n| mol.atoms[n].is(symbol)).count() >= 3 {
                return true;
            }
        }
        if neighbors.iter().filter(|&&n| is_methyl(mol, n)).count() >= 3 {
            return true;
        }
    }
    false
}

/// Amide-like bond: a three-connected carbon double-bonded to N/O/S, singly
/// bonded to a non-terminal N/O/S.
fn amide_like(mol: &Molecule, carbon: usize, other: usize) -> bool {
    let c = &mol.atoms[carbon];
    if !c.is("C") || c.aromatic || mol.degree(carbon) != 3 {
        return false;
    }
    let o = &mol.atoms[other];
    if !matches!(o.symbol(), "N" | "O" | "S") || mol.degree(other) <= 1 {
        return false;
    }
    mol.adjacency[carbon].iter().any(|&(n, b)| {
        n != other
            && mol.bonds[b].order == BondOrder::Double
            && matches!(mol.atoms[n].symbol(), "N" | "O" | "S")
    })
}

/// Strict rotatable bond count: non-ring single bonds between non-terminal
/// atoms, excluding amide-like C-N/O/S bonds and bonds to CX3 / tert-butyl
/// groups.
pub fn rotatable_bonds(mol: &Molecule, rings: &RingInfo) -> usize {
    mol.bonds
        .iter()
        .enumerate()
        .filter(|&(idx, bond)| {
            matches!(bond.order, BondOrder::Single | BondOrder::Aromatic)
                && !rings.bond_in_ring(idx)
                && !rigid_end(mol, bond.a)
                && !rigid_end(mol, bond.b)
                && !amide_like(mol, bond.a, bond.b)
                && !amide_like(mol, bond.b, bond.a)
        })
        .count()
}

// ---------------------------------------------------------------------------
// Stereo centres
// ---------------------------------------------------------------------------

/// Symmetry classes by iterative neighbourhood refinement.
pub fn symmetry_classes(mol: &Molecule) -> Vec<usize> {
    let n = mol.atom_count();
    let mut invariants: Vec<u64> = mol
        .atoms
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let mut hasher = DefaultHasher::new();
            (
                a.atomic_number(),
                mol.degree(i),
                a.total_h(),
                a.charge,
                a.aromatic,
                a.isotope,
            )
                .hash(&mut hasher);
            hasher.finish()
        })
        .collect();

    let mut classes = count_classes(&invariants);
    for _ in 0..n {
        let next: Vec<u64> = (0..n)
            .map(|i| {
                let mut env: Vec<(u8, u64)> = mol.adjacency[i]
                    .iter()
                    .map(|&(nb, b)| (mol.bonds[b].order.valence(), invariants[nb]))
                    .collect();
                env.sort_unstable();
                let mut hasher = DefaultHasher::new();
                (invariants[i], env).hash(&mut hasher);
                hasher.finish()
            })
            .collect();
        let next_classes = count_classes(&next);
        invariants = next;
        if next_classes == classes {
            break;
        }
        classes = next_classes;
    }

    let mut index: HashMap<u64, usize> = HashMap::new();
    invariants
        .iter()
        .map(|v| {
            let len = index.len();
            *index.entry(*v).or_insert(len)
        })
        .collect()
}

fn count_classes(values: &[u64]) -> usize {
    values.iter().collect::<BTreeSet<_>>().len()
}

/// Stereo centres: atoms with a chirality tag, plus unassigned tetrahedral
/// carbons whose four substituents are all different.
pub fn stereo_centers(mol: &Molecule) -> usize {
    let classes = symmetry_classes(mol);
    (0..mol.atom_count())
        .filter(|&i| {
            let a = &mol.atoms[i];
            if a.chirality != Chirality::None {
                return true;
            }
            if !is_sp3_carbon(mol, i) {
                return false;
            }
            let h = a.total_h() as usize;
            if h > 1 || mol.degree(i) + h != 4 {
                return false;
            }
            let distinct: BTreeSet<usize> =
                mol.adjacency[i].iter().map(|&(n, _)| classes[n]).collect();
            distinct.len() == mol.degree(i)
        })
        .count()
}

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

/// Bertz-style complexity: information content of the bond-type and
/// atom-environment distributions.
pub fn bertz_ct(mol: &Molecule) -> f64 {
    if mol.bond_count() == 0 {
        return 0.0;
    }

    let mut bond_counts = [0usize; 5];
    for bond in &mol.bonds {
        let idx = match bond.order {
            BondOrder::Single => 0,
            BondOrder::Double => 1,
            BondOrder::Triple => 2,
            BondOrder::Quadruple => 3,
            BondOrder::Aromatic => 4,
        };
        bond_counts[idx] += 1;
    }

    let mut env_counts: HashMap<(u8, usize, bool), usize> = HashMap::new();
    for (i, atom) in mol.atoms.iter().enumerate() {
        *env_counts
            .entry((atom.atomic_number(), mol.degree(i), atom.aromatic))
            .or_insert(0) += 1;
    }
    let atom_counts: Vec<usize> = env_counts.values().copied().collect();

    2.0 * (information_content(&bond_counts) + information_content(&atom_counts))
}

fn information_content(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    let entropy: f64 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum();
    entropy * n
}
