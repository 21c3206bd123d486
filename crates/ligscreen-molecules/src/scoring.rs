//! Kinase-likeness scoring of candidate molecules.
//!
//! Points for each property falling inside the range typical of ATP-pocket
//! kinase inhibitors; the maximum is [`KinaseScorer::MAX_SCORE`].

use std::ops::RangeInclusive;

use crate::descriptors::MolecularDescriptors;

/// Scorer for kinase-likeness.
#[derive(Debug, Clone)]
pub struct KinaseScorer {
    molecular_weight: RangeInclusive<f64>,
    aromatic_rings: RangeInclusive<usize>,
    tpsa: RangeInclusive<f64>,
    h_donors: RangeInclusive<usize>,
    h_acceptors: RangeInclusive<usize>,
    rotatable_bonds: RangeInclusive<usize>,
}

impl Default for KinaseScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl KinaseScorer {
    pub const MAX_SCORE: u32 = 11;

    pub fn new() -> Self {
        Self {
            molecular_weight: 300.0..=500.0,
            aromatic_rings: 2..=4,
            tpsa: 40.0..=100.0,
            h_donors: 1..=4,
            h_acceptors: 3..=7,
            rotatable_bonds: 2..=6,
        }
    }

    /// Two points each for MW, aromatic rings, TPSA, donors and acceptors in
    /// range, one for rotatable bonds.
    pub fn score(&self, desc: &MolecularDescriptors) -> u32 {
        let mut score = 0;
        if self.molecular_weight.contains(&desc.molecular_weight) {
            score += 2;
        }
        if self.aromatic_rings.contains(&desc.num_aromatic_rings) {
            score += 2;
        }
        if self.tpsa.contains(&desc.tpsa) {
            score += 2;
        }
        if self.h_donors.contains(&desc.num_h_donors) {
            score += 2;
        }
        if self.h_acceptors.contains(&desc.num_h_acceptors) {
            score += 2;
        }
        if self.rotatable_bonds.contains(&desc.num_rotatable_bonds) {
            score += 1;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> MolecularDescriptors {
        let mut d = MolecularDescriptors::from_smiles("C").unwrap();
        d.molecular_weight = 400.0;
        d.num_aromatic_rings = 3;
        d.tpsa = 80.0;
        d.num_h_donors = 2;
        d.num_h_acceptors = 5;
        d.num_rotatable_bonds = 4;
        d
    }

    #[test]
    fn test_full_score() {
        assert_eq!(KinaseScorer::new().score(&base()), KinaseScorer::MAX_SCORE);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let mut d = base();
        d.molecular_weight = 500.0;
        d.tpsa = 40.0;
        d.num_rotatable_bonds = 6;
        assert_eq!(KinaseScorer::new().score(&d), 11);
    }

    #[test]
    fn test_partial_scores() {
        let scorer = KinaseScorer::new();
        let mut d = base();
        d.molecular_weight = 250.0;
        assert_eq!(scorer.score(&d), 9);
        d.num_rotatable_bonds = 9;
        assert_eq!(scorer.score(&d), 8);
        d.num_h_donors = 0;
        d.num_h_acceptors = 8;
        assert_eq!(scorer.score(&d), 4);
    }

    #[test]
    fn test_methane_scores_zero() {
        let d = MolecularDescriptors::from_smiles("C").unwrap();
        assert_eq!(KinaseScorer::default().score(&d), 0);
    }
}
