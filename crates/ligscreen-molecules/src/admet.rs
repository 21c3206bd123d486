//! ADMET heuristics for candidate molecules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptors::MolecularDescriptors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolubilityClass {
    HighlySoluble,
    Soluble,
    ModeratelySoluble,
    PoorlySoluble,
}

impl SolubilityClass {
    pub fn is_soluble(self) -> bool {
        matches!(self, SolubilityClass::HighlySoluble | SolubilityClass::Soluble)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BbbPermeability {
    Likely,
    Uncertain,
    Unlikely,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Risk {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clearance {
    Fast,
    Moderate,
    Slow,
}

impl fmt::Display for SolubilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolubilityClass::HighlySoluble => "Highly soluble",
            SolubilityClass::Soluble => "Soluble",
            SolubilityClass::ModeratelySoluble => "Moderately soluble",
            SolubilityClass::PoorlySoluble => "Poorly soluble",
        })
    }
}

impl fmt::Display for BbbPermeability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BbbPermeability::Likely => "Likely",
            BbbPermeability::Uncertain => "Uncertain",
            BbbPermeability::Unlikely => "Unlikely",
        })
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Risk::High => "High risk",
            Risk::Moderate => "Moderate risk",
            Risk::Low => "Low risk",
        })
    }
}

impl fmt::Display for Clearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Clearance::Fast => "Fast",
            Clearance::Moderate => "Moderate",
            Clearance::Slow => "Slow",
        })
    }
}

/// ADMET properties for a molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmetProperties {
    /// Simplified ESOL estimate, log mol/L.
    pub solubility_logs: f64,
    pub solubility_class: SolubilityClass,
    pub bbb_permeability: BbbPermeability,
    pub cyp3a4_inhibitor: Risk,
    pub herg_liability: Risk,
    pub clearance: Clearance,
}

/// Predictor for ADMET properties.
#[derive(Debug, Default)]
pub struct AdmetPredictor {}

impl AdmetPredictor {
    pub fn new() -> Self {
        Self {}
    }

    /// Predict ADMET properties from precomputed descriptors.
    pub fn predict(&self, desc: &MolecularDescriptors) -> AdmetProperties {
        let mw = desc.molecular_weight;
        let logp = desc.logp;
        let tpsa = desc.tpsa;
        let aromatic_rings = desc.num_aromatic_rings;

        let logs = 0.5 - 0.01 * mw - logp;
        let solubility_class = if logs >= -1.0 {
            SolubilityClass::HighlySoluble
        } else if logs >= -3.0 {
            SolubilityClass::Soluble
        } else if logs >= -5.0 {
            SolubilityClass::ModeratelySoluble
        } else {
            SolubilityClass::PoorlySoluble
        };

        let bbb_permeability = if tpsa < 90.0 && mw < 450.0 {
            BbbPermeability::Likely
        } else if tpsa < 120.0 && mw < 500.0 {
            BbbPermeability::Uncertain
        } else {
            BbbPermeability::Unlikely
        };

        let cyp3a4_inhibitor = if mw > 400.0 && logp > 3.0 {
            Risk::High
        } else if mw > 350.0 && logp > 2.0 {
            Risk::Moderate
        } else {
            Risk::Low
        };

        let herg_liability = if desc.has_nh_nitrogen && aromatic_rings >= 2 && logp > 3.0 {
            Risk::High
        } else if aromatic_rings >= 2 && logp > 2.0 {
            Risk::Moderate
        } else {
            Risk::Low
        };

        let clearance_score = (500.0 - mw) / 100.0 + tpsa / 50.0;
        let clearance = if clearance_score > 4.0 {
            Clearance::Fast
        } else if clearance_score > 2.0 {
            Clearance::Moderate
        } else {
            Clearance::Slow
        };

        AdmetProperties {
            solubility_logs: logs,
            solubility_class,
            bbb_permeability,
            cyp3a4_inhibitor,
            herg_liability,
            clearance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors(mw: f64, logp: f64, tpsa: f64, aromatic_rings: usize, nh: bool) -> MolecularDescriptors {
        let mut d = MolecularDescriptors::from_smiles("C").unwrap();
        d.molecular_weight = mw;
        d.logp = logp;
        d.tpsa = tpsa;
        d.num_aromatic_rings = aromatic_rings;
        d.has_nh_nitrogen = nh;
        d
    }

    #[test]
    fn test_solubility_estimate_and_classes() {
        let p = AdmetPredictor::new();
        let props = p.predict(&descriptors(200.0, 0.5, 50.0, 1, false));
        assert!((props.solubility_logs - (-2.0)).abs() < 1e-9);
        assert_eq!(props.solubility_class, SolubilityClass::Soluble);
        assert!(props.solubility_class.is_soluble());

        let props = p.predict(&descriptors(100.0, -2.0, 50.0, 1, false));
        assert_eq!(props.solubility_class, SolubilityClass::HighlySoluble);

        let props = p.predict(&descriptors(450.0, 4.0, 50.0, 1, false));
        assert_eq!(props.solubility_class, SolubilityClass::PoorlySoluble);
        assert!(!props.solubility_class.is_soluble());
        assert_eq!(props.solubility_class.to_string(), "Poorly soluble");
    }

    #[test]
    fn test_bbb_rules() {
        let p = AdmetPredictor::new();
        assert_eq!(p.predict(&descriptors(300.0, 2.0, 60.0, 1, false)).bbb_permeability, BbbPermeability::Likely);
        assert_eq!(p.predict(&descriptors(470.0, 2.0, 60.0, 1, false)).bbb_permeability, BbbPermeability::Uncertain);
        assert_eq!(p.predict(&descriptors(300.0, 2.0, 130.0, 1, false)).bbb_permeability, BbbPermeability::Unlikely);
    }

    #[test]
    fn test_cyp3a4_and_herg() {
        let p = AdmetPredictor::new();
        let props = p.predict(&descriptors(420.0, 3.5, 60.0, 2, true));
        assert_eq!(props.cyp3a4_inhibitor, Risk::High);
        assert_eq!(props.herg_liability, Risk::High);
        assert_eq!(props.herg_liability.to_string(), "High risk");

        let props = p.predict(&descriptors(380.0, 3.5, 60.0, 2, false));
        assert_eq!(props.cyp3a4_inhibitor, Risk::Moderate);
        assert_eq!(props.herg_liability, Risk::Moderate);

        let props = p.predict(&descriptors(300.0, 1.0, 60.0, 1, true));
        assert_eq!(props.cyp3a4_inhibitor, Risk::Low);
        assert_eq!(props.herg_liability, Risk::Low);
    }

    #[test]
    fn test_clearance() {
        let p = AdmetPredictor::new();
        // (500-200)/100 + 100/50 = 5
        assert_eq!(p.predict(&descriptors(200.0, 1.0, 100.0, 1, false)).clearance, Clearance::Fast);
        // (500-400)/100 + 100/50 = 3
        assert_eq!(p.predict(&descriptors(400.0, 1.0, 100.0, 1, false)).clearance, Clearance::Moderate);
        // (500-480)/100 + 50/50 = 1.2
        assert_eq!(p.predict(&descriptors(480.0, 1.0, 50.0, 1, false)).clearance, Clearance::Slow);
    }
}
