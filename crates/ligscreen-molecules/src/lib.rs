//! ligscreen-molecules: ligand handling and the per-stage pipeline logic.
//!
//! Stages, in pipeline order:
//! 1. Numbering the ligand list and converting SMILES to PDBQT (Meeko)
//! 2. Molecular docking (AutoDock Vina) and best-affinity collection
//! 3. Co-folding affinity prediction (Boltz) and result collection
//! 4. Descriptor profiling of the top-ranked candidates
//!
//! Descriptors are computed natively on a SMILES graph (`smiles`, `rings`,
//! `descriptors`, `druglikeness`, `admet`, `scoring`).

pub mod admet;
pub mod boltz;
pub mod descriptors;
pub mod docking;
pub mod druglikeness;
pub mod ligand;
pub mod profile;
pub mod rings;
pub mod scoring;
pub mod smiles;
pub mod vina_scores;
