//! Ring perception: smallest set of smallest rings (SSSR) and the ring
//! counts derived from it.
//!
//! Candidate cycles come from shortest paths (Horton-style), and are taken in
//! order of size while they stay linearly independent over GF(2) on the bond
//! set. The number of rings kept is the cyclomatic number `m - n + c`.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::smiles::{BondOrder, Molecule};

/// One ring of the SSSR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    /// Atom indices, sorted.
    pub atoms: Vec<usize>,
    /// Bond indices, sorted.
    pub bonds: Vec<usize>,
}

impl Ring {
    pub fn size(&self) -> usize {
        self.atoms.len()
    }

    pub fn contains_atom(&self, atom: usize) -> bool {
        self.atoms.binary_search(&atom).is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    pub rings: Vec<Ring>,
    atom_ring_count: Vec<usize>,
    bond_in_ring: Vec<bool>,
}

impl RingInfo {
    /// Perceive the SSSR of `mol`.
    pub fn perceive(mol: &Molecule) -> Self {
        let rings = sssr(mol);
        let mut atom_ring_count = vec![0; mol.atom_count()];
        let mut bond_in_ring = vec![false; mol.bond_count()];
        for ring in &rings {
            for &a in &ring.atoms {
                atom_ring_count[a] += 1;
            }
            for &b in &ring.bonds {
                bond_in_ring[b] = true;
            }
        }
        Self {
            rings,
            atom_ring_count,
            bond_in_ring,
        }
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    pub fn atom_in_ring(&self, atom: usize) -> bool {
        self.atom_ring_count.get(atom).copied().unwrap_or(0) > 0
    }

    pub fn atom_ring_count(&self, atom: usize) -> usize {
        self.atom_ring_count.get(atom).copied().unwrap_or(0)
    }

    pub fn bond_in_ring(&self, bond: usize) -> bool {
        self.bond_in_ring.get(bond).copied().unwrap_or(false)
    }

    /// Whether `atom` belongs to a ring of exactly `size` atoms.
    pub fn atom_in_ring_of_size(&self, atom: usize, size: usize) -> bool {
        self.rings
            .iter()
            .any(|r| r.size() == size && r.contains_atom(atom))
    }

    /// Rings whose bonds are all aromatic.
    pub fn num_aromatic_rings(&self, mol: &Molecule) -> usize {
        self.rings.iter().filter(|r| is_aromatic(mol, r)).count()
    }

    /// Rings with at least one non-aromatic bond.
    pub fn num_aliphatic_rings(&self, mol: &Molecule) -> usize {
        self.rings.iter().filter(|r| !is_aromatic(mol, r)).count()
    }

    /// Rings made only of single bonds between non-aromatic atoms.
    pub fn num_saturated_rings(&self, mol: &Molecule) -> usize {
        self.rings.iter().filter(|r| is_saturated(mol, r)).count()
    }

    /// Aliphatic rings whose atoms are all carbon.
    pub fn num_aliphatic_carbocycles(&self, mol: &Molecule) -> usize {
        self.rings
            .iter()
            .filter(|r| !is_aromatic(mol, r) && r.atoms.iter().all(|&a| mol.atoms[a].is("C")))
            .count()
    }

    /// Atoms shared by two rings that have no other atom in common.
    pub fn num_spiro_atoms(&self) -> usize {
        let mut spiro = BTreeSet::new();
        for (i, a) in self.rings.iter().enumerate() {
            for b in &self.rings[i + 1..] {
                let shared = shared_atoms(a, b);
                if shared.len() == 1 {
                    spiro.insert(shared[0]);
                }
            }
        }
        spiro.len()
    }

    /// End atoms of the path shared by two rings that share at least two bonds.
    pub fn num_bridgehead_atoms(&self, mol: &Molecule) -> usize {
        let mut heads = BTreeSet::new();
        for (i, a) in self.rings.iter().enumerate() {
            for b in &self.rings[i + 1..] {
                let shared_bonds: Vec<usize> = a
                    .bonds
                    .iter()
                    .copied()
                    .filter(|bond| b.bonds.binary_search(bond).is_ok())
                    .collect();
                if shared_bonds.len() < 2 {
                    continue;
                }
                for atom in shared_atoms(a, b) {
                    let incident = shared_bonds
                        .iter()
                        .filter(|&&bond| {
                            let bd = &mol.bonds[bond];
                            bd.a == atom || bd.b == atom
                        })
                        .count();
                    if incident == 1 {
                        heads.insert(atom);
                    }
                }
            }
        }
        heads.len()
    }
}

fn shared_atoms(a: &Ring, b: &Ring) -> Vec<usize> {
    a.atoms
        .iter()
        .copied()
        .filter(|x| b.contains_atom(*x))
        .collect()
}

fn is_aromatic(mol: &Molecule, ring: &Ring) -> bool {
    ring.bonds
        .iter()
        .all(|&b| mol.bonds[b].order == BondOrder::Aromatic)
}

fn is_saturated(mol: &Molecule, ring: &Ring) -> bool {
    ring.bonds
        .iter()
        .all(|&b| mol.bonds[b].order == BondOrder::Single)
        && ring.atoms.iter().all(|&a| !mol.atoms[a].aromatic)
}

/// Bond set of a cycle as a GF(2) vector.
#[derive(Clone, PartialEq, Eq, Hash)]
struct BitVec(Vec<u64>);

impl BitVec {
    fn zeros(bits: usize) -> Self {
        Self(vec![0; bits.div_ceil(64)])
    }

    fn set(&mut self, bit: usize) {
        self.0[bit / 64] |= 1 << (bit % 64);
    }

    fn xor(&mut self, other: &BitVec) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a ^= b;
        }
    }

    fn highest(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * 64 + 63 - w.leading_zeros() as usize)
    }
}

struct Candidate {
    atoms: Vec<usize>,
    bonds: Vec<usize>,
}

fn sssr(mol: &Molecule) -> Vec<Ring> {
    let n = mol.atom_count();
    let m = mol.bond_count();
    let target = (m + mol.component_count()).saturating_sub(n);
    if target == 0 {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut push = |c: Candidate| {
        let mut key = c.bonds.clone();
        key.sort_unstable();
        key.dedup();
        if key.len() == c.bonds.len() && seen.insert(key) {
            candidates.push(c);
        }
    };

    // Cycles through each bond: the bond plus the shortest path between its
    // ends that avoids it.
    for (idx, bond) in mol.bonds.iter().enumerate() {
        if let Some(path) = shortest_path(mol, bond.b, bond.a, Some(idx)) {
            push(cycle_from_path(&path, idx));
        }
    }

    // Horton candidates: P(r, x) + (x, y) + P(y, r) with disjoint paths.
    for root in 0..n {
        let (dist, parent) = bfs_tree(mol, root);
        for (idx, bond) in mol.bonds.iter().enumerate() {
            let (x, y) = (bond.a, bond.b);
            let (Some(dx), Some(dy)) = (dist[x], dist[y]) else {
                continue;
            };
            if parent[y] == Some((x, idx)) || parent[x] == Some((y, idx)) {
                continue;
            }
            let px = tree_path(&parent, x);
            let py = tree_path(&parent, y);
            let left: HashSet<usize> = px.iter().map(|&(a, _)| a).collect();
            let overlap = py.iter().filter(|(a, _)| left.contains(a)).count();
            if overlap != 1 || dx + dy + 1 < 3 {
                continue;
            }
            let mut atoms: Vec<usize> = px.iter().chain(py.iter()).map(|&(a, _)| a).collect();
            let mut bonds: Vec<usize> = px
                .iter()
                .chain(py.iter())
                .filter_map(|&(_, b)| b)
                .collect();
            bonds.push(idx);
            atoms.sort_unstable();
            atoms.dedup();
            push(Candidate { atoms, bonds });
        }
    }

    candidates.sort_by(|a, b| {
        a.bonds
            .len()
            .cmp(&b.bonds.len())
            .then_with(|| a.atoms.cmp(&b.atoms))
    });

    let mut basis: BTreeMap<usize, BitVec> = BTreeMap::new();
    let mut rings = Vec::new();
    for cand in candidates {
        if rings.len() == target {
            break;
        }
        let mut v = BitVec::zeros(m);
        for &b in &cand.bonds {
            v.set(b);
        }
        while let Some(h) = v.highest() {
            match basis.get(&h) {
                Some(row) => v.xor(row),
                None => {
                    basis.insert(h, v.clone());
                    let mut bonds = cand.bonds.clone();
                    bonds.sort_unstable();
                    rings.push(Ring {
                        atoms: cand.atoms.clone(),
                        bonds,
                    });
                    break;
                }
            }
        }
    }
    rings
}

type Parent = Option<(usize, usize)>;

fn bfs_tree(mol: &Molecule, root: usize) -> (Vec<Option<usize>>, Vec<Parent>) {
    let n = mol.atom_count();
    let mut dist = vec![None; n];
    let mut parent: Vec<Parent> = vec![None; n];
    let mut queue = VecDeque::new();
    dist[root] = Some(0);
    queue.push_back(root);
    while let Some(cur) = queue.pop_front() {
        let d = dist[cur].unwrap_or(0);
        for &(next, bond) in &mol.adjacency[cur] {
            if dist[next].is_none() {
                dist[next] = Some(d + 1);
                parent[next] = Some((cur, bond));
                queue.push_back(next);
            }
        }
    }
    (dist, parent)
}

/// Path from `node` back to the BFS root: `(atom, bond to its parent)`.
fn tree_path(parent: &[Parent], node: usize) -> Vec<(usize, Option<usize>)> {
    let mut path = Vec::new();
    let mut cur = node;
    loop {
        match parent[cur] {
            Some((p, bond)) => {
                path.push((cur, Some(bond)));
                cur = p;
            }
            None => {
                path.push((cur, None));
                break;
            }
        }
    }
    path
}

/// Shortest path of atoms from `from` to `to`, optionally ignoring one bond.
fn shortest_path(
    mol: &Molecule,
    from: usize,
    to: usize,
    skip: Option<usize>,
) -> Option<Vec<(usize, Option<usize>)>> {
    let n = mol.atom_count();
    let mut parent: Vec<Parent> = vec![None; n];
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();
    visited[from] = true;
    queue.push_back(from);
    while let Some(cur) = queue.pop_front() {
        if cur == to {
            let mut path = Vec::new();
            let mut node = to;
            while let Some((p, bond)) = parent[node] {
                path.push((node, Some(bond)));
                node = p;
            }
            path.push((from, None));
            return Some(path);
        }
        for &(next, bond) in &mol.adjacency[cur] {
            if Some(bond) == skip || visited[next] {
                continue;
            }
            visited[next] = true;
            parent[next] = Some((cur, bond));
            queue.push_back(next);
        }
    }
    None
}

fn cycle_from_path(path: &[(usize, Option<usize>)], closing: usize) -> Candidate {
    let mut atoms: Vec<usize> = path.iter().map(|&(a, _)| a).collect();
    let mut bonds: Vec<usize> = path.iter().filter_map(|&(_, b)| b).collect();
    bonds.push(closing);
    atoms.sort_unstable();
    atoms.dedup();
    Candidate { atoms, bonds }
}
