//! SMILES parsing into a molecular graph.
//!
//! Supports the organic subset, bracket atoms (isotope, chirality, hydrogen
//! count, charge, atom class), explicit bond symbols, branches, ring closures
//! (including `%nn`) and dot-disconnected components.
//!
//! A parsed graph is sanitized before it is returned: aromatic atoms must sit
//! in a ring, every aromatic system must have a Kekulé structure, and no atom
//! may exceed its allowed valence. Implicit hydrogens are assigned from the
//! Kekulé form.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SmilesError {
    #[error("empty SMILES")]
    Empty,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unknown element '{0}'")]
    UnknownElement(String),
    #[error("unterminated bracket atom starting at position {0}")]
    UnterminatedBracket(usize),
    #[error("unbalanced parenthesis at position {0}")]
    UnbalancedBranch(usize),
    #[error("ring closure {0} is never closed")]
    UnclosedRing(u16),
    #[error("bond symbol at position {0} is not followed by an atom")]
    DanglingBond(usize),
    #[error("invalid ring closure {0}")]
    InvalidRingClosure(u16),
    #[error("aromatic atom {0} is not in a ring")]
    AromaticOutsideRing(usize),
    #[error("cannot kekulize the aromatic system containing atom {0}")]
    Kekulize(usize),
    #[error("atom {atom} ({symbol}) has valence {valence}, more than allowed")]
    Valence {
        atom: usize,
        symbol: &'static str,
        valence: u8,
    },
}

/// Static data for an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub symbol: &'static str,
    pub atomic_number: u8,
    /// Standard atomic weight.
    pub mass: f64,
    /// Default valences used to derive implicit hydrogens, ascending.
    pub valences: &'static [u8],
}

const ELEMENTS: &[ElementData] = &[
    ElementData { symbol: "*", atomic_number: 0, mass: 0.0, valences: &[] },
    ElementData { symbol: "H", atomic_number: 1, mass: 1.008, valences: &[1] },
    ElementData { symbol: "Li", atomic_number: 3, mass: 6.94, valences: &[1] },
    ElementData { symbol: "B", atomic_number: 5, mass: 10.812, valences: &[3] },
    ElementData { symbol: "C", atomic_number: 6, mass: 12.011, valences: &[4] },
    ElementData { symbol: "N", atomic_number: 7, mass: 14.007, valences: &[3, 5] },
    ElementData { symbol: "O", atomic_number: 8, mass: 15.999, valences: &[2] },
    ElementData { symbol: "F", atomic_number: 9, mass: 18.998, valences: &[1] },
    ElementData { symbol: "Na", atomic_number: 11, mass: 22.99, valences: &[1] },
    ElementData { symbol: "Mg", atomic_number: 12, mass: 24.305, valences: &[2] },
    ElementData { symbol: "Al", atomic_number: 13, mass: 26.982, valences: &[3] },
    ElementData { symbol: "Si", atomic_number: 14, mass: 28.086, valences: &[4] },
    ElementData { symbol: "P", atomic_number: 15, mass: 30.974, valences: &[3, 5] },
    ElementData { symbol: "S", atomic_number: 16, mass: 32.067, valences: &[2, 4, 6] },
    ElementData { symbol: "Cl", atomic_number: 17, mass: 35.453, valences: &[1] },
    ElementData { symbol: "K", atomic_number: 19, mass: 39.098, valences: &[1] },
    ElementData { symbol: "Ca", atomic_number: 20, mass: 40.078, valences: &[2] },
    ElementData { symbol: "Mn", atomic_number: 25, mass: 54.938, valences: &[] },
    ElementData { symbol: "Fe", atomic_number: 26, mass: 55.845, valences: &[] },
    ElementData { symbol: "Co", atomic_number: 27, mass: 58.933, valences: &[] },
    ElementData { symbol: "Cu", atomic_number: 29, mass: 63.546, valences: &[] },
    ElementData { symbol: "Zn", atomic_number: 30, mass: 65.39, valences: &[] },
    ElementData { symbol: "Ge", atomic_number: 32, mass: 72.61, valences: &[4] },
    ElementData { symbol: "As", atomic_number: 33, mass: 74.922, valences: &[3, 5] },
    ElementData { symbol: "Se", atomic_number: 34, mass: 78.96, valences: &[2, 4, 6] },
    ElementData { symbol: "Br", atomic_number: 35, mass: 79.904, valences: &[1] },
    ElementData { symbol: "Sn", atomic_number: 50, mass: 118.71, valences: &[] },
    ElementData { symbol: "Te", atomic_number: 52, mass: 127.6, valences: &[2, 4, 6] },
    ElementData { symbol: "I", atomic_number: 53, mass: 126.904, valences: &[1] },
    ElementData { symbol: "Pt", atomic_number: 78, mass: 195.08, valences: &[] },
];

/// Look up an element by symbol (case-sensitive, e.g. `"Cl"`).
pub fn element(symbol: &str) -> Option<&'static ElementData> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to the explicit valence of each end atom.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chirality {
    None,
    /// `@`
    CounterClockwise,
    /// `@@`
    Clockwise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: &'static ElementData,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    pub chirality: Chirality,
    /// Written in brackets; bracket atoms carry no implicit hydrogens.
    pub bracket: bool,
    /// Hydrogen count written inside the brackets.
    pub explicit_h: u8,
    /// Hydrogens derived from default valences (organic subset only).
    pub implicit_h: u8,
}

impl Atom {
    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number
    }

    pub fn symbol(&self) -> &'static str {
        self.element.symbol
    }

    pub fn total_h(&self) -> u8 {
        self.explicit_h + self.implicit_h
    }

    pub fn is(&self, symbol: &str) -> bool {
        self.element.symbol == symbol
    }

    /// Valences the atom may take. A charged atom takes those of its
    /// isoelectronic neutral element (N+ like C, O- like F); an empty slice
    /// means unchecked.
    pub fn allowed_valences(&self) -> &'static [u8] {
        if self.charge == 0 {
            return self.element.valences;
        }
        let shifted = self.element.atomic_number as i16 - self.charge as i16;
        ELEMENTS
            .iter()
            .find(|e| e.atomic_number as i16 == shifted)
            .map(|e| e.valences)
            .unwrap_or(&[])
    }

    /// Mass of the atom without its hydrogens.
    pub fn mass(&self) -> f64 {
        match self.isotope {
            Some(iso) => iso as f64,
            None => self.element.mass,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn other(&self, atom: usize) -> usize {
        if self.a == atom {
            self.b
        } else {
            self.a
        }
    }
}

/// Molecular graph parsed from SMILES. Hydrogens are implicit unless written
/// as separate bracket atoms.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// Per atom: `(neighbor, bond index)`.
    pub adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Number of explicit (graph) neighbours.
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Bond orders incident to `atom`.
    pub fn bond_orders(&self, atom: usize) -> impl Iterator<Item = BondOrder> + '_ {
        self.adjacency[atom].iter().map(move |&(_, b)| self.bonds[b].order)
    }

    pub fn has_bond_order(&self, atom: usize, order: BondOrder) -> bool {
        self.bond_orders(atom).any(|o| o == order)
    }

    /// Explicit valence from bonds (aromatic bonds count one).
    pub fn explicit_valence(&self, atom: usize) -> u8 {
        self.bond_orders(atom).map(BondOrder::valence).sum()
    }

    /// Explicit valence plus all hydrogens.
    pub fn total_valence(&self, atom: usize) -> u8 {
        self.explicit_valence(atom) + self.atoms[atom].total_h()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, idx)| &self.bonds[idx])
    }

    /// Number of connected components.
    pub fn component_count(&self) -> usize {
        let n = self.atoms.len();
        let mut seen = vec![false; n];
        let mut components = 0;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            components += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(cur) = stack.pop() {
                for &(next, _) in &self.adjacency[cur] {
                    if !seen[next] {
                        seen[next] = true;
                        stack.push(next);
                    }
                }
            }
        }
        components
    }

    fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) {
        let idx = self.bonds.len();
        self.bonds.push(Bond { a, b, order });
        self.adjacency[a].push((b, idx));
        self.adjacency[b].push((a, idx));
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    /// Whether `bond` lies on a cycle, i.e. its ends stay connected without it.
    fn bond_in_cycle(&self, bond: usize) -> bool {
        let Bond { a, b, .. } = self.bonds[bond];
        let mut seen = vec![false; self.atoms.len()];
        let mut stack = vec![a];
        seen[a] = true;
        while let Some(cur) = stack.pop() {
            for &(next, idx) in &self.adjacency[cur] {
                if idx == bond || seen[next] {
                    continue;
                }
                if next == b {
                    return true;
                }
                seen[next] = true;
                stack.push(next);
            }
        }
        false
    }

    fn check_aromatic_rings(&self) -> Result<(), SmilesError> {
        for (i, atom) in self.atoms.iter().enumerate() {
            if atom.aromatic && !self.adjacency[i].iter().any(|&(_, b)| self.bond_in_cycle(b)) {
                return Err(SmilesError::AromaticOutsideRing(i));
            }
        }
        Ok(())
    }

    /// An aromatic atom needs a double bond in the Kekulé form when its
    /// written bonds and hydrogens leave one valence unit open. Atoms with an
    /// explicit multiple bond (pyridone C=O) already have theirs.
    fn needs_pi_bond(&self, atom: usize) -> bool {
        let a = &self.atoms[atom];
        if !a.aromatic
            || self
                .bond_orders(atom)
                .any(|o| matches!(o, BondOrder::Double | BondOrder::Triple | BondOrder::Quadruple))
        {
            return false;
        }
        let used = self.explicit_valence(atom) + a.explicit_h;
        a.allowed_valences()
            .iter()
            .find(|&&v| v >= used)
            .is_some_and(|&v| v > used)
    }

    /// Assign the aromatic double bonds. Returns, per atom, whether it takes a
    /// double bond in the Kekulé structure.
    fn kekulize(&self) -> Result<Vec<bool>, SmilesError> {
        let n = self.atoms.len();
        let candidates: Vec<bool> = (0..n).map(|i| self.needs_pi_bond(i)).collect();
        let adjacency: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                if !candidates[i] {
                    return Vec::new();
                }
                self.adjacency[i]
                    .iter()
                    .filter(|&&(nb, b)| candidates[nb] && self.bonds[b].order == BondOrder::Aromatic)
                    .map(|&(nb, _)| nb)
                    .collect()
            })
            .collect();

        // an odd-sized system can never be paired up
        let mut seen = vec![false; n];
        for start in (0..n).filter(|&i| candidates[i]) {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut stack = vec![start];
            let mut size = 0usize;
            while let Some(cur) = stack.pop() {
                size += 1;
                for &next in &adjacency[cur] {
                    if !seen[next] {
                        seen[next] = true;
                        stack.push(next);
                    }
                }
            }
            if size % 2 == 1 {
                return Err(SmilesError::Kekulize(start));
            }
        }

        let mut partner = vec![None; n];
        if let Err(atom) = match_pi_bonds(&adjacency, &candidates, &mut partner) {
            return Err(SmilesError::Kekulize(atom));
        }
        Ok(candidates)
    }

    /// Fill `implicit_h` for organic-subset atoms.
    fn assign_implicit_hydrogens(&mut self, pi: &[bool]) {
        for i in 0..self.atoms.len() {
            if self.atoms[i].bracket {
                continue;
            }
            let valence = self.explicit_valence(i) + u8::from(pi[i]);
            let implicit = self.atoms[i]
                .element
                .valences
                .iter()
                .find(|&&v| v >= valence)
                .map(|&v| v - valence)
                .unwrap_or(0);
            self.atoms[i].implicit_h = implicit;
        }
    }

    fn check_valences(&self, pi: &[bool]) -> Result<(), SmilesError> {
        for (i, atom) in self.atoms.iter().enumerate() {
            let Some(&max) = atom.allowed_valences().iter().max() else {
                continue;
            };
            let valence = self.total_valence(i) + u8::from(pi[i]);
            if valence > max {
                return Err(SmilesError::Valence {
                    atom: i,
                    symbol: atom.symbol(),
                    valence,
                });
            }
        }
        Ok(())
    }
}

/// Perfect matching over the atoms that need a double bond, by backtracking
/// from the most constrained atom. On failure returns an atom left unmatched.
fn match_pi_bonds(
    adjacency: &[Vec<usize>],
    candidates: &[bool],
    partner: &mut [Option<usize>],
) -> Result<(), usize> {
    let mut pick: Option<(usize, usize)> = None;
    for v in 0..adjacency.len() {
        if !candidates[v] || partner[v].is_some() {
            continue;
        }
        let free = adjacency[v].iter().filter(|&&n| partner[n].is_none()).count();
        if free == 0 {
            return Err(v);
        }
        if pick.map_or(true, |(_, f)| free < f) {
            pick = Some((v, free));
        }
    }
    let Some((v, _)) = pick else {
        return Ok(());
    };

    for &n in &adjacency[v] {
        if partner[n].is_some() {
            continue;
        }
        partner[v] = Some(n);
        partner[n] = Some(v);
        if match_pi_bonds(adjacency, candidates, partner).is_ok() {
            return Ok(());
        }
        partner[v] = None;
        partner[n] = None;
    }
    Err(v)
}

/// Parse a SMILES string into a [`Molecule`].
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    let text = smiles.trim();
    if text.is_empty() {
        return Err(SmilesError::Empty);
    }
    Parser::new(text).run()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    pending_bond: Option<(BondOrder, usize)>,
    branches: Vec<(Option<usize>, usize)>,
    rings: HashMap<u16, (usize, Option<BondOrder>)>,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            mol: Molecule::default(),
            prev: None,
            pending_bond: None,
            branches: Vec::new(),
            rings: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Result<Molecule, SmilesError> {
        while let Some(c) = self.peek() {
            match c {
                '-' | '/' | '\\' => self.bond(BondOrder::Single),
                '=' => self.bond(BondOrder::Double),
                '#' => self.bond(BondOrder::Triple),
                '$' => self.bond(BondOrder::Quadruple),
                ':' => self.bond(BondOrder::Aromatic),
                '(' => {
                    if self.prev.is_none() {
                        return Err(SmilesError::UnbalancedBranch(self.pos));
                    }
                    self.branches.push((self.prev, self.pos));
                    self.pos += 1;
                }
                ')' => {
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond(self.pos));
                    }
                    let (prev, _) = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnbalancedBranch(self.pos))?;
                    self.prev = prev;
                    self.pos += 1;
                }
                '.' => {
                    if let Some((_, at)) = self.pending_bond {
                        return Err(SmilesError::DanglingBond(at));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '%' => {
                    let d1 = self.peek_at(1).and_then(|c| c.to_digit(10));
                    let d2 = self.peek_at(2).and_then(|c| c.to_digit(10));
                    match (d1, d2) {
                        (Some(a), Some(b)) => {
                            self.pos += 3;
                            self.ring_closure((a * 10 + b) as u16)?;
                        }
                        _ => return Err(SmilesError::UnexpectedChar { ch: c, pos: self.pos }),
                    }
                }
                d if d.is_ascii_digit() => {
                    self.pos += 1;
                    self.ring_closure(d.to_digit(10).unwrap_or(0) as u16)?;
                }
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.attach(atom);
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.attach(atom);
                }
            }
        }

        if let Some((_, at)) = self.pending_bond {
            return Err(SmilesError::DanglingBond(at));
        }
        if let Some(&(_, at)) = self.branches.last() {
            return Err(SmilesError::UnbalancedBranch(at));
        }
        if let Some(&ring) = self.rings.keys().min() {
            return Err(SmilesError::UnclosedRing(ring));
        }
        if self.mol.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }

        self.mol.check_aromatic_rings()?;
        let pi = self.mol.kekulize()?;
        self.mol.assign_implicit_hydrogens(&pi);
        self.mol.check_valences(&pi)?;
        Ok(self.mol)
    }

    fn bond(&mut self, order: BondOrder) {
        self.pending_bond = Some((order, self.pos));
        self.pos += 1;
    }

    fn attach(&mut self, atom: Atom) {
        let idx = self.mol.add_atom(atom);
        if let Some(prev) = self.prev {
            let order = match self.pending_bond.take() {
                Some((o, _)) => o,
                None => self.mol.default_order(prev, idx),
            };
            self.mol.add_bond(prev, idx, order);
        }
        self.pending_bond = None;
        self.prev = Some(idx);
    }

    fn ring_closure(&mut self, number: u16) -> Result<(), SmilesError> {
        let current = self.prev.ok_or(SmilesError::InvalidRingClosure(number))?;
        let here = self.pending_bond.take().map(|(o, _)| o);
        match self.rings.remove(&number) {
            Some((open_atom, there)) => {
                if open_atom == current || self.mol.bond_between(open_atom, current).is_some() {
                    return Err(SmilesError::InvalidRingClosure(number));
                }
                let order = here
                    .or(there)
                    .unwrap_or_else(|| self.mol.default_order(open_atom, current));
                self.mol.add_bond(open_atom, current, order);
            }
            None => {
                self.rings.insert(number, (current, here));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        let c = self.chars[start];
        let (symbol, aromatic, len) = match c {
            'C' if self.peek_at(1) == Some('l') => ("Cl", false, 2),
            'B' if self.peek_at(1) == Some('r') => ("Br", false, 2),
            'B' => ("B", false, 1),
            'C' => ("C", false, 1),
            'N' => ("N", false, 1),
            'O' => ("O", false, 1),
            'P' => ("P", false, 1),
            'S' => ("S", false, 1),
            'F' => ("F", false, 1),
            'I' => ("I", false, 1),
            'b' => ("B", true, 1),
            'c' => ("C", true, 1),
            'n' => ("N", true, 1),
            'o' => ("O", true, 1),
            'p' => ("P", true, 1),
            's' => ("S", true, 1),
            '*' => ("*", false, 1),
            _ => return Err(SmilesError::UnexpectedChar { ch: c, pos: start }),
        };
        self.pos += len;
        let element = element(symbol).ok_or_else(|| SmilesError::UnknownElement(symbol.to_string()))?;
        Ok(Atom {
            element,
            aromatic,
            charge: 0,
            isotope: None,
            chirality: Chirality::None,
            bracket: false,
            explicit_h: 0,
            implicit_h: 0,
        })
    }

    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let open = self.pos;
        let close = self.chars[open..]
            .iter()
            .position(|&c| c == ']')
            .map(|off| open + off)
            .ok_or(SmilesError::UnterminatedBracket(open))?;
        let body: Vec<char> = self.chars[open + 1..close].to_vec();
        self.pos = close + 1;

        let mut i = 0;
        let err = |i: usize| SmilesError::UnexpectedChar {
            ch: body.get(i).copied().unwrap_or(']'),
            pos: open + 1 + i,
        };

        // isotope
        let mut isotope = None;
        let digits: String = body.iter().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            isotope = digits.parse::<u16>().ok();
            i += digits.len();
        }

        // element symbol
        let first = *body.get(i).ok_or_else(|| err(i))?;
        let (symbol, aromatic) = if first.is_ascii_lowercase() {
            let two: String = body[i..].iter().take(2).collect();
            if matches!(two.as_str(), "se" | "as" | "te") {
                i += 2;
                let mut s = two.clone();
                s[..1].make_ascii_uppercase();
                (s, true)
            } else {
                i += 1;
                (first.to_ascii_uppercase().to_string(), true)
            }
        } else if first.is_ascii_uppercase() || first == '*' {
            let candidate: String = body[i..].iter().take(2).collect();
            if candidate.len() == 2
                && candidate.chars().nth(1).is_some_and(|c| c.is_ascii_lowercase())
                && element(&candidate).is_some()
            {
                i += 2;
                (candidate, false)
            } else {
                i += 1;
                (first.to_string(), false)
            }
        } else {
            return Err(err(i));
        };
        let element = element(&symbol).ok_or_else(|| SmilesError::UnknownElement(symbol.clone()))?;

        // chirality
        let mut chirality = Chirality::None;
        if body.get(i) == Some(&'@') {
            i += 1;
            chirality = Chirality::CounterClockwise;
            if body.get(i) == Some(&'@') {
                i += 1;
                chirality = Chirality::Clockwise;
            } else {
                let tag: String = body[i..].iter().take(2).collect();
                if matches!(tag.as_str(), "TH" | "AL" | "SP" | "TB" | "OH") {
                    i += 2;
                    while body.get(i).is_some_and(|c| c.is_ascii_digit()) {
                        i += 1;
                    }
                }
            }
        }

        // hydrogen count
        let mut explicit_h = 0u8;
        if body.get(i) == Some(&'H') {
            i += 1;
            explicit_h = 1;
            let digits: String = body[i..].iter().take_while(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() {
                explicit_h = digits.parse().map_err(|_| err(i))?;
                i += digits.len();
            }
        }

        // charge
        let mut charge = 0i8;
        if let Some(&sign) = body.get(i).filter(|c| **c == '+' || **c == '-') {
            let unit: i8 = if sign == '+' { 1 } else { -1 };
            i += 1;
            let digits: String = body[i..].iter().take_while(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() {
                let magnitude: i8 = digits.parse().map_err(|_| err(i))?;
                charge = unit * magnitude;
                i += digits.len();
            } else {
                charge = unit;
                while body.get(i) == Some(&sign) {
                    charge += unit;
                    i += 1;
                }
            }
        }

        // atom class
        if body.get(i) == Some(&':') {
            i += 1;
            while body.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
        }

        if i != body.len() {
            return Err(err(i));
        }

        Ok(Atom {
            element,
            aromatic,
            charge,
            isotope,
            chirality,
            bracket: true,
            explicit_h,
            implicit_h: 0,
        })
    }
}

impl std::fmt::Display for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Molecule({} atoms, {} bonds)", self.atom_count(), self.bond_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogens(mol: &Molecule) -> Vec<u8> {
        mol.atoms.iter().map(Atom::total_h).collect()
    }

    #[test]
    fn test_ethanol() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(hydrogens(&mol), vec![3, 2, 1]);
    }

    #[test]
    fn test_benzene_and_pyridine_hydrogens() {
        let benzene = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(benzene.bond_count(), 6);
        assert!(benzene.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
        assert!(hydrogens(&benzene).iter().all(|&h| h == 1));

        let pyridine = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(pyridine.atoms[3].total_h(), 0);

        let pyrrole = parse_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(pyrrole.atoms[3].total_h(), 1);

        let thiophene = parse_smiles("c1ccsc1").unwrap();
        assert_eq!(thiophene.atoms[3].total_h(), 0);
    }

    #[test]
    fn test_branches_and_bond_orders() {
        // acetic acid
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(mol.bond_between(1, 2).unwrap().order, BondOrder::Double);
        assert_eq!(hydrogens(&mol), vec![3, 0, 0, 1]);

        let nitrile = parse_smiles("CC#N").unwrap();
        assert_eq!(nitrile.atoms[2].total_h(), 0);
        assert_eq!(nitrile.atoms[1].total_h(), 0);
    }

    #[test]
    fn test_two_letter_ring_closure() {
        let mol = parse_smiles("C%10CCCCC%10").unwrap();
        assert_eq!(mol.bond_count(), 6);
        assert!(mol.bond_between(0, 5).is_some());
        assert_eq!(mol.component_count(), 1);
    }

    #[test]
    fn test_ring_closure_with_bond_symbol() {
        let mol = parse_smiles("C=1CCCCC=1").unwrap();
        assert_eq!(mol.bond_between(0, 5).unwrap().order, BondOrder::Double);
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = parse_smiles("[NH4+]").unwrap();
        assert_eq!(mol.atoms[0].charge, 1);
        assert_eq!(mol.atoms[0].total_h(), 4);

        let mol = parse_smiles("[O-]C(=O)C").unwrap();
        assert_eq!(mol.atoms[0].charge, -1);
        assert_eq!(mol.atoms[0].total_h(), 0);

        let mol = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        assert_eq!(mol.atoms[1].chirality, Chirality::Clockwise);
        assert_eq!(mol.atoms[1].total_h(), 1);

        let mol = parse_smiles("[13CH4]").unwrap();
        assert_eq!(mol.atoms[0].isotope, Some(13));

        let mol = parse_smiles("[Fe++]").unwrap();
        assert_eq!(mol.atoms[0].charge, 2);

        let mol = parse_smiles("Cl[Se]c1cc[se]c1").unwrap();
        assert!(mol.atoms[5].aromatic);
        assert!(mol.atoms[5].is("Se"));
    }

    #[test]
    fn test_disconnected_components() {
        let mol = parse_smiles("[Na+].[Cl-]").unwrap();
        assert_eq!(mol.component_count(), 2);
        assert_eq!(mol.bond_count(), 0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_smiles("").unwrap_err(), SmilesError::Empty);
        assert_eq!(parse_smiles("C1CC").unwrap_err(), SmilesError::UnclosedRing(1));
        assert!(matches!(parse_smiles("CC(C").unwrap_err(), SmilesError::UnbalancedBranch(_)));
        assert!(matches!(parse_smiles("CC)C").unwrap_err(), SmilesError::UnbalancedBranch(_)));
        assert!(matches!(parse_smiles("CC=").unwrap_err(), SmilesError::DanglingBond(_)));
        assert!(matches!(parse_smiles("C[Xx]").unwrap_err(), SmilesError::UnknownElement(_)));
        assert!(matches!(parse_smiles("C[CH3").unwrap_err(), SmilesError::UnterminatedBracket(_)));
        assert!(matches!(parse_smiles("CQ").unwrap_err(), SmilesError::UnexpectedChar { ch: 'Q', .. }));
        assert!(matches!(parse_smiles("C11").unwrap_err(), SmilesError::InvalidRingClosure(1)));
    }

    #[test]
    fn test_rejects_excess_valence() {
        assert!(matches!(
            parse_smiles("CC(C)(C)(C)C").unwrap_err(),
            SmilesError::Valence { atom: 1, symbol: "C", valence: 5 }
        ));
        assert!(matches!(parse_smiles("[CH5]").unwrap_err(), SmilesError::Valence { .. }));
        assert!(matches!(parse_smiles("FC(F)(F)(F)F").unwrap_err(), SmilesError::Valence { .. }));
        assert!(matches!(parse_smiles("CO(C)C").unwrap_err(), SmilesError::Valence { .. }));

        // charged and hypervalent forms within their allowed valences
        assert!(parse_smiles("CC(C)(C)C").is_ok());
        assert!(parse_smiles("C[N+](C)(C)C").is_ok());
        assert!(parse_smiles("CS(=O)(=O)C").is_ok());
        assert!(parse_smiles("c1ccccc1[N+](=O)[O-]").is_ok());
    }

    #[test]
    fn test_rejects_aromatic_atoms_outside_rings() {
        assert_eq!(parse_smiles("cc").unwrap_err(), SmilesError::AromaticOutsideRing(0));
        assert!(matches!(
            parse_smiles("c1ccccc1c").unwrap_err(),
            SmilesError::AromaticOutsideRing(6)
        ));
    }

    #[test]
    fn test_rejects_non_kekulizable_rings() {
        assert!(matches!(parse_smiles("c1cccc1").unwrap_err(), SmilesError::Kekulize(_)));
        // pyrrole nitrogen needs its hydrogen written
        assert!(matches!(parse_smiles("c1ccnc1").unwrap_err(), SmilesError::Kekulize(_)));
    }

    #[test]
    fn test_kekulizes_heteroaromatics() {
        for smiles in [
            "c1ccc2ccccc2c1",
            "c1ccc2[nH]ccc2c1",
            "O=c1cccc[nH]1",
            "Cn1cccc1",
            "c1cc[n+](C)cc1",
            "c1cnc[nH]1",
            "c1ccoc1",
            "Cc1ccc(NC(=O)c2ccc(CN3CCN(C)CC3)cc2)cc1Nc1nccc(-c2cccnc2)n1",
        ] {
            assert!(parse_smiles(smiles).is_ok(), "{smiles}");
        }

        // substituted pyrrole nitrogen takes no hydrogen
        let mol = parse_smiles("Cn1cccc1").unwrap();
        assert_eq!(hydrogens(&mol), vec![3, 0, 1, 1, 1, 1]);
    }
}
