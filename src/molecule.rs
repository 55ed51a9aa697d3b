//! Graph-theoretic representation of a molecule.
//!
//! Atoms are vertices carrying an element and an optional isotope mass
//! number; bonds are edges carrying a bond class. Vertex ids are dense
//! `0..n` so that signature code can address atoms by plain `usize`.

use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use petgraph::{
    graph::{Graph, NodeIndex},
    visit::EdgeRef,
    Undirected,
};

use crate::{error::MoleculeError, object::SignatureGraph, utils::connected_components};

pub(crate) type Index = u32;
pub(crate) type MGraph = Graph<Atom, Bond, Undirected, Index>;

/// Thrown by [`Element::from_str`] if the string does not represent a valid
/// chemical element.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseElementError;

macro_rules! periodic_table {
    ( $(($element:ident, $name:literal),)* ) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        /// Represents a chemical element.
        pub enum Element {
            $( $element, )*
        }

        impl Display for Element {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match &self {
                    $( Element::$element => write!(f, "{}", $name), )*
                }
            }
        }

        impl FromStr for Element {
            type Err = ParseElementError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(Element::$element), )*
                    _ => Err(ParseElementError),
                }
            }
        }
    };
}

periodic_table!(
    (Hydrogen, "H"),
    (Helium, "He"),
    (Lithium, "Li"),
    (Beryllium, "Be"),
    (Boron, "B"),
    (Carbon, "C"),
    (Nitrogen, "N"),
    (Oxygen, "O"),
    (Fluorine, "F"),
    (Neon, "Ne"),
    (Sodium, "Na"),
    (Magnesium, "Mg"),
    (Aluminum, "Al"),
    (Silicon, "Si"),
    (Phosphorus, "P"),
    (Sulfur, "S"),
    (Chlorine, "Cl"),
    (Argon, "Ar"),
    (Potassium, "K"),
    (Calcium, "Ca"),
    (Scandium, "Sc"),
    (Titanium, "Ti"),
    (Vanadium, "V"),
    (Chromium, "Cr"),
    (Manganese, "Mn"),
    (Iron, "Fe"),
    (Cobalt, "Co"),
    (Nickel, "Ni"),
    (Copper, "Cu"),
    (Zinc, "Zn"),
    (Gallium, "Ga"),
    (Germanium, "Ge"),
    (Arsenic, "As"),
    (Selenium, "Se"),
    (Bromine, "Br"),
    (Krypton, "Kr"),
    (Rubidium, "Rb"),
    (Strontium, "Sr"),
    (Yttrium, "Y"),
    (Zirconium, "Zr"),
    (Niobium, "Nb"),
    (Molybdenum, "Mo"),
    (Technetium, "Tc"),
    (Ruthenium, "Ru"),
    (Rhodium, "Rh"),
    (Palladium, "Pd"),
    (Silver, "Ag"),
    (Cadmium, "Cd"),
    (Indium, "In"),
    (Tin, "Sn"),
    (Antimony, "Sb"),
    (Tellurium, "Te"),
    (Iodine, "I"),
    (Xenon, "Xe"),
    (Cesium, "Cs"),
    (Barium, "Ba"),
    (Lanthanum, "La"),
    (Cerium, "Ce"),
    (Praseodymium, "Pr"),
    (Neodymium, "Nd"),
    (Promethium, "Pm"),
    (Samarium, "Sm"),
    (Europium, "Eu"),
    (Gadolinium, "Gd"),
    (Terbium, "Tb"),
    (Dysprosium, "Dy"),
    (Holmium, "Ho"),
    (Erbium, "Er"),
    (Thulium, "Tm"),
    (Ytterbium, "Yb"),
    (Lutetium, "Lu"),
    (Hafnium, "Hf"),
    (Tantalum, "Ta"),
    (Wolfram, "W"),
    (Rhenium, "Re"),
    (Osmium, "Os"),
    (Iridium, "Ir"),
    (Platinum, "Pt"),
    (Gold, "Au"),
    (Mercury, "Hg"),
    (Thallium, "Tl"),
    (Lead, "Pb"),
    (Bismuth, "Bi"),
    (Polonium, "Po"),
    (Astatine, "At"),
    (Radon, "Rn"),
    (Francium, "Fr"),
    (Radium, "Ra"),
    (Actinium, "Ac"),
    (Thorium, "Th"),
    (Protactinium, "Pa"),
    (Uranium, "U"),
    (Neptunium, "Np"),
    (Plutonium, "Pu"),
    (Americium, "Am"),
    (Curium, "Cm"),
    (Berkelium, "Bk"),
    (Californium, "Cf"),
    (Einsteinium, "Es"),
    (Fermium, "Fm"),
    (Mendelevium, "Md"),
    (Nobelium, "No"),
    (Lawrencium, "Lr"),
    (Rutherfordium, "Rf"),
    (Dubnium, "Db"),
    (Seaborgium, "Sg"),
    (Bohrium, "Bh"),
    (Hassium, "Hs"),
    (Meitnerium, "Mt"),
    (Darmstadtium, "Ds"),
    (Roentgenium, "Rg"),
    (Copernicium, "Cn"),
    (Nihonium, "Nh"),
    (Flerovium, "Fl"),
    (Moscovium, "Mc"),
    (Livermorium, "Lv"),
    (Tennessine, "Ts"),
    (Oganesson, "Og"),
);

/// Thrown by [`Atom::from_str`] when the text is not an optional mass number
/// followed by an element symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAtomError(pub String);

/// The nodes of a [`Molecule`] graph.
///
/// The isotope is the integer invariant used by
/// [`LabelMode::Integer`](crate::vertex::LabelMode) signatures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom {
    element: Element,
    isotope: Option<u32>,
}

impl Atom {
    /// Construct an [`Atom`] of type `element` without an isotope label.
    pub fn new(element: Element) -> Self {
        Self {
            element,
            isotope: None,
        }
    }

    /// Construct an [`Atom`] of type `element` with mass number `isotope`.
    pub fn with_isotope(element: Element, isotope: u32) -> Self {
        Self {
            element,
            isotope: Some(isotope),
        }
    }

    /// Return this [`Atom`]'s element.
    pub fn element(&self) -> Element {
        self.element
    }

    /// Return this [`Atom`]'s mass number, if one was given.
    pub fn isotope(&self) -> Option<u32> {
        self.isotope
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.isotope {
            Some(mass) => write!(f, "{mass}{}", self.element),
            None => write!(f, "{}", self.element),
        }
    }
}

impl FromStr for Atom {
    type Err = ParseAtomError;

    /// Parse `C`, `13C`, `Cl`, ... (the symbol form used in signatures).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (mass, symbol) = s.split_at(split);
        let element = symbol
            .parse::<Element>()
            .map_err(|_| ParseAtomError(s.to_string()))?;
        if mass.is_empty() {
            Ok(Atom::new(element))
        } else {
            let mass = mass.parse().map_err(|_| ParseAtomError(s.to_string()))?;
            Ok(Atom::with_isotope(element, mass))
        }
    }
}

/// The edges of a [`Molecule`] graph.
///
/// Unlike the `.mol` file, which describes seven bond types, signatures only
/// distinguish single, aromatic, double, and triple bonds. A bond flagged as
/// aromatic is always [`Bond::Aromatic`], whatever its Kekulé order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bond {
    Single,
    Aromatic,
    Double,
    Triple,
}

/// Thrown by [`Bond::try_from`] when given anything other than a 1, 2, 3 or 4,
/// and by [`Bond::from_token`] for an unknown edge token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseBondError;

impl TryFrom<usize> for Bond {
    type Error = ParseBondError;
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Bond::Single),
            2 => Ok(Bond::Double),
            3 => Ok(Bond::Triple),
            4 => Ok(Bond::Aromatic),
            _ => Err(ParseBondError),
        }
    }
}

impl Bond {
    /// The edge label written in front of a signature node.
    pub fn token(&self) -> &'static str {
        match self {
            Bond::Single => "",
            Bond::Aromatic => "p",
            Bond::Double => "=",
            Bond::Triple => "#",
        }
    }

    /// Inverse of [`Bond::token`] for the non-empty tokens.
    pub fn from_token(token: char) -> Result<Self, ParseBondError> {
        match token {
            'p' => Ok(Bond::Aromatic),
            '=' => Ok(Bond::Double),
            '#' => Ok(Bond::Triple),
            _ => Err(ParseBondError),
        }
    }

    /// The separator used between the two endpoints in edge strings.
    pub fn edge_symbol(&self) -> char {
        match self {
            Bond::Single => '-',
            Bond::Aromatic => 'p',
            Bond::Double => '=',
            Bond::Triple => '#',
        }
    }
}

/// A simple, loopless graph with [`Atom`]s as nodes and [`Bond`]s as edges.
///
/// Hydrogens are ordinary atoms: they take part in the symmetry classes like
/// any other vertex.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    graph: MGraph,
}

impl Molecule {
    /// Construct an empty [`Molecule`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an atom and return its vertex id.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.graph.add_node(atom).index()
    }

    /// Bond atoms `a` and `b`.
    pub fn add_bond(&mut self, a: usize, b: usize, bond: Bond) -> Result<(), MoleculeError> {
        let count = self.atom_count();
        if let Some(&missing) = [a, b].iter().find(|&&v| v >= count) {
            return Err(MoleculeError::UnknownAtom(missing));
        }
        if a == b {
            return Err(MoleculeError::SelfLoop(a));
        }
        let (na, nb) = (NodeIndex::new(a), NodeIndex::new(b));
        if self.graph.find_edge(na, nb).is_some() {
            return Err(MoleculeError::DuplicateBond(a.min(b), a.max(b)));
        }
        self.graph.add_edge(na, nb, bond);
        Ok(())
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn atom(&self, v: usize) -> Option<&Atom> {
        self.graph.node_weight(NodeIndex::new(v))
    }

    /// Return the bond between `a` and `b`, if any.
    pub fn bond(&self, a: usize, b: usize) -> Option<Bond> {
        if a.max(b) >= self.atom_count() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .and_then(|e| self.graph.edge_weight(e).copied())
    }

    /// Neighbours of `v` in ascending id order.
    pub fn neighbors(&self, v: usize) -> Vec<usize> {
        if v >= self.atom_count() {
            return Vec::new();
        }
        let mut out: Vec<usize> = self
            .graph
            .neighbors(NodeIndex::new(v))
            .map(|n| n.index())
            .collect();
        out.sort_unstable();
        out
    }

    /// All bonds as `(a, b, bond)` with `a < b`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize, Bond)> {
        let mut out: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                (a.min(b), a.max(b), *e.weight())
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Return `true` iff this molecule contains self-loops or multiple edges
    /// between any pair of nodes.
    pub fn is_malformed(&self) -> bool {
        let mut uniq = BTreeSet::new();
        !self.graph.edge_references().all(|e| {
            let (src, dst) = (e.source().index(), e.target().index());
            src != dst && uniq.insert((src.min(dst), src.max(dst)))
        })
    }

    /// Vertex sets of the connected components, each sorted, ordered by their
    /// smallest vertex.
    pub fn components(&self) -> Vec<Vec<usize>> {
        connected_components(self.atom_count(), |v| self.neighbors(v))
    }

    /// Return `true` iff the molecule has at most one connected component.
    pub fn is_connected(&self) -> bool {
        self.components().len() <= 1
    }

    /// Return a copy in which atom `v` becomes atom `permutation[v]`.
    ///
    /// Returns `None` unless `permutation` is a permutation of `0..n`.
    pub fn relabel(&self, permutation: &[usize]) -> Option<Molecule> {
        let n = self.atom_count();
        if permutation.len() != n {
            return None;
        }
        let mut inverse = vec![usize::MAX; n];
        for (old, &new) in permutation.iter().enumerate() {
            if new >= n || inverse[new] != usize::MAX {
                return None;
            }
            inverse[new] = old;
        }

        let mut out = Molecule::new();
        for &old in &inverse {
            out.add_atom(*self.atom(old)?);
        }
        for (a, b, bond) in self.edges() {
            out.add_bond(permutation[a], permutation[b], bond).ok()?;
        }
        Some(out)
    }
}

impl SignatureGraph for Molecule {
    fn vertex_count(&self) -> usize {
        self.atom_count()
    }

    fn connected(&self, vertex: usize) -> Vec<usize> {
        self.neighbors(vertex)
    }

    fn edge_label(&self, a: usize, b: usize) -> Option<Bond> {
        self.bond(a, b)
    }

    fn element_symbol(&self, vertex: usize) -> String {
        self.atom(vertex)
            .map(|atom| atom.element().to_string())
            .unwrap_or_default()
    }

    fn vertex_invariant(&self, vertex: usize) -> Option<u32> {
        self.atom(vertex).and_then(Atom::isotope)
    }
}
