//! Rebuild the graph a colored tree describes.
//!
//! Tree nodes become graph vertices in pre-order, except that all nodes of one
//! color collapse onto the vertex created for the first of them. A closure
//! inside a layer is listed from both of its ends, so edges are deduplicated.

use std::collections::{BTreeMap, HashMap};

use crate::{
    error::StructureError,
    molecule::{Atom, Bond, Molecule},
    tree::ColoredTree,
};

/// The vertices and edges implied by one or more colored trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualGraph {
    symbols: Vec<String>,
    edges: BTreeMap<(usize, usize), Bond>,
}

impl VirtualGraph {
    /// Rebuild the graph of a single tree.
    pub fn from_tree(tree: &ColoredTree) -> Result<Self, StructureError> {
        Self::from_trees([tree])
    }

    /// Rebuild the disjoint union of several trees, numbering vertices across
    /// them in order.
    pub fn from_trees<'t, I>(trees: I) -> Result<Self, StructureError>
    where
        I: IntoIterator<Item = &'t ColoredTree>,
    {
        let mut graph = Self::default();
        for tree in trees {
            graph.append(tree)?;
        }
        Ok(graph)
    }

    fn append(&mut self, tree: &ColoredTree) -> Result<(), StructureError> {
        if let Some((&color, _)) = tree.color_counts().iter().find(|(_, &count)| count < 2) {
            return Err(StructureError::UnresolvedColor { color });
        }

        // Colors are local to one tree.
        let mut by_color: HashMap<usize, usize> = HashMap::new();
        let mut vertex_of = vec![0; tree.len()];
        for id in tree.preorder() {
            let Some(node) = tree.node(id) else { continue };
            let vertex = match node.color() {
                Some(color) => match by_color.get(&color) {
                    Some(&v) => {
                        if self.symbols[v] != node.symbol() {
                            return Err(StructureError::SymbolMismatch {
                                color,
                                expected: self.symbols[v].clone(),
                                found: node.symbol().to_string(),
                            });
                        }
                        v
                    }
                    None => {
                        let v = self.push_vertex(node.symbol());
                        by_color.insert(color, v);
                        v
                    }
                },
                None => self.push_vertex(node.symbol()),
            };
            vertex_of[id] = vertex;

            if let (Some(parent), Some(bond)) = (node.parent(), node.edge()) {
                let a = vertex_of[parent];
                if a == vertex {
                    return Err(StructureError::SelfLoop {
                        color: node.color().unwrap_or_default(),
                    });
                }
                let key = (a.min(vertex), a.max(vertex));
                match self.edges.get(&key) {
                    Some(&existing) if existing != bond => {
                        return Err(StructureError::ConflictingBond { a: key.0, b: key.1 });
                    }
                    Some(_) => {}
                    None => {
                        self.edges.insert(key, bond);
                    }
                }
            }
        }
        Ok(())
    }

    fn push_vertex(&mut self, symbol: &str) -> usize {
        self.symbols.push(symbol.to_string());
        self.symbols.len() - 1
    }

    pub fn vertex_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertex symbols in vertex order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Edges as `(a, b, bond)` with `a < b`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize, Bond)> {
        self.edges.iter().map(|(&(a, b), &bond)| (a, b, bond)).collect()
    }

    /// Edges written as `a<op>b`, comma separated, e.g. `0-1,0=2,1p3`.
    pub fn to_edge_string(&self) -> String {
        self.edges
            .iter()
            .map(|(&(a, b), bond)| format!("{a}{}{b}", bond.edge_symbol()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Materialize the graph as a [`Molecule`], reading each symbol as an
    /// atom (`C`, `13C`, ...).
    pub fn to_molecule(&self) -> Result<Molecule, StructureError> {
        let mut mol = Molecule::new();
        for symbol in &self.symbols {
            let atom: Atom = symbol
                .parse()
                .map_err(|_| StructureError::UnknownSymbol(symbol.clone()))?;
            mol.add_atom(atom);
        }
        for (&(a, b), &bond) in &self.edges {
            mol.add_bond(a, b, bond)
                .map_err(|_| StructureError::ConflictingBond { a, b })?;
        }
        Ok(mol)
    }
}
