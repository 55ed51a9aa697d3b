//! The quotient of a graph by its signature orbits.
//!
//! Each orbit becomes one vertex. Two orbits are joined when some bond runs
//! between their members, and an orbit gets a loop when two of its own
//! members are bonded.

use petgraph::{
    graph::{Graph, NodeIndex},
    visit::EdgeRef,
    Undirected,
};

use crate::{
    error::SignatureError,
    molecule::Index,
    object::SignatureGraph,
    orbit::Orbit,
    signature::{MoleculeSignature, ParallelMode},
    vertex::{Height, LabelMode},
};

/// Orbits of a graph and the bonds between them.
#[derive(Debug, Clone)]
pub struct QuotientGraph {
    graph: Graph<Orbit, (), Undirected, Index>,
    orbit_of: Vec<usize>,
}

impl QuotientGraph {
    /// Compute the orbits of `graph` at `height` and connect them.
    pub fn new<G: SignatureGraph + ?Sized>(
        graph: &G,
        height: Height,
        label_mode: LabelMode,
    ) -> Self {
        let sig = MoleculeSignature::new(graph, height, label_mode, ParallelMode::default());
        Self::from_molecule_signature(&sig)
    }

    /// Build from precomputed full-height signature strings, one per vertex.
    pub fn from_signatures<G: SignatureGraph + ?Sized>(
        graph: &G,
        signatures: Vec<String>,
    ) -> Result<Self, SignatureError> {
        let sig = MoleculeSignature::with_signatures(graph, signatures, Height::Unbounded)?;
        Ok(Self::from_molecule_signature(&sig))
    }

    pub fn from_molecule_signature<G: SignatureGraph + ?Sized>(
        sig: &MoleculeSignature<'_, G>,
    ) -> Self {
        let orbits = sig.calculate_orbits();
        let mut orbit_of = vec![0; sig.vertex_count()];
        for (i, orbit) in orbits.iter().enumerate() {
            for v in orbit {
                orbit_of[v] = i;
            }
        }

        let mut graph = Graph::default();
        for orbit in orbits {
            graph.add_node(orbit);
        }
        for (a, b, _) in sig.graph().edge_list() {
            let (qa, qb) = (NodeIndex::new(orbit_of[a]), NodeIndex::new(orbit_of[b]));
            graph.update_edge(qa, qb, ());
        }

        Self { graph, orbit_of }
    }

    /// Number of orbits.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct bonded orbit pairs, loops included.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of orbits with a bond between two of their members.
    pub fn number_of_loop_edges(&self) -> usize {
        self.graph
            .edge_references()
            .filter(|e| e.source() == e.target())
            .count()
    }

    /// Whether orbits `a` and `b` are joined (`a == b` asks for a loop).
    pub fn is_connected(&self, a: usize, b: usize) -> bool {
        if a.max(b) >= self.vertex_count() {
            return false;
        }
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    /// The signature labelling each orbit, in orbit order.
    pub fn vertex_signature_strings(&self) -> Vec<&str> {
        self.graph.node_weights().map(|orbit| orbit.label()).collect()
    }

    pub fn orbits(&self) -> impl Iterator<Item = &Orbit> {
        self.graph.node_weights()
    }

    pub fn orbit(&self, i: usize) -> Option<&Orbit> {
        self.graph.node_weight(NodeIndex::new(i))
    }

    /// Index of the orbit holding graph vertex `vertex`.
    pub fn orbit_of(&self, vertex: usize) -> Option<usize> {
        self.orbit_of.get(vertex).copied()
    }
}
