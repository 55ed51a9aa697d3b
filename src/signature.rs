//! Signatures of whole molecules.
//!
//! A [`MoleculeSignature`] holds the signature string of every vertex. From
//! those it derives the symmetry [`Orbit`]s, the canonical signature of the
//! graph, the multiplicity summary, and a canonical vertex order. Signature
//! text can be turned back into a [`Molecule`] with [`from_signature_string`].

use std::collections::HashMap;

use bit_set::BitSet;
use clap::ValueEnum;
use itertools::Itertools;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use crate::{
    builder::VirtualGraph,
    error::SignatureError,
    molecule::Molecule,
    object::SignatureGraph,
    orbit::Orbit,
    tree::ColoredTree,
    utils::connected_components,
    vertex::{vertex_symbol, Height, LabelMode, VertexSignature},
};

/// Parallelization strategy for computing per-vertex signatures.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum ParallelMode {
    /// No parallelism.
    None,
    /// Compute every vertex's signature on the rayon thread pool.
    #[default]
    Always,
}

/// The signatures of all vertices of a graph at one height.
#[derive(Debug, Clone)]
pub struct MoleculeSignature<'a, G: SignatureGraph + ?Sized> {
    graph: &'a G,
    height: Height,
    label_mode: LabelMode,
    parallel_mode: ParallelMode,
    signatures: Vec<String>,
}

impl<'a, G: SignatureGraph + ?Sized> MoleculeSignature<'a, G> {
    /// Compute the signature of every vertex of `graph`.
    pub fn new(
        graph: &'a G,
        height: Height,
        label_mode: LabelMode,
        parallel_mode: ParallelMode,
    ) -> Self {
        let n = graph.vertex_count();
        let sign = |v: usize| {
            VertexSignature::build(graph, v, height, label_mode).to_canonical_string()
        };
        let signatures: Vec<String> = match parallel_mode {
            ParallelMode::None => (0..n).map(sign).collect(),
            ParallelMode::Always => (0..n).into_par_iter().map(sign).collect(),
        };
        debug!(vertices = n, %height, ?label_mode, ?parallel_mode, "computed molecule signature");

        Self {
            graph,
            height,
            label_mode,
            parallel_mode,
            signatures,
        }
    }

    /// Full-height, element-labelled signatures.
    pub fn from_graph(graph: &'a G) -> Self {
        Self::new(graph, Height::Unbounded, LabelMode::Element, ParallelMode::default())
    }

    /// Wrap signature strings computed elsewhere, one per vertex in index
    /// order.
    pub fn with_signatures(
        graph: &'a G,
        signatures: Vec<String>,
        height: Height,
    ) -> Result<Self, SignatureError> {
        let expected = graph.vertex_count();
        if signatures.len() != expected {
            return Err(SignatureError::SignatureCountMismatch {
                expected,
                found: signatures.len(),
            });
        }
        Ok(Self {
            graph,
            height,
            label_mode: LabelMode::Element,
            parallel_mode: ParallelMode::default(),
            signatures,
        })
    }

    pub fn graph(&self) -> &'a G {
        self.graph
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn label_mode(&self) -> LabelMode {
        self.label_mode
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Signature of `vertex` at an arbitrary `height`, computed afresh.
    pub fn signature_string_for_vertex(
        &self,
        vertex: usize,
        height: Height,
    ) -> Result<String, SignatureError> {
        VertexSignature::new(self.graph, vertex, height, self.label_mode)
            .map(|sig| sig.to_canonical_string())
    }

    /// One signature builder per vertex, in index order.
    pub fn vertex_signatures(&self) -> Vec<VertexSignature<'a, G>> {
        let (graph, height, mode) = (self.graph, self.height, self.label_mode);
        let build = |v: usize| VertexSignature::build(graph, v, height, mode);
        match self.parallel_mode {
            ParallelMode::None => (0..self.vertex_count()).map(build).collect(),
            ParallelMode::Always => (0..self.vertex_count()).into_par_iter().map(build).collect(),
        }
    }

    /// Signature strings in vertex order.
    pub fn signature_strings(&self) -> &[String] {
        &self.signatures
    }

    /// Group vertices with identical signatures. Orbits are ordered by their
    /// smallest member and list members in ascending order.
    pub fn calculate_orbits(&self) -> Vec<Orbit> {
        let mut orbits: Vec<Orbit> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (v, signature) in self.signatures.iter().enumerate() {
            let i = *index.entry(signature.as_str()).or_insert_with(|| {
                orbits.push(Orbit::new(signature.as_str(), self.height));
                orbits.len() - 1
            });
            orbits[i].add(v);
        }
        orbits
    }

    /// The vertex whose signature is the graph signature: the smallest
    /// signature, ties going to the lowest index. `None` for an empty graph.
    pub fn canonical_root(&self) -> Option<usize> {
        (0..self.signatures.len()).min_by_key(|&v| (&self.signatures[v], v))
    }

    /// The lexicographically smallest vertex signature.
    pub fn graph_signature(&self) -> String {
        self.canonical_root()
            .map(|v| self.signatures[v].clone())
            .unwrap_or_default()
    }

    /// Canonical root of every connected component, ordered by signature.
    fn component_roots(&self) -> Vec<usize> {
        let components = connected_components(self.vertex_count(), |v| self.graph.connected(v));
        components
            .iter()
            .filter_map(|component| {
                component
                    .iter()
                    .copied()
                    .min_by_key(|&v| (&self.signatures[v], v))
            })
            .sorted_by_key(|&v| (&self.signatures[v], v))
            .collect()
    }

    /// The graph signature for connected graphs; otherwise the signature of
    /// each component, sorted and joined by `.`.
    pub fn to_canonical_string(&self) -> String {
        self.component_roots()
            .into_iter()
            .map(|v| self.signatures[v].as_str())
            .join(".")
    }

    /// Every distinct signature prefixed by its multiplicity, in signature
    /// order: `2[C](...) + 4[H](...)`.
    pub fn to_full_string(&self) -> String {
        self.signatures
            .iter()
            .sorted()
            .dedup_with_count()
            .map(|(count, signature)| format!("{count}{signature}"))
            .join(" + ")
    }

    fn canonical_graph(&self) -> Result<VirtualGraph, SignatureError> {
        let trees = self
            .component_roots()
            .into_iter()
            .map(|v| ColoredTree::parse(&self.signatures[v]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VirtualGraph::from_trees(&trees)?)
    }

    /// Edges implied by the canonical string, with vertices numbered by first
    /// appearance, e.g. `0-1,0-3,1-2,2-3`.
    pub fn reconstruct_canonical_edge_string(&self) -> Result<String, SignatureError> {
        self.canonical_graph().map(|graph| graph.to_edge_string())
    }

    /// Whether vertex `i` of the graph is the `i`-th vertex to appear in the
    /// canonical string, with the same symbol and the same bonds.
    pub fn is_canonically_labelled(&self) -> bool {
        let Ok(canonical) = self.canonical_graph() else {
            return false;
        };
        let n = self.vertex_count();
        canonical.vertex_count() == n
            && (0..n).all(|v| {
                canonical.symbols()[v] == vertex_symbol(self.graph, v, self.label_mode)
            })
            && canonical.edges() == self.graph.edge_list()
    }

    /// Permutation taking each vertex index to its canonical index, in the
    /// form accepted by [`Molecule::relabel`]. Vertices outside the canonical
    /// trees (possible with a bounded height) follow in index order.
    pub fn canonical_labels(&self) -> Vec<usize> {
        let n = self.vertex_count();
        let mut order = Vec::with_capacity(n);
        let mut placed = BitSet::with_capacity(n);
        for root in self.component_roots() {
            let sig = VertexSignature::build(self.graph, root, self.height, self.label_mode);
            for &v in sig.canonical_labelling() {
                if placed.insert(v) {
                    order.push(v);
                }
            }
        }
        order.extend((0..n).filter(|&v| placed.insert(v)));

        let mut labels = vec![0; n];
        for (new, &old) in order.iter().enumerate() {
            labels[old] = new;
        }
        labels
    }
}

/// Rebuild a [`Molecule`] from a vertex, graph or `.`-joined canonical
/// signature. Atoms are numbered in order of first appearance.
pub fn from_signature_string(signature: &str) -> Result<Molecule, SignatureError> {
    let trees = signature
        .split('.')
        .map(ColoredTree::parse)
        .collect::<Result<Vec<_>, _>>()?;
    let graph = VirtualGraph::from_trees(&trees)?;
    Ok(graph.to_molecule()?)
}
