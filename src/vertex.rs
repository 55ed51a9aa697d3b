//! Build and canonicalize the colored tree rooted at one vertex.
//!
//! The tree follows the breadth-first layers around the root. A bond that
//! goes one layer outward is a *down* arc; a bond inside one layer closes a
//! cycle and is listed from both of its ends. A vertex reached along two or
//! more arcs is *colored*: it is expanded under one of its down parents, and
//! every other occurrence is a leaf carrying its color.
//!
//! Which parent expands a colored vertex, and which provisional color it
//! gets, are fixed by an ordering of the vertices found by
//! individualization-refinement: the partition of the rooted ball is refined
//! to an equitable one, then each vertex of the first tied cell is
//! individualized in turn and the search recurses. Given such an ordering the
//! text is built bottom-up with siblings sorted by `(edge ordinal, child
//! text)`, and colors are renumbered left to right. The smallest text over all
//! leaves of the search is the signature.

use std::{cmp::Ordering, fmt::Display, str::FromStr};

use bit_set::BitSet;
use clap::ValueEnum;
use itertools::Itertools;
use tracing::trace;

use crate::{
    error::SignatureError,
    molecule::Bond,
    object::SignatureGraph,
    tree::ColoredTree,
    utils::bfs_layers,
};

/// How vertex symbols are rendered in signatures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, ValueEnum)]
pub enum LabelMode {
    /// Element symbol only, e.g. `C`.
    #[default]
    Element,
    /// Element symbol prefixed with the vertex's integer invariant (isotope),
    /// e.g. `13C`, when it has one.
    Integer,
}

/// Breadth-first depth bound of a signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Height {
    /// Expand until every reachable vertex is visited.
    #[default]
    Unbounded,
    /// Stop expanding at this depth.
    Bounded(usize),
}

impl Height {
    /// The depth limit, `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        match self {
            Height::Unbounded => None,
            Height::Bounded(h) => Some(*h),
        }
    }
}

impl From<usize> for Height {
    fn from(h: usize) -> Self {
        Height::Bounded(h)
    }
}

impl TryFrom<i64> for Height {
    type Error = SignatureError;
    fn try_from(h: i64) -> Result<Self, Self::Error> {
        usize::try_from(h)
            .map(Height::Bounded)
            .map_err(|_| SignatureError::NegativeHeight(h))
    }
}

impl FromStr for Height {
    type Err = SignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "full" | "unbounded" => Ok(Height::Unbounded),
            other => other
                .parse::<i64>()
                .map_err(|_| SignatureError::InvalidHeight(s.to_string()))
                .and_then(Height::try_from),
        }
    }
}

impl Display for Height {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Height::Unbounded => write!(f, "full"),
            Height::Bounded(h) => write!(f, "{h}"),
        }
    }
}

/// Ordinal of an edge label, the primary sort key among siblings.
pub fn convert_edge_label_to_color(label: Bond) -> u8 {
    match label {
        Bond::Single => 1,
        Bond::Aromatic => 2,
        Bond::Double => 3,
        Bond::Triple => 4,
    }
}

/// Symbol of `vertex` as written in a signature under `mode`.
pub fn vertex_symbol<G: SignatureGraph + ?Sized>(
    graph: &G,
    vertex: usize,
    mode: LabelMode,
) -> String {
    let element = graph.element_symbol(vertex);
    match (mode, graph.vertex_invariant(vertex)) {
        (LabelMode::Integer, Some(label)) => format!("{label}{element}"),
        _ => element,
    }
}

/// The canonical colored tree of a graph seen from one root vertex.
#[derive(Debug, Clone)]
pub struct VertexSignature<'a, G: SignatureGraph + ?Sized> {
    graph: &'a G,
    root: usize,
    height: Height,
    mode: LabelMode,
    tree: ColoredTree,
    text: String,
    labelling: Vec<usize>,
}

impl<'a, G: SignatureGraph + ?Sized> VertexSignature<'a, G> {
    /// Build the signature of `root` in `graph`.
    pub fn new(
        graph: &'a G,
        root: usize,
        height: Height,
        mode: LabelMode,
    ) -> Result<Self, SignatureError> {
        let count = graph.vertex_count();
        if root >= count {
            return Err(SignatureError::VertexOutOfRange {
                vertex: root,
                count,
            });
        }
        Ok(Self::build(graph, root, height, mode))
    }

    /// [`VertexSignature::new`] for a `root` known to be in range.
    pub(crate) fn build(graph: &'a G, root: usize, height: Height, mode: LabelMode) -> Self {
        let best = Layout::new(graph, root, height, mode).canonize();
        trace!(root, %height, nodes = best.tree.len(), "built vertex signature");

        Self {
            graph,
            root,
            height,
            mode,
            tree: best.tree,
            text: best.text,
            labelling: best.labelling,
        }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn mode(&self) -> LabelMode {
        self.mode
    }

    /// The canonical text of this signature.
    pub fn to_canonical_string(&self) -> String {
        self.text.clone()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The canonical tree, colors numbered from 0 left to right.
    pub fn to_colored_tree(&self) -> &ColoredTree {
        &self.tree
    }

    /// Graph vertices in order of first appearance in the canonical tree.
    pub fn canonical_labelling(&self) -> &[usize] {
        &self.labelling
    }

    /// Graph neighbours of `vertex` (not tree children).
    pub fn connected(&self, vertex: usize) -> Vec<usize> {
        self.graph.connected(vertex)
    }

    pub fn edge_label(&self, a: usize, b: usize) -> Option<Bond> {
        self.graph.edge_label(a, b)
    }

    pub fn vertex_symbol(&self, vertex: usize) -> String {
        vertex_symbol(self.graph, vertex, self.mode)
    }

    pub fn convert_edge_label_to_color(&self, label: Bond) -> u8 {
        convert_edge_label_to_color(label)
    }
}

impl<G: SignatureGraph + ?Sized> Display for VertexSignature<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// One child of an expanded vertex, in sorted order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Slot {
    vertex: usize,
    bond: Bond,
    expanded: bool,
}

/// Result of serializing the tree for one leaf of the search.
struct Emitted {
    text: String,
    tree: ColoredTree,
    labelling: Vec<usize>,
}

/// Best leaf so far, keyed by the cell sizes along its search path and then
/// by its text.
struct Best {
    path: Vec<Vec<usize>>,
    emitted: Emitted,
    leaves: usize,
}

struct EmitState {
    tree: ColoredTree,
    renumbered: Vec<Option<usize>>,
    next_color: usize,
    seen: BitSet,
    labelling: Vec<usize>,
}

/// The ball around one root: layers, arcs, colored and search-relevant
/// vertices. Vertices are addressed by local index, the root being 0.
struct Layout {
    vertices: Vec<usize>,
    layer: Vec<usize>,
    by_layer: Vec<Vec<usize>>,
    symbols: Vec<String>,
    neighbors: Vec<Vec<(usize, u8)>>,
    down: Vec<Vec<(usize, Bond)>>,
    side: Vec<Vec<(usize, Bond)>>,
    parents: Vec<Vec<usize>>,
    colored: BitSet,
    relevant: BitSet,
}

impl Layout {
    fn new<G: SignatureGraph + ?Sized>(
        graph: &G,
        root: usize,
        height: Height,
        mode: LabelMode,
    ) -> Self {
        let n = graph.vertex_count();
        let depth = bfs_layers(n, root, height.limit(), |v| graph.connected(v));

        let mut by_layer: Vec<Vec<usize>> = Vec::new();
        let mut local = vec![None; n];
        let mut vertices = Vec::new();
        let mut layer = Vec::new();
        for (v, d) in depth.iter().enumerate() {
            if let Some(d) = *d {
                if by_layer.len() <= d {
                    by_layer.resize(d + 1, Vec::new());
                }
                by_layer[d].push(v);
            }
        }
        for (d, members) in by_layer.iter_mut().enumerate() {
            for v in members.iter_mut() {
                local[*v] = Some(vertices.len());
                vertices.push(*v);
                layer.push(d);
                *v = vertices.len() - 1;
            }
        }

        let m = vertices.len();
        let symbols: Vec<String> = vertices
            .iter()
            .map(|&v| vertex_symbol(graph, v, mode))
            .collect();
        let mut neighbors = vec![Vec::new(); m];
        let mut down = vec![Vec::new(); m];
        let mut side = vec![Vec::new(); m];
        let mut parents = vec![Vec::new(); m];
        let mut in_degree = vec![0usize; m];
        for u in 0..m {
            for w in graph.connected(vertices[u]) {
                let Some(lw) = local.get(w).copied().flatten() else {
                    continue;
                };
                let Some(bond) = graph.edge_label(vertices[u], w) else {
                    continue;
                };
                neighbors[u].push((lw, convert_edge_label_to_color(bond)));
                if layer[lw] == layer[u] + 1 {
                    down[u].push((lw, bond));
                    parents[lw].push(u);
                    in_degree[lw] += 1;
                } else if layer[lw] == layer[u] && lw != u {
                    side[u].push((lw, bond));
                    in_degree[lw] += 1;
                }
            }
        }

        let colored: BitSet = (0..m).filter(|&v| in_degree[v] >= 2).collect();
        // The search only has to order colored vertices and the parents that
        // compete to expand one.
        let mut relevant = colored.clone();
        for w in colored.iter() {
            if parents[w].len() >= 2 {
                relevant.extend(parents[w].iter().copied());
            }
        }

        Self {
            vertices,
            layer,
            by_layer,
            symbols,
            neighbors,
            down,
            side,
            parents,
            colored,
            relevant,
        }
    }

    fn initial_colors(&self) -> Vec<usize> {
        let keys: Vec<_> = (0..self.vertices.len())
            .map(|v| {
                (
                    self.layer[v],
                    self.symbols[v].as_str(),
                    !self.relevant.contains(v),
                )
            })
            .collect();
        dense_ranks(&keys)
    }

    /// Refine `colors` until the partition is equitable: vertices of one cell
    /// see the same multiset of `(edge ordinal, cell)` among their neighbours.
    /// Cells keep their relative order, so the result refines the input.
    fn refine(&self, mut colors: Vec<usize>) -> Vec<usize> {
        let mut cells = cell_count(&colors);
        loop {
            let keys: Vec<(usize, Vec<(u8, usize)>)> = (0..colors.len())
                .map(|v| {
                    let around = self.neighbors[v]
                        .iter()
                        .map(|&(w, ordinal)| (ordinal, colors[w]))
                        .sorted()
                        .collect();
                    (colors[v], around)
                })
                .collect();
            let next = dense_ranks(&keys);
            let next_cells = cell_count(&next);
            if next_cells == cells {
                return next;
            }
            colors = next;
            cells = next_cells;
        }
    }

    /// The smallest tied cell of relevant vertices, first by color on equal
    /// size, or `None` once every relevant vertex is alone in its cell.
    fn target_cell(&self, colors: &[usize]) -> Option<Vec<usize>> {
        let mut cells = vec![Vec::new(); cell_count(colors)];
        for (v, &c) in colors.iter().enumerate() {
            cells[c].push(v);
        }
        cells
            .into_iter()
            .filter(|cell| cell.len() > 1 && self.relevant.contains(cell[0]))
            .min_by_key(|cell| cell.len())
    }

    fn canonize(&self) -> Emitted {
        let start = self.refine(self.initial_colors());
        let mut path = vec![cell_sizes(&start)];

        // Follow first choices down to a leaf for an initial bound.
        let mut colors = start.clone();
        while let Some(cell) = self.target_cell(&colors) {
            colors = self.refine(individualize(&colors, cell[0]));
            path.push(cell_sizes(&colors));
        }
        let mut best = Best {
            path,
            emitted: self.emit(&colors),
            leaves: 0,
        };

        let mut path = vec![cell_sizes(&start)];
        self.search(&start, &mut path, &mut best);
        trace!(leaves = best.leaves, "searched color assignments");
        best.emitted
    }

    fn search(&self, colors: &[usize], path: &mut Vec<Vec<usize>>, best: &mut Best) {
        let Some(cell) = self.target_cell(colors) else {
            best.leaves += 1;
            let emitted = self.emit(colors);
            let key = (path.as_slice(), emitted.text.as_str());
            if key < (best.path.as_slice(), best.emitted.text.as_str()) {
                best.path = path.clone();
                best.emitted = emitted;
            }
            return;
        };

        for v in cell {
            let next = self.refine(individualize(colors, v));
            path.push(cell_sizes(&next));
            // Skip the branch once every leaf below must lose to the best.
            if prefix_cmp(path, &best.path) != Ordering::Greater {
                self.search(&next, path, best);
            }
            path.pop();
        }
    }

    /// Serialize the tree for a partition in which every relevant vertex is
    /// alone in its cell.
    fn emit(&self, colors: &[usize]) -> Emitted {
        let m = self.vertices.len();

        let mut tags = vec![None; m];
        let ordered = self.colored.iter().sorted_by_key(|&v| colors[v]);
        for (tag, v) in ordered.enumerate() {
            tags[v] = Some(tag);
        }
        let host: Vec<Option<usize>> = (0..m)
            .map(|w| self.parents[w].iter().copied().min_by_key(|&p| colors[p]))
            .collect();
        let head = |v: usize| match tags[v] {
            Some(tag) => format!("[{},{tag}]", self.symbols[v]),
            None => format!("[{}]", self.symbols[v]),
        };

        // Deepest layer first, so every expanded child's text is known.
        let mut text = vec![String::new(); m];
        let mut slots: Vec<Vec<Slot>> = vec![Vec::new(); m];
        for members in self.by_layer.iter().rev() {
            for &u in members {
                let mut children: Vec<(Slot, String)> = self.down[u]
                    .iter()
                    .map(|&(w, bond)| (w, bond, host[w] == Some(u)))
                    .chain(self.side[u].iter().map(|&(w, bond)| (w, bond, false)))
                    .map(|(vertex, bond, expanded)| {
                        let body = if expanded {
                            text[vertex].clone()
                        } else {
                            head(vertex)
                        };
                        (
                            Slot {
                                vertex,
                                bond,
                                expanded,
                            },
                            body,
                        )
                    })
                    .collect();
                children.sort_by(|(a, a_text), (b, b_text)| {
                    convert_edge_label_to_color(a.bond)
                        .cmp(&convert_edge_label_to_color(b.bond))
                        .then_with(|| a_text.cmp(b_text))
                        .then_with(|| colors[a.vertex].cmp(&colors[b.vertex]))
                });

                let mut out = head(u);
                if !children.is_empty() {
                    out.push('(');
                    for (slot, body) in &children {
                        out.push_str(slot.bond.token());
                        out.push_str(body);
                    }
                    out.push(')');
                }
                text[u] = out;
                slots[u] = children.into_iter().map(|(slot, _)| slot).collect();
            }
        }

        let mut state = EmitState {
            tree: ColoredTree::with_root(self.symbols[0].clone(), None),
            renumbered: vec![None; m],
            next_color: 0,
            seen: BitSet::with_capacity(m),
            labelling: vec![self.vertices[0]],
        };
        state.seen.insert(0);
        self.grow(0, 0, &slots, &tags, &mut state);

        Emitted {
            text: state.tree.to_string(),
            tree: state.tree,
            labelling: state.labelling,
        }
    }

    /// Copy the sorted children of `u` under `node`, numbering colors in order
    /// of first appearance.
    fn grow(
        &self,
        u: usize,
        node: usize,
        slots: &[Vec<Slot>],
        tags: &[Option<usize>],
        state: &mut EmitState,
    ) {
        for slot in &slots[u] {
            let w = slot.vertex;
            let color = tags[w].map(|_| match state.renumbered[w] {
                Some(c) => c,
                None => {
                    let c = state.next_color;
                    state.next_color += 1;
                    state.renumbered[w] = Some(c);
                    c
                }
            });
            if state.seen.insert(w) {
                state.labelling.push(self.vertices[w]);
            }

            let child = state
                .tree
                .push_child(node, slot.bond, self.symbols[w].clone(), color);
            if slot.expanded {
                self.grow(w, child, slots, tags, state);
            }
        }
    }
}

/// Dense ranks of `keys` in sorted order.
fn dense_ranks<K: Ord>(keys: &[K]) -> Vec<usize> {
    let distinct: Vec<&K> = keys.iter().sorted().dedup().collect();
    keys.iter()
        .map(|k| distinct.binary_search(&k).unwrap_or(0))
        .collect()
}

fn cell_count(colors: &[usize]) -> usize {
    colors.iter().max().map_or(0, |&c| c + 1)
}

fn cell_sizes(colors: &[usize]) -> Vec<usize> {
    let mut sizes = vec![0; cell_count(colors)];
    for &c in colors {
        sizes[c] += 1;
    }
    sizes
}

/// Split `v` off the front of its cell.
fn individualize(colors: &[usize], v: usize) -> Vec<usize> {
    let keys: Vec<(usize, bool)> = colors
        .iter()
        .enumerate()
        .map(|(u, &c)| (c, u != v))
        .collect();
    dense_ranks(&keys)
}

/// Compare a partial search path against the first levels of `best`. A
/// shorter `best` that agrees on every level it has is smaller.
fn prefix_cmp(path: &[Vec<usize>], best: &[Vec<usize>]) -> Ordering {
    for (a, b) in path.iter().zip(best) {
        match a.cmp(b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    if best.len() < path.len() {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}
