//! Define the read-only graph surface that signatures are computed over.

use crate::molecule::Bond;

/// Read-only view of a labelled, undirected, simple graph with vertex ids
/// `0..vertex_count()`.
///
/// Signatures only ever read through this trait, so any molecule model can be
/// signed without copying it into a [`Molecule`](crate::molecule::Molecule).
pub trait SignatureGraph: Sync {
    fn vertex_count(&self) -> usize;

    /// Graph neighbours of `vertex`.
    fn connected(&self, vertex: usize) -> Vec<usize>;

    /// Label of the edge between `a` and `b`, `None` if they are not bonded.
    fn edge_label(&self, a: usize, b: usize) -> Option<Bond>;

    /// Element symbol of `vertex`, e.g. `"C"`.
    fn element_symbol(&self, vertex: usize) -> String;

    /// Optional integer invariant of `vertex` (an isotope mass number for
    /// molecules), used as an extra label in integer-label mode.
    fn vertex_invariant(&self, vertex: usize) -> Option<u32>;

    /// All edges as `(a, b, label)` with `a < b`.
    fn edge_list(&self) -> Vec<(usize, usize, Bond)> {
        let mut out = Vec::new();
        for a in 0..self.vertex_count() {
            for b in self.connected(a) {
                if a < b {
                    if let Some(label) = self.edge_label(a, b) {
                        out.push((a, b, label));
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }
}
