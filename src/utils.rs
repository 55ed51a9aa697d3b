use std::collections::VecDeque;

use bit_set::BitSet;

/// Breadth-first distances from `root` over `0..n`, `None` when unreachable
/// or farther than `limit`.
pub fn bfs_layers<F>(
    n: usize,
    root: usize,
    limit: Option<usize>,
    neighbors: F,
) -> Vec<Option<usize>>
where
    F: Fn(usize) -> Vec<usize>,
{
    let mut dist = vec![None; n];
    if root >= n {
        return dist;
    }
    dist[root] = Some(0);
    let mut queue = VecDeque::from([root]);
    while let Some(v) = queue.pop_front() {
        let d = dist[v].unwrap_or(0);
        if limit.is_some_and(|h| d >= h) {
            continue;
        }
        for w in neighbors(v) {
            if w < n && dist[w].is_none() {
                dist[w] = Some(d + 1);
                queue.push_back(w);
            }
        }
    }
    dist
}

/// Vertex sets of the connected components over `0..n`, each sorted and
/// ordered by smallest vertex.
pub fn connected_components<F>(n: usize, neighbors: F) -> Vec<Vec<usize>>
where
    F: Fn(usize) -> Vec<usize>,
{
    let mut seen = BitSet::with_capacity(n);
    let mut components = Vec::new();
    for start in 0..n {
        if !seen.insert(start) {
            continue;
        }
        let mut component = vec![start];
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            for w in neighbors(v) {
                if w < n && seen.insert(w) {
                    component.push(w);
                    stack.push(w);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }
    components
}
