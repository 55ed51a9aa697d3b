//! Equivalence classes of vertices that share a signature.

use std::fmt::Display;

use crate::vertex::Height;

/// A set of graph vertices indistinguishable by their signature at a given
/// height. The label is the shared signature string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Orbit {
    label: String,
    height: Height,
    members: Vec<usize>,
}

impl Orbit {
    /// Construct an empty [`Orbit`].
    pub fn new(label: impl Into<String>, height: Height) -> Self {
        Self {
            label: label.into(),
            height,
            members: Vec::new(),
        }
    }

    /// Add `vertex`; adding a member twice has no effect.
    pub fn add(&mut self, vertex: usize) {
        if !self.contains(vertex) {
            self.members.push(vertex);
        }
    }

    /// Remove `vertex`, returning whether it was a member.
    pub fn remove(&mut self, vertex: usize) -> bool {
        match self.members.iter().position(|&v| v == vertex) {
            Some(i) => {
                self.members.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.members.contains(&vertex)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// The first member in insertion (or, after [`Orbit::sort`], ascending)
    /// order.
    pub fn first(&self) -> Option<usize> {
        self.members.first().copied()
    }

    pub fn sort(&mut self) {
        self.members.sort_unstable();
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, usize>> {
        self.members.iter().copied()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label == label
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

impl<'a> IntoIterator for &'a Orbit {
    type Item = usize;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Orbit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members: Vec<String> = self.members.iter().map(|v| v.to_string()).collect();
        write!(f, "{} {{{}}}", self.label, members.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let mut orbit = Orbit::new("[H]([C])", Height::Unbounded);
        assert!(orbit.is_empty());
        assert_eq!(orbit.first(), None);

        for v in [4, 2, 3, 2] {
            orbit.add(v);
        }
        assert_eq!(orbit.len(), 3);
        assert_eq!(orbit.first(), Some(4));
        orbit.sort();
        assert_eq!(orbit.members(), [2, 3, 4]);
        assert!(orbit.contains(3));

        assert!(orbit.remove(3));
        assert!(!orbit.remove(3));
        assert_eq!(orbit.iter().collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!((&orbit).into_iter().sum::<usize>(), 6);
    }

    #[test]
    fn labels_and_display() {
        let mut orbit = Orbit::new("[C]([H][H][H][H])", Height::Bounded(1));
        orbit.add(0);
        assert!(orbit.has_label("[C]([H][H][H][H])"));
        assert!(!orbit.has_label("[C]"));
        assert_eq!(orbit.height(), Height::Bounded(1));
        assert_eq!(orbit.to_string(), "[C]([H][H][H][H]) {0}");

        let copy = orbit.clone();
        orbit.add(5);
        assert_eq!(copy.len(), 1);
        assert_eq!(orbit.to_string(), "[C]([H][H][H][H]) {0, 5}");
        assert_eq!(orbit.label(), copy.label());
    }
}
