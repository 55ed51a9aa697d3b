//! Relabelling invariance, height monotonicity and closure structure of
//! signatures on small symmetric graphs.

use itertools::Itertools;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use molecular_signatures::{
    molecule::{Atom, Bond, Element, Molecule},
    quotient::QuotientGraph,
    signature::{MoleculeSignature, ParallelMode},
    tree::ColoredTree,
    vertex::{Height, LabelMode, VertexSignature},
};

fn build(elements: &[Element], bonds: &[(usize, usize, Bond)]) -> Molecule {
    let mut mol = Molecule::new();
    for &element in elements {
        mol.add_atom(Atom::new(element));
    }
    for &(a, b, bond) in bonds {
        mol.add_bond(a, b, bond).unwrap();
    }
    mol
}

fn carbons(n: usize, bonds: &[(usize, usize)]) -> Molecule {
    let bonds: Vec<_> = bonds.iter().map(|&(a, b)| (a, b, Bond::Single)).collect();
    build(&vec![Element::Carbon; n], &bonds)
}

fn ring(n: usize) -> Molecule {
    let bonds: Vec<_> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    carbons(n, &bonds)
}

fn star(leaves: usize) -> Molecule {
    let mut elements = vec![Element::Nitrogen];
    elements.extend(std::iter::repeat(Element::Carbon).take(leaves));
    let bonds: Vec<_> = (1..=leaves).map(|i| (0, i, Bond::Single)).collect();
    build(&elements, &bonds)
}

fn propellane() -> Molecule {
    carbons(5, &[(0, 1), (0, 2), (0, 3), (0, 4), (1, 2), (1, 3), (1, 4)])
}

/// The `dim`-dimensional hypercube: vertices differing in one bit are bonded.
fn hypercube(dim: usize) -> Molecule {
    let n = 1usize << dim;
    let bonds: Vec<_> = (0..n)
        .flat_map(|v| {
            (0..dim)
                .map(|b| 1 << b)
                .filter(move |bit| v & bit == 0)
                .map(move |bit| (v, v | bit))
        })
        .collect();
    carbons(n, &bonds)
}

fn cube() -> Molecule {
    hypercube(3)
}

fn cyclobutene() -> Molecule {
    build(
        &[Element::Carbon; 4],
        &[
            (0, 1, Bond::Double),
            (1, 2, Bond::Single),
            (2, 3, Bond::Single),
            (3, 0, Bond::Single),
        ],
    )
}

/// Bond one hydrogen to every atom of `skeleton` with fewer than `valence`
/// bonds, as many times as needed.
fn saturate(skeleton: Molecule, valence: usize) -> Molecule {
    let mut mol = skeleton;
    for v in 0..mol.atom_count() {
        for _ in mol.neighbors(v).len()..valence {
            let h = mol.add_atom(Atom::new(Element::Hydrogen));
            mol.add_bond(v, h, Bond::Single).unwrap();
        }
    }
    mol
}

/// Dodecahedrane: the generalized Petersen graph G(10, 2) with one hydrogen
/// per carbon.
fn dodecahedrane() -> Molecule {
    let mut bonds = Vec::new();
    for i in 0..10 {
        bonds.push((i, (i + 1) % 10));
        bonds.push((i, i + 10));
        bonds.push((i + 10, (i + 2) % 10 + 10));
    }
    saturate(carbons(20, &bonds), 4)
}

/// Adamantane with all hydrogens: bridgeheads 0-3, one CH2 on each pair.
fn adamantane() -> Molecule {
    let mut bonds = Vec::new();
    for (k, (a, b)) in (0..4usize).tuple_combinations::<(usize, usize)>().enumerate() {
        bonds.push((a, 4 + k));
        bonds.push((b, 4 + k));
    }
    saturate(carbons(10, &bonds), 4)
}

/// Naphthalene with all hydrogens; 4 and 9 are the fusion carbons.
fn naphthalene() -> Molecule {
    let mut bonds: Vec<_> = (0..10).map(|i| (i, (i + 1) % 10, Bond::Aromatic)).collect();
    bonds.push((4, 9, Bond::Aromatic));
    saturate(build(&[Element::Carbon; 10], &bonds), 3)
}

fn benzene() -> Molecule {
    let mut elements = vec![Element::Carbon; 6];
    elements.extend([Element::Hydrogen; 6]);
    let mut bonds: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6, Bond::Aromatic)).collect();
    bonds.extend((0..6).map(|i| (i, i + 6, Bond::Single)));
    build(&elements, &bonds)
}

fn methane() -> Molecule {
    let mut elements = vec![Element::Carbon];
    elements.extend([Element::Hydrogen; 4]);
    let bonds: Vec<_> = (1..5).map(|h| (0, h, Bond::Single)).collect();
    build(&elements, &bonds)
}

fn canonical(mol: &Molecule) -> String {
    MoleculeSignature::new(mol, Height::Unbounded, LabelMode::Element, ParallelMode::None)
        .to_canonical_string()
}

fn orbit_sizes(mol: &Molecule) -> Vec<usize> {
    MoleculeSignature::from_graph(mol)
        .calculate_orbits()
        .iter()
        .map(|orbit| orbit.len())
        .sorted()
        .collect()
}

/// Assert that relabelling `mol` by every `step`-th permutation leaves its
/// canonical signature and orbit sizes unchanged.
fn assert_invariant(mol: &Molecule, step: usize) {
    let n = mol.atom_count();
    assert_relabellings_agree(mol, (0..n).permutations(n).step_by(step));
}

/// As [`assert_invariant`], over `count` seeded random permutations, for
/// graphs too large to walk the permutations of.
fn assert_shuffles_agree(mol: &Molecule, count: u64) {
    let permutations = (0..count).map(|seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut permutation: Vec<usize> = (0..mol.atom_count()).collect();
        permutation.shuffle(&mut rng);
        permutation
    });
    assert_relabellings_agree(mol, permutations);
}

fn assert_relabellings_agree(mol: &Molecule, permutations: impl Iterator<Item = Vec<usize>>) {
    let expected = canonical(mol);
    let sizes = orbit_sizes(mol);
    for permutation in permutations {
        let relabelled = mol.relabel(&permutation).unwrap();
        assert_eq!(canonical(&relabelled), expected, "permutation {permutation:?}");
        assert_eq!(orbit_sizes(&relabelled), sizes, "permutation {permutation:?}");
    }
}

#[test]
fn stars_are_invariant() {
    assert_invariant(&star(3), 1);
    assert_invariant(&star(4), 1);
}

#[test]
fn rings_are_invariant() {
    for n in 3..=6 {
        assert_invariant(&ring(n), 1);
    }
}

#[test]
fn propellane_is_invariant() {
    assert_invariant(&propellane(), 1);
    assert_eq!(orbit_sizes(&propellane()), vec![2, 3]);
}

#[test]
fn cube_is_invariant() {
    assert_invariant(&cube(), 211);
}

#[test]
fn tesseract_is_one_orbit_under_relabelling() {
    // 16 vertices of degree 4: 24 symmetric choices below every root.
    let mol = hypercube(4);
    assert_eq!(orbit_sizes(&mol), vec![16]);
    assert_shuffles_agree(&mol, 20);
}

#[test]
fn dodecahedrane_is_invariant() {
    let mol = dodecahedrane();
    assert_eq!(mol.atom_count(), 40);
    assert_eq!(orbit_sizes(&mol), vec![20, 20]);
    assert_shuffles_agree(&mol, 10);
}

#[test]
fn adamantane_with_hydrogens_is_invariant() {
    // CH and CH2 carbons, and the hydrogens on each.
    let mol = adamantane();
    assert_eq!(mol.atom_count(), 26);
    assert_eq!(orbit_sizes(&mol), vec![4, 4, 6, 12]);
    assert_shuffles_agree(&mol, 10);
}

#[test]
fn naphthalene_with_hydrogens_is_invariant() {
    // Fusion, alpha and beta carbons; alpha and beta hydrogens.
    let mol = naphthalene();
    assert_eq!(mol.atom_count(), 18);
    assert_eq!(orbit_sizes(&mol), vec![2, 4, 4, 4, 4]);
    assert_shuffles_agree(&mol, 10);
}

#[test]
fn canonically_labelled_relabellings_share_one_edge_string() {
    for mol in [propellane(), cyclobutene()] {
        let n = mol.atom_count();
        let edge_strings: Vec<String> = (0..n)
            .permutations(n)
            .filter_map(|permutation| {
                let relabelled = mol.relabel(&permutation).unwrap();
                let sig = MoleculeSignature::from_graph(&relabelled);
                sig.is_canonically_labelled()
                    .then(|| sig.reconstruct_canonical_edge_string().unwrap())
            })
            .collect();
        assert!(!edge_strings.is_empty());
        assert!(edge_strings.iter().all_equal(), "{edge_strings:?}");
    }
}

#[test]
fn cube_is_one_orbit() {
    let mol = cube();
    assert_eq!(orbit_sizes(&mol), vec![8]);

    let quotient = QuotientGraph::new(&mol, Height::Unbounded, LabelMode::Element);
    assert_eq!(quotient.vertex_count(), 1);
    assert_eq!(quotient.edge_count(), 1);
    assert_eq!(quotient.number_of_loop_edges(), 1);
}

#[test]
fn benzene_carbons_share_a_signature() {
    let mol = benzene();
    let sig = MoleculeSignature::from_graph(&mol);
    let strings = sig.signature_strings();
    assert!(strings[..6].iter().all_equal());
    assert!(strings[6..].iter().all_equal());
    assert_ne!(strings[0], strings[6]);
    assert_eq!(orbit_sizes(&mol), vec![6, 6]);
}

#[test]
fn methane_has_two_orbits() {
    assert_eq!(orbit_sizes(&methane()), vec![1, 4]);
}

#[test]
fn square_signature() {
    assert_eq!(canonical(&ring(4)), "[C]([C]([C,0])[C]([C,0]))");
}

#[test]
fn higher_signatures_refine_orbits() {
    for mol in [ring(6), propellane(), cube(), benzene(), star(4)] {
        let n = mol.atom_count();
        for h in 0..5 {
            let at = |height| {
                MoleculeSignature::new(&mol, height, LabelMode::Element, ParallelMode::None)
            };
            let (lower, upper) = (at(Height::Bounded(h)), at(Height::Bounded(h + 1)));
            let (lower, upper) = (lower.signature_strings(), upper.signature_strings());
            for (u, v) in (0..n).tuple_combinations() {
                if upper[u] == upper[v] {
                    assert_eq!(lower[u], lower[v], "height {h}, vertices {u} and {v}");
                }
            }
        }
    }
}

#[test]
fn every_color_closes() {
    for mol in [ring(5), propellane(), cube(), benzene()] {
        for root in 0..mol.atom_count() {
            let sig =
                VertexSignature::new(&mol, root, Height::Unbounded, LabelMode::Element).unwrap();
            let tree = sig.to_colored_tree();
            assert!(tree.validate().is_ok(), "{sig}");
            assert_eq!(ColoredTree::parse(&sig.to_string()).as_ref(), Ok(tree));
        }
    }
}

#[test]
fn even_ring_colors_close_on_two_leaves() {
    for n in [4, 6, 8] {
        let mol = ring(n);
        let sig = VertexSignature::new(&mol, 0, Height::Unbounded, LabelMode::Element).unwrap();
        let tree = sig.to_colored_tree();
        let counts = tree.color_counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&0], 2);
        assert!(tree
            .nodes()
            .iter()
            .filter(|node| node.color().is_some())
            .all(|node| node.is_leaf()));
    }
}

#[test]
fn cube_antipode_has_three_arrivals() {
    // The antipode is reached from three parents: its color is written three
    // times and still expanded on one node only.
    let mol = cube();
    let sig = VertexSignature::new(&mol, 0, Height::Unbounded, LabelMode::Element).unwrap();
    let counts = sig.to_colored_tree().color_counts();
    assert_eq!(counts.values().copied().sorted().collect::<Vec<_>>(), vec![2, 2, 2, 3]);
}
