use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::ffi::OsStr;
use std::fs;
use std::iter::zip;
use std::path::Path;

use molecular_signatures::{
    loader,
    molecule::Molecule,
    signature::{MoleculeSignature, ParallelMode},
    vertex::{Height, LabelMode},
};

pub fn reference_datasets(c: &mut Criterion) {
    // Define a new criterion benchmark group of dataset benchmarks.
    let mut group = c.benchmark_group("reference_datasets");

    // Define datasets, heights, and labels.
    let datasets = ["small_molecules"];
    let heights = [Height::Bounded(2), Height::Bounded(4), Height::Unbounded];
    let height_strs = ["h2", "h4", "full"];

    for dataset in datasets.iter() {
        // Load all molecules from the given dataset.
        let paths = fs::read_dir(Path::new("data").join(dataset)).unwrap();
        let mut mol_list: Vec<Molecule> = Vec::new();
        for path in paths {
            let name = path.unwrap().path();
            if name.extension().and_then(OsStr::to_str) != Some("mol") {
                continue;
            }
            mol_list.push(
                loader::parse_molfile_str(
                    &fs::read_to_string(name.clone())
                        .expect(&format!("Could not read file {name:?}")),
                )
                .expect(&format!("Failed to parse {name:?}")),
            );
        }

        // For each height, compute the orbits of every molecule in this
        // dataset, serially and in parallel.
        for (height, height_str) in zip(&heights, &height_strs) {
            let modes = [
                (ParallelMode::None, "serial"),
                (ParallelMode::Always, "parallel"),
            ];
            for (pmode, pmode_str) in modes {
                let id = BenchmarkId::new(*dataset, format!("{height_str}-{pmode_str}"));
                group.bench_with_input(id, height, |b, &height| {
                    b.iter(|| {
                        for mol in &mol_list {
                            MoleculeSignature::new(mol, height, LabelMode::Element, pmode)
                                .calculate_orbits();
                        }
                    });
                });
            }
        }
    }

    group.finish();
}

criterion_group! {
    name = benchmark;
    config = Criterion::default().sample_size(20);
    targets = reference_datasets
}
criterion_main!(benchmark);
