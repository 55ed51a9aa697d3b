use pyo3::{exceptions::PyValueError, prelude::*};

use crate::{
    loader::parse_molfile_str,
    signature::{MoleculeSignature, ParallelMode},
    vertex::{Height, LabelMode},
};

fn height_from(height: Option<i64>) -> PyResult<Height> {
    match height {
        None => Ok(Height::Unbounded),
        Some(h) => Height::try_from(h).map_err(|e| PyValueError::new_err(e.to_string())),
    }
}

/// Canonical signature of the molecule in `mol_block`; `height=None` means
/// full height.
#[pyfunction]
#[pyo3(signature = (mol_block, height=None))]
fn canonical_signature(mol_block: String, height: Option<i64>) -> PyResult<String> {
    let mol = parse_molfile_str(&mol_block).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let sig = MoleculeSignature::new(
        &mol,
        height_from(height)?,
        LabelMode::Element,
        ParallelMode::Always,
    );
    Ok(sig.to_canonical_string())
}

/// Symmetry orbits of the atoms in `mol_block` as lists of atom indices.
#[pyfunction]
#[pyo3(signature = (mol_block, height=None))]
fn orbits(mol_block: String, height: Option<i64>) -> PyResult<Vec<Vec<usize>>> {
    let mol = parse_molfile_str(&mol_block).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let sig = MoleculeSignature::new(
        &mol,
        height_from(height)?,
        LabelMode::Element,
        ParallelMode::Always,
    );
    Ok(sig
        .calculate_orbits()
        .iter()
        .map(|orbit| orbit.members().to_vec())
        .collect())
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn molecular_signatures(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(canonical_signature, m)?)?;
    m.add_function(wrap_pyfunction!(orbits, m)?)?;
    Ok(())
}
