// Molecule definition and the graph surface signatures read
pub mod molecule;
pub mod object;

// Data IO
pub mod loader;

// Colored trees, their text form, and rebuilding graphs from them
pub mod builder;
pub mod tree;

// The hard bit: canonical signatures per vertex and per molecule
pub mod signature;
pub mod vertex;

// Symmetry classes
pub mod orbit;
pub mod quotient;

pub mod error;

// Utility functions
mod utils;

// Python library
#[cfg(feature = "python")]
pub mod python;
