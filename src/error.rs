//! Error types shared across the crate.

use thiserror::Error;

/// Malformed signature text, reported by [`ColoredTree::parse`](crate::tree::ColoredTree::parse).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("empty signature")]
    EmptyInput,

    #[error("unbalanced '[' or ']' at position {position}")]
    UnbalancedBracket { position: usize },

    #[error("unbalanced '(' or ')' at position {position}")]
    UnbalancedParenthesis { position: usize },

    #[error("unknown edge token '{token}' at position {position}")]
    UnknownEdgeToken { token: char, position: usize },

    #[error("empty vertex symbol at position {position}")]
    EmptySymbol { position: usize },

    #[error("invalid color id at position {position}")]
    InvalidColor { position: usize },

    #[error("unexpected '{found}' at position {position}")]
    UnexpectedCharacter { found: char, position: usize },

    #[error("color {color} is never closed")]
    UnclosedColor { color: usize },

    #[error("color {color} is expanded on more than one node")]
    ColorDefinedTwice { color: usize },
}

/// A colored tree that cannot be turned back into a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("color {color} is referenced but never resolved to a second node")]
    UnresolvedColor { color: usize },

    #[error("color {color} names a {expected} vertex but is used on a {found} node")]
    SymbolMismatch {
        color: usize,
        expected: String,
        found: String,
    },

    #[error("color {color} closes a bond from a vertex to itself")]
    SelfLoop { color: usize },

    #[error("vertices {a} and {b} are joined by two different bonds")]
    ConflictingBond { a: usize, b: usize },

    #[error("'{0}' is not an atom symbol")]
    UnknownSymbol(String),
}

/// Errors raised while computing or rebuilding signatures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("height must be non-negative, got {0}")]
    NegativeHeight(i64),

    #[error("invalid height '{0}'")]
    InvalidHeight(String),

    #[error("vertex {vertex} out of range for a graph with {count} vertices")]
    VertexOutOfRange { vertex: usize, count: usize },

    #[error("expected {expected} precomputed signatures, got {found}")]
    SignatureCountMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Failures reading a V2000 `.mol` file. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ParseMolfileError {
    #[error("molfile ends before line {0}")]
    MissingLine(usize),

    #[error("bad counts line {line}")]
    BadCountsLine { line: usize },

    #[error("bad atom line {line}")]
    BadAtomLine { line: usize },

    #[error("unknown element '{symbol}' on line {line}")]
    UnknownElement { symbol: String, line: usize },

    #[error("bad bond line {line}")]
    BadBondLine { line: usize },

    #[error("unsupported bond type {code} on line {line}")]
    UnknownBondCode { code: usize, line: usize },

    #[error("bad isotope line {line}")]
    BadIsotopeLine { line: usize },

    #[error(transparent)]
    Molecule(#[from] MoleculeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Invalid edits to a [`Molecule`](crate::molecule::Molecule).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoleculeError {
    #[error("atom {0} does not exist")]
    UnknownAtom(usize),

    #[error("atom {0} cannot bond to itself")]
    SelfLoop(usize),

    #[error("atoms {0} and {1} are already bonded")]
    DuplicateBond(usize, usize),
}
