use std::{io, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use molecular_signatures::{
    loader,
    quotient::QuotientGraph,
    signature::{MoleculeSignature, ParallelMode},
    vertex::{Height, LabelMode},
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum Output {
    /// The canonical signature of the molecule.
    Canonical,
    /// Every distinct vertex signature with its multiplicity.
    Full,
    /// Symmetry orbits as CSV.
    Orbits,
    /// Summary of the quotient graph over the orbits.
    Quotient,
    /// One signature per atom.
    Vertices,
    /// Bonds implied by the canonical signature.
    Edges,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a V2000 .mol file.
    path: PathBuf,

    /// Signature height: a non-negative integer or `full`.
    #[arg(long, default_value = "full")]
    height: Height,

    /// How atoms are labelled in signatures.
    #[arg(long, value_enum, default_value_t = LabelMode::Element)]
    label_mode: LabelMode,

    /// What to print.
    #[arg(short, long, value_enum, default_value_t = Output::Canonical)]
    output: Output,

    /// Compute atom signatures on one thread.
    #[arg(long)]
    serial: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let molecule =
        loader::parse(&cli.path).with_context(|| format!("failed to read {}", cli.path.display()))?;
    if molecule.is_malformed() {
        bail!("{} has self-loops or doubled bonds", cli.path.display());
    }

    let parallel_mode = if cli.serial {
        ParallelMode::None
    } else {
        ParallelMode::Always
    };
    let sig = MoleculeSignature::new(&molecule, cli.height, cli.label_mode, parallel_mode);

    match cli.output {
        Output::Canonical => println!("{}", sig.to_canonical_string()),
        Output::Full => println!("{}", sig.to_full_string()),
        Output::Vertices => {
            for (v, signature) in sig.signature_strings().iter().enumerate() {
                println!("{v}\t{signature}");
            }
        }
        Output::Orbits => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["orbit", "size", "members", "signature"])?;
            for (i, orbit) in sig.calculate_orbits().iter().enumerate() {
                let members: Vec<String> = orbit.iter().map(|v| v.to_string()).collect();
                writer.write_record([
                    i.to_string(),
                    orbit.len().to_string(),
                    members.join(" "),
                    orbit.label().to_string(),
                ])?;
            }
            writer.flush()?;
        }
        Output::Quotient => {
            let quotient = QuotientGraph::from_molecule_signature(&sig);
            println!("orbits: {}", quotient.vertex_count());
            println!("edges: {}", quotient.edge_count());
            println!("loops: {}", quotient.number_of_loop_edges());
            for orbit in quotient.orbits() {
                println!("{orbit}");
            }
        }
        Output::Edges => println!("{}", sig.reconstruct_canonical_edge_string()?),
    }

    Ok(())
}
