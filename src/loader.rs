//! Read molecules from V2000 `.mol` files.
//!
//! Only the counts line, the atom and bond blocks, and `M  ISO` isotope lines
//! are read. Hydrogens are kept as ordinary atoms. In an SD file only the first
//! record is read.

use std::{fs, path::Path};

use crate::{
    error::ParseMolfileError,
    molecule::{Atom, Bond, Element, Molecule},
};

const HEADER_LINES: usize = 3;

/// Load the molecule in the `.mol` file at `path`.
pub fn parse(path: impl AsRef<Path>) -> Result<Molecule, ParseMolfileError> {
    let contents = fs::read_to_string(path)?;
    parse_molfile_str(&contents)
}

/// Parse the text of a `.mol` file (a "mol block").
pub fn parse_molfile_str(input: &str) -> Result<Molecule, ParseMolfileError> {
    let lines: Vec<&str> = input
        .lines()
        .take_while(|line| !line.starts_with("$$$$"))
        .collect();
    let line = |i: usize| lines.get(i).copied().ok_or(ParseMolfileError::MissingLine(i + 1));

    let (num_atoms, num_bonds) = parse_counts_line(line(HEADER_LINES)?)
        .ok_or(ParseMolfileError::BadCountsLine { line: HEADER_LINES + 1 })?;

    let atom_start = HEADER_LINES + 1;
    let bond_start = atom_start + num_atoms;
    let props_start = bond_start + num_bonds;

    // Atom block.
    let mut atoms = Vec::with_capacity(num_atoms);
    for i in atom_start..bond_start {
        let symbol = parse_atom_line(line(i)?)
            .ok_or(ParseMolfileError::BadAtomLine { line: i + 1 })?;
        let element = symbol
            .parse::<Element>()
            .map_err(|_| ParseMolfileError::UnknownElement {
                symbol: symbol.to_string(),
                line: i + 1,
            })?;
        atoms.push(Atom::new(element));
    }

    // Bond block.
    let mut bonds = Vec::with_capacity(num_bonds);
    for i in bond_start..props_start {
        let (a, b, code) = parse_bond_line(line(i)?)
            .filter(|&(a, b, _)| (1..=num_atoms).contains(&a) && (1..=num_atoms).contains(&b))
            .ok_or(ParseMolfileError::BadBondLine { line: i + 1 })?;
        let bond = Bond::try_from(code)
            .map_err(|_| ParseMolfileError::UnknownBondCode { code, line: i + 1 })?;
        bonds.push((a - 1, b - 1, bond));
    }

    // Properties block; only isotopes matter here.
    for (i, props_line) in lines.iter().enumerate().skip(props_start) {
        if props_line.starts_with("M  END") {
            break;
        }
        if props_line.starts_with("M  ISO") {
            let pairs = parse_isotope_line(props_line)
                .filter(|pairs| pairs.iter().all(|&(a, _)| (1..=num_atoms).contains(&a)))
                .ok_or(ParseMolfileError::BadIsotopeLine { line: i + 1 })?;
            for (a, mass) in pairs {
                atoms[a - 1] = Atom::with_isotope(atoms[a - 1].element(), mass);
            }
        }
    }

    let mut mol = Molecule::new();
    for atom in atoms {
        mol.add_atom(atom);
    }
    for (a, b, bond) in bonds {
        mol.add_bond(a, b, bond)?;
    }
    Ok(mol)
}

fn parse_counts_line(counts_line: &str) -> Option<(usize, usize)> {
    Some((
        counts_line.get(0..3)?.trim().parse().ok()?,
        counts_line.get(3..6)?.trim().parse().ok()?,
    ))
}

fn parse_atom_line(atom_line: &str) -> Option<&str> {
    let symbol = atom_line.get(31..34)?.trim();
    (!symbol.is_empty()).then_some(symbol)
}

fn parse_bond_line(bond_line: &str) -> Option<(usize, usize, usize)> {
    Some((
        bond_line.get(0..3)?.trim().parse().ok()?,
        bond_line.get(3..6)?.trim().parse().ok()?,
        bond_line.get(6..9)?.trim().parse().ok()?,
    ))
}

/// `M  ISOnn8 aaa vvv ...` as `(atom, mass)` pairs.
fn parse_isotope_line(iso_line: &str) -> Option<Vec<(usize, u32)>> {
    let fields: Vec<&str> = iso_line.get(6..)?.split_whitespace().collect();
    let (count, rest) = fields.split_first()?;
    let count: usize = count.parse().ok()?;
    if rest.len() != 2 * count {
        return None;
    }
    rest.chunks(2)
        .map(|pair| Some((pair[0].parse().ok()?, pair[1].parse().ok()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoleculeError;

    fn atom_line(symbol: &str) -> String {
        format!(
            "{:>10}{:>10}{:>10} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
            "0.0000",
            "0.0000",
            "0.0000",
            symbol
        )
    }

    fn bond_line(a: usize, b: usize, code: usize) -> String {
        format!("{a:>3}{b:>3}{code:>3}  0")
    }

    fn molfile(atoms: &[&str], bonds: &[(usize, usize, usize)], extra: &[&str]) -> String {
        let mut lines = vec![
            "name".to_string(),
            "  program".to_string(),
            String::new(),
            format!("{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000", atoms.len(), bonds.len()),
        ];
        lines.extend(atoms.iter().map(|s| atom_line(s)));
        lines.extend(bonds.iter().map(|&(a, b, c)| bond_line(a, b, c)));
        lines.extend(extra.iter().map(|s| s.to_string()));
        lines.push("M  END".to_string());
        lines.join("\n")
    }

    #[test]
    fn water_keeps_hydrogens() {
        let text = molfile(&["O", "H", "H"], &[(1, 2, 1), (1, 3, 1)], &[]);
        let mol = parse_molfile_str(&text).unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.atom(1), Some(&Atom::new(Element::Hydrogen)));
        assert_eq!(mol.bond(0, 2), Some(Bond::Single));
    }

    #[test]
    fn bond_codes_and_isotopes() {
        let text = molfile(
            &["C", "C", "O", "N"],
            &[(1, 2, 4), (1, 3, 2), (2, 4, 3)],
            &["M  ISO  1   1  13"],
        );
        let mol = parse_molfile_str(&text).unwrap();
        assert_eq!(mol.bond(0, 1), Some(Bond::Aromatic));
        assert_eq!(mol.bond(0, 2), Some(Bond::Double));
        assert_eq!(mol.bond(1, 3), Some(Bond::Triple));
        assert_eq!(mol.atom(0), Some(&Atom::with_isotope(Element::Carbon, 13)));
        assert_eq!(mol.atom(1).and_then(Atom::isotope), None);
    }

    #[test]
    fn only_first_record_is_read() {
        let first = molfile(&["C"], &[], &[]);
        let second = molfile(&["O", "O"], &[(1, 2, 2)], &[]);
        let sdf = format!("{first}\n$$$$\n{second}\n$$$$\n");
        assert_eq!(parse_molfile_str(&sdf).unwrap().atom_count(), 1);
    }

    #[test]
    fn malformed_files() {
        assert!(matches!(parse_molfile_str("a\nb\n"), Err(ParseMolfileError::MissingLine(4))));
        assert!(matches!(
            parse_molfile_str("a\nb\nc\nxyz\n"),
            Err(ParseMolfileError::BadCountsLine { line: 4 })
        ));
        assert!(matches!(
            parse_molfile_str(&molfile(&["Qq"], &[], &[])),
            Err(ParseMolfileError::UnknownElement { line: 5, .. })
        ));
        assert!(matches!(
            parse_molfile_str(&molfile(&["C", "C"], &[(1, 2, 8)], &[])),
            Err(ParseMolfileError::UnknownBondCode { code: 8, line: 7 })
        ));
        assert!(matches!(
            parse_molfile_str(&molfile(&["C", "C"], &[(1, 5, 1)], &[])),
            Err(ParseMolfileError::BadBondLine { line: 7 })
        ));
        assert!(matches!(
            parse_molfile_str(&molfile(&["C", "C"], &[(1, 2, 1), (2, 1, 1)], &[])),
            Err(ParseMolfileError::Molecule(MoleculeError::DuplicateBond(0, 1)))
        ));
        assert!(matches!(
            parse_molfile_str(&molfile(&["C"], &[], &["M  ISO  2   1  13"])),
            Err(ParseMolfileError::BadIsotopeLine { line: 6 })
        ));
    }
}
