//! Molecule and cell descriptors.
//!
//! Geometries are stored in bohr once built. The raw user input (`atom`,
//! `unit`, `basis`, ...) is kept next to the built data so that the
//! descriptor can be modified and rebuilt in place.

extern crate nalgebra as na;

use crate::error::ScfError;
use basis::{BasisSetName, ContractedGTO};
use na::{DMatrix, DVector, Matrix3, Vector3};
use periodic_table_on_an_enum::Element;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

pub const BOHR: f64 = 0.52917721092;

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub symbol: String,
    pub charge: u32,
    pub coord: Vector3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Angstrom,
    Bohr,
}

impl Unit {
    pub fn parse(s: &str) -> Result<Self, ScfError> {
        match s.trim().to_lowercase().as_str() {
            "angstrom" | "ang" | "a" => Ok(Unit::Angstrom),
            "bohr" | "au" | "b" | "a.u." => Ok(Unit::Bohr),
            _ => Err(ScfError::Unit(s.to_string())),
        }
    }

    fn to_bohr(&self) -> f64 {
        match self {
            Unit::Angstrom => 1.0 / BOHR,
            Unit::Bohr => 1.0,
        }
    }
}

/// One basis set for every atom, or one per element symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasisSpec {
    Name(String),
    PerElement(BTreeMap<String, String>),
}

impl BasisSpec {
    /// Basis set of the element `symbol`. Per-element keys are matched
    /// case-insensitively.
    pub fn for_element(&self, symbol: &str) -> Result<BasisSetName, ScfError> {
        let name = match self {
            BasisSpec::Name(name) => name,
            BasisSpec::PerElement(names) => names
                .iter()
                .find(|(element, _)| normalize_symbol(element) == symbol)
                .map(|(_, name)| name)
                .ok_or_else(|| ScfError::MissingBasis(symbol.to_string()))?,
        };
        Ok(name.parse()?)
    }
}

impl From<&str> for BasisSpec {
    fn from(name: &str) -> Self {
        BasisSpec::Name(name.to_string())
    }
}

impl fmt::Display for BasisSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisSpec::Name(name) => write!(f, "{}", name),
            BasisSpec::PerElement(names) => {
                let pairs: Vec<String> = names.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mole {
    pub atom: String,
    pub basis: BasisSpec,
    pub unit: String,
    pub charge: i64,
    pub spin: i64,
    pub verbose: i64,
    pub symmetry: Option<String>,
    pub max_memory: f64,
    pub output: Option<String>,
    pub cart: bool,
    atoms: Vec<Atom>,
    ao: Vec<ContractedGTO>,
    ao_atom: Vec<usize>,
    built: bool,
}

impl Default for Mole {
    fn default() -> Self {
        Mole {
            atom: String::new(),
            basis: BasisSpec::from("sto-3g"),
            unit: "angstrom".to_string(),
            charge: 0,
            spin: 0,
            verbose: 3,
            symmetry: None,
            max_memory: 4000.0,
            output: None,
            cart: false,
            atoms: Vec::new(),
            ao: Vec::new(),
            ao_atom: Vec::new(),
            built: false,
        }
    }
}

fn normalize_symbol(raw: &str) -> String {
    let letters: String = raw.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let mut chars = letters.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Parses `"O 0 0 0; H 0 0.757 0.587"` (entries separated by `;` or new
/// lines, fields by white space or commas) into atoms in bohr.
pub fn parse_atoms(spec: &str, unit: Unit) -> Result<Vec<Atom>, ScfError> {
    let scale = unit.to_bohr();
    let mut atoms = Vec::new();
    for entry in spec.split(|c: char| c == ';' || c == '\n') {
        let fields: Vec<&str> = entry
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 4 {
            return Err(ScfError::Geometry(format!(
                "expected `symbol x y z`, found `{}`",
                entry.trim()
            )));
        }
        let symbol = normalize_symbol(fields[0]);
        let element = Element::from_symbol(&symbol)
            .ok_or_else(|| ScfError::UnknownElement(fields[0].to_string()))?;
        let mut xyz = [0.0; 3];
        for (k, f) in fields[1..].iter().enumerate() {
            xyz[k] = f
                .parse::<f64>()
                .map_err(|_| ScfError::Geometry(format!("invalid coordinate `{}`", f)))?;
        }
        atoms.push(Atom {
            symbol,
            charge: element.get_atomic_number() as u32,
            coord: Vector3::new(xyz[0], xyz[1], xyz[2]) * scale,
        });
    }
    if atoms.is_empty() {
        return Err(ScfError::Geometry("no atoms given".to_string()));
    }
    Ok(atoms)
}

impl Mole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the geometry, checks charge and spin and builds the AO basis.
    pub fn build(&mut self) -> Result<(), ScfError> {
        let unit = Unit::parse(&self.unit)?;
        let atoms = parse_atoms(&self.atom, unit)?;

        let electrons = atoms.iter().map(|a| a.charge as i64).sum::<i64>() - self.charge;
        if electrons < 0 || self.spin < 0 || self.spin > electrons || (electrons - self.spin) % 2 != 0 {
            return Err(ScfError::Spin {
                electrons,
                spin: self.spin,
            });
        }

        let mut ao = Vec::new();
        let mut ao_atom = Vec::new();
        for (i, atom) in atoms.iter().enumerate() {
            let element = Element::from_symbol(&atom.symbol)
                .ok_or_else(|| ScfError::UnknownElement(atom.symbol.clone()))?;
            let basis = self.basis.for_element(&atom.symbol)?;
            let functions = basis.atom_basis(&element, atom.coord)?;
            ao_atom.extend(std::iter::repeat(i).take(functions.len()));
            ao.extend(functions);
        }

        if self.symmetry.is_some() {
            warn!("point group symmetry is not exploited, running without it");
        }

        self.atoms = atoms;
        self.ao = ao;
        self.ao_atom = ao_atom;
        self.built = true;

        info!(
            "molecule built: {} atoms, {} electrons, {} basis functions ({})",
            self.natm(),
            electrons,
            self.ao.len(),
            self.basis
        );
        for (i, atom) in self.atoms.iter().enumerate() {
            debug!(
                "  atom {:3} {:2} [{:12.6}, {:12.6}, {:12.6}] bohr",
                i, atom.symbol, atom.coord.x, atom.coord.y, atom.coord.z
            );
        }
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn ao(&self) -> &[ContractedGTO] {
        &self.ao
    }

    pub fn ao_atom(&self) -> &[usize] {
        &self.ao_atom
    }

    pub fn natm(&self) -> usize {
        self.atoms.len()
    }

    pub fn nao_nr(&self) -> usize {
        self.ao.len()
    }

    pub fn nelectron(&self) -> usize {
        (self.atoms.iter().map(|a| a.charge as i64).sum::<i64>() - self.charge).max(0) as usize
    }

    /// (alpha, beta) electron counts.
    pub fn nelec(&self) -> (usize, usize) {
        let n = self.nelectron();
        let spin = self.spin.max(0) as usize;
        ((n + spin) / 2, (n - spin.min(n)) / 2)
    }

    pub fn energy_nuc(&self) -> f64 {
        let mut e = 0.0;
        for i in 0..self.atoms.len() {
            for j in 0..i {
                let r = (self.atoms[i].coord - self.atoms[j].coord).norm();
                if r > 1e-10 {
                    e += (self.atoms[i].charge * self.atoms[j].charge) as f64 / r;
                }
            }
        }
        e
    }

    /// natm x 3 coordinates in bohr.
    pub fn atom_coords(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.atoms.len(), 3, |i, k| self.atoms[i].coord[k])
    }

    pub fn atom_charges(&self) -> DVector<f64> {
        DVector::from_iterator(self.atoms.len(), self.atoms.iter().map(|a| a.charge as f64))
    }

    pub fn atom_symbol(&self, i: usize) -> Option<&str> {
        self.atoms.get(i).map(|a| a.symbol.as_str())
    }

    /// Moves the atoms to `coords` (bohr) and rebuilds the basis centers.
    /// The textual geometry is rewritten so that a later `build` keeps the
    /// new positions.
    pub fn set_geom(&mut self, coords: &[Vector3<f64>]) -> Result<(), ScfError> {
        if !self.built {
            return Err(ScfError::NotBuilt("Mole"));
        }
        if coords.len() != self.atoms.len() {
            return Err(ScfError::Geometry(format!(
                "expected {} coordinates, got {}",
                self.atoms.len(),
                coords.len()
            )));
        }
        for (atom, c) in self.atoms.iter_mut().zip(coords) {
            atom.coord = *c;
        }
        for (f, &i) in self.ao.iter_mut().zip(self.ao_atom.iter()) {
            f.set_center(coords[i]);
        }
        self.atom = self
            .atoms
            .iter()
            .map(|a| format!("{} {:.10} {:.10} {:.10}", a.symbol, a.coord.x, a.coord.y, a.coord.z))
            .collect::<Vec<_>>()
            .join("; ");
        self.unit = "bohr".to_string();
        Ok(())
    }

    pub fn coords(&self) -> Vec<Vector3<f64>> {
        self.atoms.iter().map(|a| a.coord).collect()
    }
}

/// Periodic cell descriptor. Only the geometry and lattice are handled
/// natively; periodic mean-field methods are not.
#[derive(Debug, Clone)]
pub struct Cell {
    pub mol: Mole,
    pub a: String,
    pub ke_cutoff: Option<f64>,
    pub pseudo: Option<String>,
    pub dimension: i64,
    lattice: Option<Matrix3<f64>>,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            mol: Mole::default(),
            a: String::new(),
            ke_cutoff: None,
            pseudo: None,
            dimension: 3,
            lattice: None,
        }
    }
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self) -> Result<(), ScfError> {
        let unit = Unit::parse(&self.mol.unit)?;
        let values: Vec<f64> = self
            .a
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|f| !f.is_empty())
            .map(|f| {
                f.parse::<f64>()
                    .map_err(|_| ScfError::Geometry(format!("invalid lattice entry `{}`", f)))
            })
            .collect::<Result<_, _>>()?;
        if values.len() != 9 {
            return Err(ScfError::Geometry(format!(
                "lattice vectors need 9 numbers, got {}",
                values.len()
            )));
        }
        self.lattice = Some(Matrix3::from_row_slice(&values) * unit.to_bohr());
        self.mol.build()
    }

    /// Rows are the lattice vectors in bohr.
    pub fn lattice_vectors(&self) -> Result<Matrix3<f64>, ScfError> {
        self.lattice.ok_or(ScfError::NotBuilt("Cell"))
    }

    pub fn vol(&self) -> Result<f64, ScfError> {
        Ok(self.lattice_vectors()?.determinant().abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_semicolon_and_newline_geometry() {
        let atoms = parse_atoms("O 0 0 0; H 0 1 0\nh1, 0, 0, 1", Unit::Bohr).unwrap();
        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[2].symbol, "H");
        assert_eq!(atoms[0].charge, 8);
        assert_relative_eq!(atoms[2].coord.z, 1.0);
    }

    #[test]
    fn test_angstrom_is_converted() {
        let atoms = parse_atoms("H 0 0 0; H 0 0 0.74", Unit::Angstrom).unwrap();
        assert_relative_eq!(atoms[1].coord.z, 0.74 / BOHR, epsilon = 1e-12);
    }

    #[test]
    fn test_bad_geometry() {
        assert!(matches!(
            parse_atoms("Xx 0 0 0", Unit::Bohr),
            Err(ScfError::UnknownElement(_))
        ));
        assert!(matches!(
            parse_atoms("H 0 0", Unit::Bohr),
            Err(ScfError::Geometry(_))
        ));
    }

    #[test]
    fn test_build_water() {
        let mut mol = Mole::new();
        mol.atom = "O 0 0 0; H 0 -0.757 0.587; H 0 0.757 0.587".to_string();
        mol.build().unwrap();
        assert_eq!(mol.nao_nr(), 7);
        assert_eq!(mol.nelectron(), 10);
        assert_eq!(mol.nelec(), (5, 5));
        assert!(mol.energy_nuc() > 9.0 && mol.energy_nuc() < 9.3);
    }

    #[test]
    fn test_basis_per_element() {
        let mut mol = Mole::new();
        mol.atom = "O 0 0 0; H 0 -0.757 0.587; H 0 0.757 0.587".to_string();
        mol.basis = BasisSpec::PerElement(
            [("o", "sto-3g"), ("H", "STO-3G")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        mol.build().unwrap();
        assert_eq!(mol.nao_nr(), 7);

        mol.basis = BasisSpec::PerElement([("H".to_string(), "sto-3g".to_string())].into());
        assert!(matches!(mol.build(), Err(ScfError::MissingBasis(s)) if s == "O"));
    }

    #[test]
    fn test_inconsistent_spin() {
        let mut mol = Mole::new();
        mol.atom = "H 0 0 0; H 0 0 0.74".to_string();
        mol.spin = 1;
        assert!(matches!(mol.build(), Err(ScfError::Spin { .. })));
    }

    #[test]
    fn test_set_geom_moves_basis() {
        let mut mol = Mole::new();
        mol.atom = "H 0 0 0; H 0 0 0.74".to_string();
        mol.build().unwrap();
        let coords = vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 2.0)];
        mol.set_geom(&coords).unwrap();
        assert_relative_eq!(mol.ao()[1].center.z, 2.0);
        assert_relative_eq!(mol.energy_nuc(), 0.5);
        mol.build().unwrap();
        assert_relative_eq!(mol.atom_coords()[(1, 2)], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cell_lattice() {
        let mut cell = Cell::new();
        cell.mol.atom = "He 0 0 0".to_string();
        cell.mol.unit = "bohr".to_string();
        cell.a = "4 0 0; 0 4 0; 0 0 4".to_string();
        cell.build().unwrap();
        assert_relative_eq!(cell.vol().unwrap(), 64.0, epsilon = 1e-10);
    }
}
