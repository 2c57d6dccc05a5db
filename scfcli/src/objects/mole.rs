use super::{
    float, invalid, matrix, matrix3, to_bool, to_f64, to_i64, to_opt_string, to_string, vector, Attr,
    Attributes,
};
use crate::error::Result;
use scf::{BasisSpec, Cell, Mole};
use serde_json::{json, Value};

/// Accepts `"H 0 0 0; H 0 0 0.74"` or a list of entries, each either a
/// string or `[symbol, [x, y, z]]`.
/// A basis name, or a mapping from element symbol to basis name.
fn basis_spec(type_name: &str, value: &Value) -> Result<BasisSpec> {
    match value {
        Value::Object(names) => Ok(BasisSpec::PerElement(
            names
                .iter()
                .map(|(element, name)| Ok((element.clone(), to_string(type_name, "basis", name)?)))
                .collect::<Result<_>>()?,
        )),
        other => Ok(BasisSpec::Name(to_string(type_name, "basis", other)?)),
    }
}

fn atom_spec(type_name: &str, value: &Value) -> Result<String> {
    let entry = |item: &Value| -> Result<String> {
        match item {
            Value::String(s) => Ok(s.clone()),
            Value::Array(fields) => {
                let mut parts = Vec::new();
                for field in fields {
                    match field {
                        Value::Array(xyz) => {
                            for x in xyz {
                                parts.push(to_f64(type_name, "atom", x)?.to_string());
                            }
                        }
                        other => parts.push(to_string(type_name, "atom", other)?),
                    }
                }
                Ok(parts.join(" "))
            }
            other => Err(invalid(type_name, "atom", format!("unexpected atom entry {}", other))),
        }
    };
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Array(items) => Ok(items
            .iter()
            .map(entry)
            .collect::<Result<Vec<_>>>()?
            .join("; ")),
        other => Err(invalid(type_name, "atom", format!("expected a geometry, got {}", other))),
    }
}

impl Attributes for Mole {
    fn type_name(&self) -> &'static str {
        "Mole"
    }

    fn get_attr(&self, name: &str) -> Result<Attr<'_>> {
        let value = match name {
            "atom" => json!(self.atom),
            "basis" => match &self.basis {
                BasisSpec::Name(name) => json!(name),
                BasisSpec::PerElement(names) => json!(names),
            },
            "unit" => json!(self.unit),
            "charge" => json!(self.charge),
            "spin" => json!(self.spin),
            "verbose" => json!(self.verbose),
            "symmetry" => json!(self.symmetry),
            "max_memory" => float(self.max_memory),
            "output" => json!(self.output),
            "cart" => json!(self.cart),
            "natm" => json!(self.natm()),
            "nelectron" => json!(self.nelectron()),
            "nelec" => {
                let (na, nb) = self.nelec();
                json!([na, nb])
            }
            "atom_coords" | "atom_charges" | "energy_nuc" | "nao_nr" | "elements" => {
                return Ok(Attr::Method)
            }
            _ => return Err(self.unknown(name)),
        };
        Ok(Attr::Data(value))
    }

    fn set_attr(&mut self, name: &str, value: &Value) -> Result<()> {
        let t = self.type_name();
        match name {
            "atom" => self.atom = atom_spec(t, value)?,
            "basis" => self.basis = basis_spec(t, value)?,
            "unit" => self.unit = to_string(t, name, value)?,
            "charge" => self.charge = to_i64(t, name, value)?,
            "spin" => self.spin = to_i64(t, name, value)?,
            "verbose" => self.verbose = to_i64(t, name, value)?,
            "symmetry" => self.symmetry = to_opt_string(t, name, value)?,
            "max_memory" => self.max_memory = to_f64(t, name, value)?,
            "output" => self.output = to_opt_string(t, name, value)?,
            "cart" => self.cart = to_bool(t, name, value)?,
            _ => return Err(self.unknown(name)),
        }
        Ok(())
    }

    fn call(&self, name: &str) -> Result<Value> {
        match name {
            "atom_coords" => Ok(matrix(&self.atom_coords())),
            "atom_charges" => Ok(vector(&self.atom_charges())),
            "energy_nuc" => Ok(float(self.energy_nuc())),
            "nao_nr" => Ok(json!(self.nao_nr())),
            "elements" => Ok(json!((0..self.natm())
                .filter_map(|i| self.atom_symbol(i))
                .collect::<Vec<_>>())),
            _ => Err(self.unknown(name)),
        }
    }
}

impl Attributes for Cell {
    fn type_name(&self) -> &'static str {
        "Cell"
    }

    fn get_attr(&self, name: &str) -> Result<Attr<'_>> {
        let value = match name {
            "a" => json!(self.a),
            "ke_cutoff" => json!(self.ke_cutoff),
            "pseudo" => json!(self.pseudo),
            "dimension" => json!(self.dimension),
            "lattice_vectors" | "vol" => return Ok(Attr::Method),
            _ => return self.mol.get_attr(name),
        };
        Ok(Attr::Data(value))
    }

    fn set_attr(&mut self, name: &str, value: &Value) -> Result<()> {
        let t = self.type_name();
        match name {
            "a" => {
                self.a = match value {
                    Value::Array(rows) => {
                        let mut numbers = Vec::new();
                        for row in rows {
                            match row {
                                Value::Array(xs) => {
                                    for x in xs {
                                        numbers.push(to_f64(t, name, x)?.to_string());
                                    }
                                }
                                x => numbers.push(to_f64(t, name, x)?.to_string()),
                            }
                        }
                        numbers.join(" ")
                    }
                    other => to_string(t, name, other)?,
                }
            }
            "ke_cutoff" => {
                self.ke_cutoff = match value {
                    Value::Null => None,
                    other => Some(to_f64(t, name, other)?),
                }
            }
            "pseudo" => self.pseudo = to_opt_string(t, name, value)?,
            "dimension" => self.dimension = to_i64(t, name, value)?,
            _ => self.mol.set_attr(name, value)?,
        }
        Ok(())
    }

    fn call(&self, name: &str) -> Result<Value> {
        match name {
            "lattice_vectors" => Ok(matrix3(&self.lattice_vectors()?)),
            "vol" => Ok(float(self.vol()?)),
            _ => self.mol.call(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_back() {
        let mut mol = Mole::new();
        mol.set_attr("atom", &json!([["H", [0, 0, 0]], "H 0 0 0.74"])).unwrap();
        mol.set_attr("basis", &json!("sto-3g")).unwrap();
        mol.set_attr("charge", &json!(0)).unwrap();
        mol.set_attr("symmetry", &json!(true)).unwrap();
        mol.build().unwrap();
        assert_eq!(mol.atom, "H 0 0 0; H 0 0 0.74");
        assert!(matches!(mol.get_attr("natm").unwrap(), Attr::Data(v) if v == json!(2)));
        assert!(matches!(mol.get_attr("atom_coords").unwrap(), Attr::Method));
        assert_eq!(mol.call("nao_nr").unwrap(), json!(2));
        assert_eq!(mol.call("elements").unwrap(), json!(["H", "H"]));
    }

    #[test]
    fn test_basis_by_element() {
        let mut mol = Mole::new();
        mol.set_attr("atom", &json!("H 0 0 0; H 0 0 0.74")).unwrap();
        mol.set_attr("basis", &json!({"H": "sto-3g"})).unwrap();
        mol.build().unwrap();
        assert_eq!(mol.nao_nr(), 2);
        assert!(matches!(mol.get_attr("basis").unwrap(), Attr::Data(v) if v == json!({"H": "sto-3g"})));
        assert!(matches!(
            mol.set_attr("basis", &json!({"H": ["sto-3g"]})),
            Err(crate::Error::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_reject_unknown_and_mistyped() {
        let mut mol = Mole::new();
        assert!(matches!(
            mol.set_attr("atoms", &json!("H 0 0 0")),
            Err(crate::Error::UnknownAttribute { .. })
        ));
        assert!(matches!(
            mol.set_attr("charge", &json!("minus one")),
            Err(crate::Error::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_cell_delegates_to_molecule() {
        let mut cell = Cell::new();
        cell.set_attr("atom", &json!("He 0 0 0")).unwrap();
        cell.set_attr("a", &json!([[3, 0, 0], [0, 3, 0], [0, 0, 3]])).unwrap();
        cell.set_attr("unit", &json!("bohr")).unwrap();
        cell.build().unwrap();
        assert_eq!(cell.mol.unit, "bohr");
        let vol = cell.call("vol").unwrap().as_f64().unwrap();
        assert!((vol - 27.0).abs() < 1e-10);
        assert_eq!(cell.call("nao_nr").unwrap(), json!(1));
    }
}
