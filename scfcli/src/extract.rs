//! Reading requested result paths off a live object.

use crate::error::{Error, Result};
use crate::objects::{Attr, Attributes};
use crate::path::{Path, Suffix};
use serde_json::{Map, Value};

enum Cursor<'a> {
    Object(&'a dyn Attributes),
    Method { owner: &'a dyn Attributes, name: String },
    Data(Value),
}

fn index(path: &Path, value: Value, i: i64) -> Result<Value> {
    let Value::Array(mut items) = value else {
        return Err(Error::PathSyntax {
            path: path.to_string(),
            reason: format!("cannot index {}", value),
        });
    };
    let len = items.len();
    let position = if i < 0 { len as i64 + i } else { i };
    if position < 0 || position >= len as i64 {
        return Err(Error::IndexOutOfRange {
            path: path.to_string(),
            index: i,
            len,
        });
    }
    Ok(items.swap_remove(position as usize))
}

/// Walks `path` from `root`. A trailing method without `()` is invoked.
pub fn resolve(root: &dyn Attributes, path: &Path) -> Result<Value> {
    let mut cursor = Cursor::Object(root);
    for segment in &path.segments {
        cursor = match cursor {
            Cursor::Object(object) => match object.get_attr(&segment.name)? {
                Attr::Data(value) => Cursor::Data(value),
                Attr::Object(sub) => Cursor::Object(sub),
                Attr::Method => Cursor::Method {
                    owner: object,
                    name: segment.name.clone(),
                },
            },
            Cursor::Data(Value::Object(mut map)) => match map.remove(&segment.name) {
                Some(value) => Cursor::Data(value),
                None => {
                    return Err(Error::UnknownAttribute {
                        type_name: "mapping".to_string(),
                        attr: segment.name.clone(),
                    })
                }
            },
            Cursor::Data(_) => {
                return Err(Error::UnknownAttribute {
                    type_name: "value".to_string(),
                    attr: segment.name.clone(),
                })
            }
            Cursor::Method { name, .. } => {
                return Err(Error::PathSyntax {
                    path: path.to_string(),
                    reason: format!("method `{}` must be called with ()", name),
                })
            }
        };
        for suffix in &segment.suffixes {
            cursor = match (cursor, suffix) {
                (Cursor::Method { owner, name }, Suffix::Call) => Cursor::Data(owner.call(&name)?),
                (Cursor::Data(value), Suffix::Index(i)) => Cursor::Data(index(path, value, *i)?),
                (Cursor::Method { name, .. }, Suffix::Index(_)) => {
                    return Err(Error::PathSyntax {
                        path: path.to_string(),
                        reason: format!("method `{}` must be called before indexing", name),
                    })
                }
                (Cursor::Object(_), Suffix::Index(_)) => {
                    return Err(Error::NotAValue(path.to_string()))
                }
                (_, Suffix::Call) => return Err(Error::NotCallable(path.to_string())),
            };
        }
    }
    match cursor {
        Cursor::Data(value) => Ok(value),
        Cursor::Method { owner, name } => owner.call(&name),
        Cursor::Object(_) => Err(Error::NotAValue(path.to_string())),
    }
}

/// Path text to value, in request order.
pub fn extract(root: &dyn Attributes, paths: &[Path]) -> Result<Map<String, Value>> {
    paths
        .iter()
        .map(|path| Ok((path.to_string(), resolve(root, path)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scf::{MeanField, Mole};
    use serde_json::json;

    fn h2() -> MeanField {
        let mut mol = Mole::new();
        mol.atom = "H 0 0 0; H 0 0 0.74".to_string();
        mol.build().unwrap();
        let mut mf = MeanField::new("HF", mol).unwrap();
        mf.kernel().unwrap();
        mf
    }

    fn get(mf: &MeanField, text: &str) -> Result<Value> {
        resolve(mf, &Path::parse(text)?)
    }

    #[test]
    fn test_resolve_data_methods_and_indices() {
        let mf = h2();
        let e_tot = get(&mf, "e_tot").unwrap().as_f64().unwrap();
        assert!((e_tot - mf.e_tot().unwrap()).abs() < 1e-12);

        let homo = get(&mf, "mo_energy[0]").unwrap().as_f64().unwrap();
        let lumo = get(&mf, "mo_energy[-1]").unwrap().as_f64().unwrap();
        assert!(homo < lumo);

        let z = get(&mf, "mol.atom_coords()[1][2]").unwrap().as_f64().unwrap();
        assert!((z - 0.74 / scf::mole::BOHR).abs() < 1e-8);

        // trailing method is invoked
        let e_nuc = get(&mf, "mol.energy_nuc").unwrap().as_f64().unwrap();
        assert!((e_nuc - mf.energy_nuc()).abs() < 1e-12);
        assert_eq!(get(&mf, "dip_moment()").unwrap().as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_resolution_errors() {
        let mf = h2();
        assert!(matches!(get(&mf, "mo_energy[2]"), Err(Error::IndexOutOfRange { len: 2, .. })));
        assert!(matches!(get(&mf, "e_tot()"), Err(Error::NotCallable(_))));
        assert!(matches!(get(&mf, "mol"), Err(Error::NotAValue(_))));
        assert!(matches!(get(&mf, "e_total"), Err(Error::UnknownAttribute { .. })));
        assert!(matches!(get(&mf, "mol.atom_coords[0]"), Err(Error::PathSyntax { .. })));
    }

    #[test]
    fn test_extract_keeps_request_order() {
        let mf = h2();
        let paths: Vec<Path> = ["converged", "e_tot"]
            .iter()
            .map(|p| Path::parse(p).unwrap())
            .collect();
        let values = extract(&mf, &paths).unwrap();
        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["converged", "e_tot"]);
        assert_eq!(values["converged"], json!(true));
    }
}
