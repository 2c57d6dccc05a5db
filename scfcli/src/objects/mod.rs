//! Attribute access on computational objects.
//!
//! Configuration bodies set attributes by name and result paths read them
//! back. Each native object exposes a fixed attribute table through
//! [`Attributes`]; unknown names are rejected instead of silently ignored.

mod grad;
mod mean_field;
mod mole;
mod post;

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use serde_json::{Number, Value};

/// What a readable attribute name resolves to.
pub enum Attr<'a> {
    Data(Value),
    Object(&'a dyn Attributes),
    /// Zero-argument method, invoked through [`Attributes::call`].
    Method,
}

pub trait Attributes {
    fn type_name(&self) -> &'static str;

    fn get_attr(&self, name: &str) -> Result<Attr<'_>>;

    fn set_attr(&mut self, name: &str, value: &Value) -> Result<()>;

    /// Sub-object a nested mapping is applied to, if the attribute is one.
    fn attr_object_mut(&mut self, _name: &str) -> Option<&mut dyn Attributes> {
        None
    }

    fn call(&self, name: &str) -> Result<Value> {
        Err(Error::NotCallable(format!("{}.{}", self.type_name(), name)))
    }

    fn unknown(&self, name: &str) -> Error {
        Error::UnknownAttribute {
            type_name: self.type_name().to_string(),
            attr: name.to_string(),
        }
    }
}

pub(crate) fn invalid(type_name: &str, attr: &str, reason: impl Into<String>) -> Error {
    Error::InvalidAttribute {
        type_name: type_name.to_string(),
        attr: attr.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn to_f64(type_name: &str, attr: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(type_name, attr, format!("expected a number, got {}", value)))
}

pub(crate) fn to_i64(type_name: &str, attr: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(type_name, attr, format!("expected an integer, got {}", value)))
}

pub(crate) fn to_usize(type_name: &str, attr: &str, value: &Value) -> Result<usize> {
    let n = to_i64(type_name, attr, value)?;
    usize::try_from(n)
        .map_err(|_| invalid(type_name, attr, format!("expected a non-negative integer, got {}", n)))
}

pub(crate) fn to_bool(type_name: &str, attr: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64().is_some() => Ok(n.as_i64() != Some(0)),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(true),
            "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(type_name, attr, format!("expected a boolean, got {}", value))),
        },
        _ => Err(invalid(type_name, attr, format!("expected a boolean, got {}", value))),
    }
}

pub(crate) fn to_string(type_name: &str, attr: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(type_name, attr, format!("expected a string, got {}", value))),
    }
}

/// `null` clears an optional string.
pub(crate) fn to_opt_string(type_name: &str, attr: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some("true".to_string())),
        other => to_string(type_name, attr, other).map(Some),
    }
}

pub(crate) fn float(x: f64) -> Value {
    Number::from_f64(x).map_or(Value::Null, Value::Number)
}

pub(crate) fn floats<'a>(xs: impl IntoIterator<Item = &'a f64>) -> Value {
    Value::Array(xs.into_iter().map(|&x| float(x)).collect())
}

pub(crate) fn vector(v: &DVector<f64>) -> Value {
    floats(v.iter())
}

pub(crate) fn vector3(v: &Vector3<f64>) -> Value {
    floats(v.iter())
}

/// Nested row-major arrays.
pub(crate) fn matrix(m: &DMatrix<f64>) -> Value {
    Value::Array(
        m.row_iter()
            .map(|row| floats(row.iter()))
            .collect(),
    )
}

pub(crate) fn matrix3(m: &Matrix3<f64>) -> Value {
    Value::Array(m.row_iter().map(|row| floats(row.iter())).collect())
}
