//! Applying configuration bodies to objects, natively or as source text.

use crate::error::Result;
use crate::objects::Attributes;
use serde_json::{Map, Value};

/// Body keys that never become attributes.
pub const RESERVED: [&str; 3] = ["args", "kwargs", "results"];

/// Sets every non-reserved entry of `body` on `target`. A nested mapping
/// recurses into the sub-object of the same name when the target exposes
/// one, and is otherwise assigned wholesale.
pub fn apply(target: &mut dyn Attributes, body: &Map<String, Value>) -> Result<()> {
    for (name, value) in body {
        if RESERVED.contains(&name.as_str()) {
            continue;
        }
        match value {
            Value::Object(nested) => match target.attr_object_mut(name) {
                Some(sub) => apply(sub, nested)?,
                None => target.set_attr(name, value)?,
            },
            _ => target.set_attr(name, value)?,
        }
    }
    Ok(())
}

/// `prefix.name = value` lines for every non-reserved entry.
pub fn assignment_statements(body: &Map<String, Value>, prefix: &str) -> Vec<String> {
    body.iter()
        .filter(|(name, _)| !RESERVED.contains(&name.as_str()))
        .map(|(name, value)| format!("{}.{} = {}", prefix, name, python_literal(value)))
        .collect()
}

/// Python `repr` of a float: `1e-09`, `0.5`, `2.0`.
fn python_float(x: f64) -> String {
    if !x.is_finite() {
        return if x.is_nan() {
            "float('nan')".to_string()
        } else if x > 0.0 {
            "float('inf')".to_string()
        } else {
            "-float('inf')".to_string()
        };
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", x);
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{}e{}{:0>2}", mantissa, sign, digits);
    }
    if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// Line feeds stay literal inside a triple-quoted string; everything that
/// could end the literal early is escaped.
fn python_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "\\r");
    if s.contains('\n') {
        format!("\"\"\"{}\"\"\"", escaped)
    } else {
        format!("\"{}\"", escaped)
    }
}

/// Source literal of a configuration value.
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (_, Some(u)) => u.to_string(),
            _ => python_float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => python_string(s),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(python_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", python_string(k), python_literal(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// `a, b, key = c` argument list of a call.
pub fn call_arguments(args: &[Value], kwargs: &Map<String, Value>) -> String {
    args.iter()
        .map(python_literal)
        .chain(
            kwargs
                .iter()
                .map(|(k, v)| format!("{} = {}", k, python_literal(v))),
        )
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scf::{MeanField, Mole};
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_python_literals() {
        assert_eq!(python_literal(&json!(1e-9)), "1e-09");
        assert_eq!(python_literal(&json!(2.5e-5)), "2.5e-05");
        assert_eq!(python_literal(&json!(1e20)), "1e+20");
        assert_eq!(python_literal(&json!(0.5)), "0.5");
        assert_eq!(python_literal(&json!(2.0)), "2.0");
        assert_eq!(python_literal(&json!(4)), "4");
        assert_eq!(python_literal(&json!(true)), "True");
        assert_eq!(python_literal(&Value::Null), "None");
        assert_eq!(python_literal(&json!("sto-3g")), "\"sto-3g\"");
        assert_eq!(python_literal(&json!("a\nb")), "\"\"\"a\nb\"\"\"");
        assert_eq!(python_literal(&json!("a\nb\"")), "\"\"\"a\nb\\\"\"\"\"");
        assert_eq!(python_literal(&json!("C:\\x\n\"\"\"")), r#""""C:\\x
\"\"\"""""#);
        assert_eq!(python_literal(&json!("a\rb")), "\"a\\rb\"");
        assert_eq!(python_literal(&json!([1, "x"])), "[1, \"x\"]");
        assert_eq!(python_literal(&json!({"H": "sto-3g"})), "{\"H\": \"sto-3g\"}");
    }

    #[test]
    fn test_statements_skip_reserved_keys() {
        let lines = assignment_statements(
            &body(json!({"conv_tol": 1e-9, "results": ["e_tot"], "max_cycle": 10})),
            "mf",
        );
        assert_eq!(lines, vec!["mf.conv_tol = 1e-09", "mf.max_cycle = 10"]);
        assert_eq!(
            call_arguments(&[json!(4)], &body(json!({"x": "y"}))),
            "4, x = \"y\""
        );
    }

    #[test]
    fn test_apply_recurses_into_sub_objects() {
        let mut mol = Mole::new();
        mol.atom = "H 0 0 0; H 0 0 0.74".to_string();
        mol.build().unwrap();
        let mut mf = MeanField::new("HF", mol).unwrap();
        let settings = body(json!({
            "conv_tol": 1e-10,
            "mol": {"verbose": 0},
            "results": "e_tot",
        }));
        apply(&mut mf, &settings).unwrap();
        assert_eq!(mf.settings.conv_tol, 1e-10);
        assert_eq!(mf.mol.verbose, 0);

        // applying twice leaves the same state
        apply(&mut mf, &settings).unwrap();
        assert_eq!(mf.settings.conv_tol, 1e-10);
        assert_eq!(mf.mol.verbose, 0);

        assert!(apply(&mut mf, &body(json!({"no_such_knob": 1}))).is_err());
    }
}
