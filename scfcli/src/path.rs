//! Dotted result paths: `segment ('.' segment)*` where
//! `segment := ident ('()' | '[' '-'? digits ']')*`.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    Call,
    Index(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub suffixes: Vec<Suffix>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    text: String,
    pub segments: Vec<Segment>,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Path {
    pub fn parse(text: &str) -> Result<Self> {
        let syntax = |reason: String| Error::PathSyntax {
            path: text.to_string(),
            reason,
        };
        if text.is_empty() {
            return Err(syntax("empty path".to_string()));
        }
        let mut segments = Vec::new();
        for raw in text.split('.') {
            let mut chars = raw.char_indices().peekable();
            match chars.peek() {
                Some(&(_, c)) if is_ident_start(c) => {}
                _ => return Err(syntax(format!("`{}` does not start with an identifier", raw))),
            }
            let mut end = raw.len();
            while let Some(&(i, c)) = chars.peek() {
                if !is_ident_char(c) {
                    end = i;
                    break;
                }
                chars.next();
            }
            let name = raw[..end].to_string();
            let mut suffixes = Vec::new();
            let mut rest = &raw[end..];
            while !rest.is_empty() {
                if let Some(after) = rest.strip_prefix("()") {
                    suffixes.push(Suffix::Call);
                    rest = after;
                } else if let Some(after) = rest.strip_prefix('[') {
                    let close = after
                        .find(']')
                        .ok_or_else(|| syntax("unclosed `[`".to_string()))?;
                    let digits = &after[..close];
                    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
                    if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
                        return Err(syntax(format!("invalid index `[{}]`", digits)));
                    }
                    let index = digits
                        .parse::<i64>()
                        .map_err(|_| syntax(format!("index `{}` out of bounds", digits)))?;
                    suffixes.push(Suffix::Index(index));
                    rest = &after[close + 1..];
                } else {
                    return Err(syntax(format!("unexpected `{}` after `{}`", rest, name)));
                }
            }
            segments.push(Segment { name, suffixes });
        }
        Ok(Path {
            text: text.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        let path = Path::parse("mol.atom_coords()[0][-1]").unwrap();
        assert_eq!(path.segments.len(), 2);
        assert_eq!(path.segments[0].name, "mol");
        assert!(path.segments[0].suffixes.is_empty());
        assert_eq!(
            path.segments[1].suffixes,
            vec![Suffix::Call, Suffix::Index(0), Suffix::Index(-1)]
        );
        assert_eq!(path.to_string(), "mol.atom_coords()[0][-1]");
    }

    #[test]
    fn test_reject_malformed_paths() {
        for bad in ["", "e_tot.", ".e_tot", "mo_energy[", "mo_energy[a]", "f(x)", "1abc", "a[]", "a b"] {
            assert!(
                matches!(Path::parse(bad), Err(Error::PathSyntax { .. })),
                "accepted `{}`",
                bad
            );
        }
    }
}
