//! Column schema: declared names, types, and required flags.
//!
//! The schema is fixed before a job starts; the mapper walks it for every
//! row instead of guessing types from the data.

use crate::record::FieldValue;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a payload column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
}

impl FieldKind {
    /// Human-readable name used in coercion errors.
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
        }
    }

    /// Attempts to coerce a raw JSON value into this kind.
    ///
    /// Returns `None` when the value cannot represent the declared type; the
    /// mapper turns that into a coercion error with full context. Nulls never
    /// reach this function.
    ///
    /// Rules:
    /// - `Str` stringifies any scalar.
    /// - `Int` accepts integers and integer-valued floats in `i64` range
    ///   (CSV exports often carry `2017.0` for a year column).
    /// - `Float` accepts any number.
    /// - `Bool` accepts booleans plus the usual textual/numeric forms
    ///   (`"true"`, `"false"`, `"1"`, `"0"`, `1`, `0`).
    pub fn coerce(self, v: &Value) -> Option<FieldValue> {
        match self {
            FieldKind::Str => match v {
                Value::String(s) => Some(FieldValue::Str(s.clone())),
                Value::Number(n) => Some(FieldValue::Str(n.to_string())),
                Value::Bool(b) => Some(FieldValue::Str(b.to_string())),
                _ => None,
            },
            FieldKind::Int => match v {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => Some(FieldValue::Int(i)),
                    None => {
                        // a float at or beyond 2^63 would saturate the cast
                        let limit = 2f64.powi(63);
                        n.as_f64()
                            .filter(|f| {
                                f.is_finite() && f.fract() == 0.0 && (-limit..limit).contains(f)
                            })
                            .map(|f| FieldValue::Int(f as i64))
                    }
                },
                _ => None,
            },
            FieldKind::Float => v.as_f64().map(FieldValue::Float),
            FieldKind::Bool => match v {
                Value::Bool(b) => Some(FieldValue::Bool(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(FieldValue::Bool(false)),
                    Some(1) => Some(FieldValue::Bool(true)),
                    _ => None,
                },
                Value::String(s) => match s.to_ascii_lowercase().as_str() {
                    "true" | "1" => Some(FieldValue::Bool(true)),
                    "false" | "0" => Some(FieldValue::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
        }
    }
}

/// One declared column.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Ordered list of declared columns.
///
/// The vector column is implicit: every record gets one of the configured
/// dimension, so it is never declared here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Looks up a column spec by name.
    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_accepts_integral_floats() {
        assert_eq!(
            FieldKind::Int.coerce(&json!(2017.0)),
            Some(FieldValue::Int(2017))
        );
        assert_eq!(FieldKind::Int.coerce(&json!(42)), Some(FieldValue::Int(42)));
        assert_eq!(FieldKind::Int.coerce(&json!(3.5)), None);
        assert_eq!(FieldKind::Int.coerce(&json!("42")), None);
    }

    #[test]
    fn int_rejects_floats_beyond_i64_range() {
        assert_eq!(FieldKind::Int.coerce(&json!(1e19)), None);
        assert_eq!(FieldKind::Int.coerce(&json!(-1e19)), None);
        assert_eq!(
            FieldKind::Int.coerce(&json!(2.0_f64.powi(62))),
            Some(FieldValue::Int(1 << 62))
        );
    }

    #[test]
    fn str_stringifies_scalars() {
        assert_eq!(
            FieldKind::Str.coerce(&json!("Navy Blue")),
            Some(FieldValue::Str("Navy Blue".into()))
        );
        assert_eq!(
            FieldKind::Str.coerce(&json!(7)),
            Some(FieldValue::Str("7".into()))
        );
        assert_eq!(
            FieldKind::Str.coerce(&json!(true)),
            Some(FieldValue::Str("true".into()))
        );
        assert_eq!(FieldKind::Str.coerce(&json!([1, 2])), None);
    }

    #[test]
    fn float_accepts_any_number() {
        assert_eq!(
            FieldKind::Float.coerce(&json!(0.831)),
            Some(FieldValue::Float(0.831))
        );
        assert_eq!(
            FieldKind::Float.coerce(&json!(3)),
            Some(FieldValue::Float(3.0))
        );
        assert_eq!(FieldKind::Float.coerce(&json!("0.8")), None);
    }

    #[test]
    fn bool_accepts_common_forms() {
        for truthy in [json!(true), json!("true"), json!("True"), json!("1"), json!(1)] {
            assert_eq!(
                FieldKind::Bool.coerce(&truthy),
                Some(FieldValue::Bool(true)),
                "expected truthy: {truthy}"
            );
        }
        for falsy in [json!(false), json!("false"), json!("0"), json!(0)] {
            assert_eq!(FieldKind::Bool.coerce(&falsy), Some(FieldValue::Bool(false)));
        }
        assert_eq!(FieldKind::Bool.coerce(&json!("yes")), None);
        assert_eq!(FieldKind::Bool.coerce(&json!(2)), None);
    }

    #[test]
    fn spec_lookup_by_name() {
        let schema = FieldSchema::new(vec![
            FieldSpec::required("artist", FieldKind::Str),
            FieldSpec::optional("tempo", FieldKind::Float),
        ]);
        assert_eq!(schema.spec("tempo").map(|s| s.kind), Some(FieldKind::Float));
        assert!(schema.spec("missing").is_none());
    }
}
