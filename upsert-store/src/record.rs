//! Core data models used by the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One raw source row: column name → raw JSON value.
///
/// Rows are immutable once read; the mapper only looks at them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub BTreeMap<String, Value>);

impl Row {
    /// Returns the raw value of a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row(iter.into_iter().collect())
    }
}

/// Typed scalar stored in a record payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Typed payload submitted to the sink for one record.
///
/// Every key in `fields` is declared in the schema; optional columns that
/// were absent or null in the source row are simply not here. The vector is
/// always exactly the configured dimension.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Zero-based index of the source row, used to derive a stable point id.
    pub row_index: usize,
    /// Schema-checked scalar fields.
    pub fields: BTreeMap<String, FieldValue>,
    /// Embedding vector.
    pub vector: Vec<f32>,
}
