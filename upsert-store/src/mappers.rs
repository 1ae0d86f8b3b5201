//! Row → FieldRecord mapping against a declared schema.

use crate::errors::MapError;
use crate::record::{FieldRecord, FieldValue, Row};
use crate::schema::FieldSchema;

use std::collections::BTreeMap;

/// Builds the typed payload for one source row.
///
/// Required columns must be present, non-null, and coercible. Optional
/// columns are omitted when absent or null; a present value that fails
/// coercion is an error even for optional columns. The vector is checked
/// against `dim` here so a misbehaving provider is caught before anything
/// reaches the sink.
pub fn map_row(
    row: &Row,
    schema: &FieldSchema,
    vector: Vec<f32>,
    dim: usize,
    row_index: usize,
) -> Result<FieldRecord, MapError> {
    if vector.len() != dim {
        return Err(MapError::VectorSize {
            got: vector.len(),
            want: dim,
        });
    }

    let mut fields: BTreeMap<String, FieldValue> = BTreeMap::new();
    for spec in &schema.fields {
        match row.get(&spec.name).filter(|v| !v.is_null()) {
            Some(v) => {
                let coerced = spec.kind.coerce(v).ok_or_else(|| MapError::Coercion {
                    column: spec.name.clone(),
                    expected: spec.kind.name(),
                    value: v.to_string(),
                })?;
                fields.insert(spec.name.clone(), coerced);
            }
            None if spec.required => {
                return Err(MapError::MissingColumn {
                    column: spec.name.clone(),
                });
            }
            None => {}
        }
    }

    Ok(FieldRecord {
        row_index,
        fields,
        vector,
    })
}
