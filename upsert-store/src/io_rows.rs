//! JSONL dataset reader.

use crate::errors::UpsertError;
use crate::record::Row;

use std::io::{BufRead, BufReader};
use std::{fs::File, path::Path};
use tracing::{debug, info};

/// Reads the dataset strictly: one JSON object per line.
///
/// - Empty lines are skipped.
/// - Any malformed line fails the whole read, carrying its 1-based number.
///
/// # Errors
/// - [`UpsertError::Io`] if the file cannot be read.
/// - [`UpsertError::Parse`] if any line fails deserialization.
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<Row>, UpsertError> {
    info!("Reading dataset rows: {:?}", path.as_ref());

    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let row: Row = serde_json::from_str(&line).map_err(|e| UpsertError::Parse {
            line: i + 1,
            source: e,
        })?;
        out.push(row);
    }

    debug!("Loaded {} rows", out.len());
    Ok(out)
}
