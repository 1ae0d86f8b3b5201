//! Batch planning over the source record range.

use crate::errors::ConfigError;

/// One planned batch: a contiguous half-open range of source rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchSpan {
    /// Zero-based batch number.
    pub index: usize,
    /// First row covered (inclusive).
    pub start: usize,
    /// One past the last row covered.
    pub end: usize,
}

impl BatchSpan {
    /// Number of rows in this batch.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `[0, total_records)` into spans of at most `batch_size` rows.
///
/// Spans come back in source order, contiguous and non-overlapping; the last
/// one may be short. An empty source yields no spans.
pub fn plan_batches(
    total_records: usize,
    batch_size: usize,
) -> Result<Vec<BatchSpan>, ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::InvalidConfig("batch_size must be > 0".into()));
    }

    let num_batches = total_records.div_ceil(batch_size);
    let mut spans = Vec::with_capacity(num_batches);
    for index in 0..num_batches {
        let start = index * batch_size;
        let end = ((index + 1) * batch_size).min(total_records);
        spans.push(BatchSpan { index, start, end });
    }
    Ok(spans)
}
