//! Remote sink abstraction.

use crate::errors::SinkError;
use crate::record::FieldRecord;
use std::{future::Future, pin::Pin};

/// A vector-database collection accepting batched upserts.
///
/// Implementations classify every failure into [`SinkError`]; the retry
/// executor keys off the `RateLimited` variant alone, so classification is
/// the adapter's whole contract. Records are never retained beyond the call.
pub trait RemoteSink: Send + Sync {
    /// Upserts one batch of records.
    fn upsert<'a>(
        &'a self,
        batch: &'a [FieldRecord],
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;
}
