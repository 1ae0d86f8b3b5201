//! Batched upsert engine for Qdrant vector collections.
//!
//! This crate provides a clean API to:
//! - Map schema-declared JSONL rows into typed payloads with generated vectors
//! - Upsert them into a collection in fixed-size, fixed-pace batches
//! - Absorb remote rate limiting with bounded exponential backoff, skipping a
//!   batch only after its retries are exhausted
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod batch;
mod cancel;
mod config;
mod errors;
mod ingest;
mod io_rows;
mod mappers;
mod progress;
mod qdrant_sink;
mod record;
mod retry;
mod schema;
mod sink;
mod vectors;

pub use batch::{BatchSpan, plan_batches};
pub use cancel::CancelToken;
pub use config::{DistanceKind, JobConfig, QdrantConfig, UpsertConfig};
pub use errors::{ConfigError, MapError, SinkError, UpsertError, UpsertResult};
pub use ingest::JobReport;
pub use io_rows::read_rows;
pub use mappers::map_row;
pub use progress::{BatchEvent, IndicatifProgress, NoopProgress, Progress};
pub use qdrant_sink::QdrantSink;
pub use record::{FieldRecord, FieldValue, Row};
pub use retry::{BatchOutcome, RetryPolicy};
pub use schema::{FieldKind, FieldSchema, FieldSpec};
pub use sink::RemoteSink;
pub use vectors::{RandomVectors, VectorProvider};

use tracing::{debug, trace};

/// High-level facade that wires configuration, sink, and vector provider.
///
/// This is the single entry point recommended for application code.
pub struct UpsertStore {
    cfg: UpsertConfig,
    sink: Box<dyn RemoteSink>,
    vectors: Box<dyn VectorProvider>,
    progress: Box<dyn Progress>,
    cancel: CancelToken,
}

impl UpsertStore {
    /// Constructs a store backed by a Qdrant sink built from `cfg`, making
    /// sure the target collection exists.
    ///
    /// # Errors
    /// Returns `UpsertError::Config` on invalid configuration and
    /// `UpsertError::Sink` if the client or the collection cannot be set up.
    pub async fn connect(cfg: UpsertConfig) -> Result<Self, UpsertError> {
        trace!("UpsertStore::connect collection={}", cfg.qdrant.collection);
        let sink = QdrantSink::connect(&cfg).await?;
        Ok(Self::with_sink(cfg, Box::new(sink)))
    }

    /// Constructs a store over an arbitrary sink.
    ///
    /// The caller is responsible for any collection provisioning its sink
    /// needs. Vectors default to [`RandomVectors`] and progress to
    /// [`NoopProgress`].
    pub fn with_sink(cfg: UpsertConfig, sink: Box<dyn RemoteSink>) -> Self {
        Self {
            cfg,
            sink,
            vectors: Box::new(RandomVectors::new()),
            progress: Box::new(NoopProgress),
            cancel: CancelToken::new(),
        }
    }

    /// Replaces the vector provider.
    pub fn with_vectors(mut self, vectors: Box<dyn VectorProvider>) -> Self {
        self.vectors = vectors;
        self
    }

    /// Replaces the progress reporter.
    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Returns a token that stops the running job at the next batch boundary
    /// or sleep point.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ingests the given rows against the declared schema.
    ///
    /// # Errors
    /// Returns mapping errors, non-retryable sink errors, or config errors;
    /// rate-limit-skipped batches are reported in the [`JobReport`] instead.
    pub async fn upsert_rows(
        &self,
        schema: &FieldSchema,
        rows: &[Row],
    ) -> Result<JobReport, UpsertError> {
        debug!("UpsertStore::upsert_rows rows={}", rows.len());
        ingest::run_job(
            &self.cfg,
            rows,
            schema,
            self.vectors.as_ref(),
            self.sink.as_ref(),
            self.progress.as_ref(),
            &self.cancel,
        )
        .await
    }

    /// Reads the configured JSONL dataset and ingests it.
    ///
    /// # Errors
    /// Returns errors on I/O, parse, mapping, or non-retryable sink failures.
    pub async fn upsert_file(&self, schema: &FieldSchema) -> Result<JobReport, UpsertError> {
        trace!("UpsertStore::upsert_file path={:?}", self.cfg.dataset_path);
        let rows = io_rows::read_rows(&self.cfg.dataset_path)?;
        self.upsert_rows(schema, &rows).await
    }
}
