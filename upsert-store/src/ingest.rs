//! End-to-end ingestion: plan batches → map rows → submit with retry → pace.
//!
//! Batches are strictly sequential; batch *i+1* never starts before batch *i*
//! reached `Success` or `Skipped`. The fixed pause between batches is a
//! deliberate non-adaptive throttle against a remote rate limiter, applied
//! after every batch except the last, whatever its outcome.

use crate::batch::plan_batches;
use crate::cancel::CancelToken;
use crate::config::UpsertConfig;
use crate::errors::UpsertError;
use crate::mappers::map_row;
use crate::progress::{BatchEvent, Progress};
use crate::record::{FieldRecord, Row};
use crate::retry::{BatchOutcome, RetryPolicy, submit_with_retry};
use crate::schema::FieldSchema;
use crate::sink::RemoteSink;
use crate::vectors::VectorProvider;

use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Aggregated outcome of one completed (or cancelled) job.
#[derive(Clone, Debug, Default, Serialize)]
pub struct JobReport {
    /// Records acknowledged by the sink.
    pub records_upserted: usize,
    /// Batches that reached the sink successfully.
    pub batches_succeeded: usize,
    /// Batches abandoned after exhausting rate-limit retries.
    pub batches_skipped: usize,
    /// Total planned batches.
    pub total_batches: usize,
    /// Wall-clock duration of the whole job.
    pub duration_ms: u64,
    /// True when the job was stopped by its cancel token.
    pub cancelled: bool,
}

impl JobReport {
    /// True when every planned batch went through.
    ///
    /// Callers that cannot tolerate partial data should treat anything else
    /// as a failure even though the job itself returned `Ok`.
    pub fn is_complete(&self) -> bool {
        !self.cancelled
            && self.batches_skipped == 0
            && self.batches_succeeded == self.total_batches
    }
}

/// Runs one ingestion job over in-memory rows.
///
/// For each batch in source order: map the rows to typed records (attaching a
/// freshly generated vector to each), submit through the retry executor,
/// account the outcome, report progress, then pause before the next batch.
///
/// Rate-limit exhaustion skips the batch and keeps going; every other error
/// aborts immediately and surfaces unchanged. The progress reporter is
/// finished on every exit, aborts included.
pub async fn run_job(
    cfg: &UpsertConfig,
    rows: &[Row],
    schema: &FieldSchema,
    vectors: &dyn VectorProvider,
    sink: &dyn RemoteSink,
    progress: &dyn Progress,
    cancel: &CancelToken,
) -> Result<JobReport, UpsertError> {
    let started = Instant::now();
    let mut report = JobReport::default();

    // The batch loop runs in its own scope so that `progress.finish` is
    // reached on every exit, aborts included; its error is propagated after.
    let driven: Result<(), UpsertError> = async {
        cfg.validate()?;

        let spans = plan_batches(rows.len(), cfg.job.batch_size)?;
        let total_batches = spans.len();
        report.total_batches = total_batches;

        if spans.is_empty() {
            debug!("No records to ingest");
            return Ok(());
        }

        info!(
            records = rows.len(),
            batches = total_batches,
            batch_size = cfg.job.batch_size,
            "Starting ingestion job"
        );
        progress.set_total(total_batches as u64);

        let policy = RetryPolicy {
            max_retries: cfg.job.max_retries,
            initial_delay: cfg.job.initial_delay,
        };

        for span in &spans {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let batch = build_batch(
                &rows[span.start..span.end],
                schema,
                vectors,
                cfg.vector_dim,
                span.start,
            )
            .await?;

            let outcome = submit_with_retry(sink, &batch, &policy, cancel).await?;
            match outcome {
                BatchOutcome::Success => {
                    report.batches_succeeded += 1;
                    report.records_upserted += batch.len();
                    info!(
                        "Batch {}/{} completed. Records {} to {} processed.",
                        span.index + 1,
                        total_batches,
                        span.start + 1,
                        span.end
                    );
                }
                BatchOutcome::Skipped { attempts } => {
                    report.batches_skipped += 1;
                    warn!(
                        "Failed to process batch {} after {} attempts. Continuing with next batch.",
                        span.index + 1,
                        attempts
                    );
                }
            }

            progress.batch_done(&BatchEvent {
                batch_index: span.index,
                total_batches,
                first_record: span.start,
                end_record: span.end,
                outcome,
            });

            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if span.index + 1 < total_batches {
                debug!("Waiting {:?} before next batch", cfg.job.inter_batch_delay);
                if !cancel.sleep(cfg.job.inter_batch_delay).await {
                    report.cancelled = true;
                    break;
                }
            }
        }

        Ok(())
    }
    .await;

    report.duration_ms = started.elapsed().as_millis() as u64;
    progress.finish(match &driven {
        Err(_) => "Ingestion failed",
        Ok(()) if report.cancelled => "Ingestion cancelled",
        Ok(()) => "Ingestion complete",
    });
    driven?;

    info!(
        upserted = report.records_upserted,
        succeeded = report.batches_succeeded,
        skipped = report.batches_skipped,
        total = report.total_batches,
        duration_ms = report.duration_ms,
        cancelled = report.cancelled,
        "Ingestion job finished"
    );

    Ok(report)
}

/// Materializes the typed records for one span, attaching fresh vectors.
async fn build_batch(
    rows: &[Row],
    schema: &FieldSchema,
    vectors: &dyn VectorProvider,
    dim: usize,
    first_index: usize,
) -> Result<Vec<FieldRecord>, UpsertError> {
    let mut out = Vec::with_capacity(rows.len());
    for (offset, row) in rows.iter().enumerate() {
        let vector = vectors.generate(dim).await?;
        let record = map_row(row, schema, vector, dim, first_index + offset)?;
        out.push(record);
    }
    Ok(out)
}
