//! End-to-end tests for the ingestion scheduler over scripted in-memory sinks.
//!
//! Timing assertions run on tokio's paused clock, so every sleep the engine
//! takes is observable and exact.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::{future::Future, pin::Pin};

use upsert_store::{
    FieldKind, FieldRecord, FieldSchema, FieldSpec, JobConfig, RandomVectors, RemoteSink, Row,
    SinkError, UpsertConfig, UpsertError, UpsertStore,
};

/// Records every upsert call (batch start index + size) and fails on a
/// per-call script: call *n* returns `failures[n]`, anything past the end of
/// the script succeeds.
#[derive(Default)]
struct ScriptedSink {
    calls: AtomicUsize,
    batches: Mutex<Vec<(usize, usize)>>,
    failures: Vec<SinkError>,
}

impl ScriptedSink {
    fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing_with(failures: Vec<SinkError>) -> Arc<Self> {
        Arc::new(Self {
            failures,
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn batches(&self) -> Vec<(usize, usize)> {
        self.batches.lock().unwrap().clone()
    }
}

impl RemoteSink for ScriptedSink {
    fn upsert<'a>(
        &'a self,
        batch: &'a [FieldRecord],
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let start = batch.first().map(|r| r.row_index).unwrap_or(0);
            self.batches.lock().unwrap().push((start, batch.len()));

            match self.failures.get(n) {
                Some(SinkError::RateLimited { retry_after_secs }) => Err(SinkError::RateLimited {
                    retry_after_secs: *retry_after_secs,
                }),
                Some(SinkError::Unavailable(msg)) => Err(SinkError::Unavailable(msg.clone())),
                Some(SinkError::Remote(msg)) => Err(SinkError::Remote(msg.clone())),
                None => Ok(()),
            }
        })
    }
}

/// Lets a test keep a handle on the sink after the store consumed it.
struct SharedSink(Arc<ScriptedSink>);

impl RemoteSink for SharedSink {
    fn upsert<'a>(
        &'a self,
        batch: &'a [FieldRecord],
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>> {
        self.0.upsert(batch)
    }
}

fn rate_limit() -> SinkError {
    SinkError::RateLimited {
        retry_after_secs: None,
    }
}

fn rate_limits(n: usize) -> Vec<SinkError> {
    (0..n).map(|_| rate_limit()).collect()
}

fn product_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            serde_json::from_value(serde_json::json!({
                "id": i,
                "productDisplayName": format!("Item {i}"),
                "year": 2017,
            }))
            .unwrap()
        })
        .collect()
}

fn product_schema() -> FieldSchema {
    FieldSchema::new(vec![
        FieldSpec::required("id", FieldKind::Int),
        FieldSpec::optional("productDisplayName", FieldKind::Str),
        FieldSpec::optional("year", FieldKind::Int),
    ])
}

fn test_config(batch_size: usize, pause_ms: u64, initial_delay_ms: u64) -> UpsertConfig {
    UpsertConfig {
        job: JobConfig {
            batch_size,
            max_retries: 5,
            initial_delay: Duration::from_millis(initial_delay_ms),
            inter_batch_delay: Duration::from_millis(pause_ms),
        },
        vector_dim: 8,
        ..UpsertConfig::default()
    }
}

fn store_over(sink: Arc<ScriptedSink>, cfg: UpsertConfig) -> UpsertStore {
    UpsertStore::with_sink(cfg, Box::new(SharedSink(sink)))
        .with_vectors(Box::new(RandomVectors::seeded(99)))
}

// ==================== Batch sequencing & pacing tests ====================

#[tokio::test(start_paused = true)]
async fn test_twenty_five_records_flow_as_three_paced_batches() {
    let sink = ScriptedSink::accepting();
    let store = store_over(sink.clone(), test_config(10, 2_000, 100));

    let start = tokio::time::Instant::now();
    let report = store
        .upsert_rows(&product_schema(), &product_rows(25))
        .await
        .unwrap();

    assert_eq!(sink.batches(), vec![(0, 10), (10, 10), (20, 5)]);
    assert_eq!(report.total_batches, 3);
    assert_eq!(report.batches_succeeded, 3);
    assert_eq!(report.batches_skipped, 0);
    assert_eq!(report.records_upserted, 25);
    assert!(report.is_complete());

    // One pause after batch 1 and batch 2, none after the last batch.
    assert_eq!(start.elapsed(), Duration::from_millis(4_000));
}

#[tokio::test(start_paused = true)]
async fn test_exact_multiple_still_skips_the_final_pause() {
    let sink = ScriptedSink::accepting();
    let store = store_over(sink.clone(), test_config(10, 1_000, 100));

    let start = tokio::time::Instant::now();
    let report = store
        .upsert_rows(&product_schema(), &product_rows(20))
        .await
        .unwrap();

    assert_eq!(sink.calls(), 2);
    assert_eq!(report.records_upserted, 20);
    assert_eq!(start.elapsed(), Duration::from_millis(1_000));
}

#[tokio::test]
async fn test_empty_input_never_touches_the_sink() {
    let sink = ScriptedSink::accepting();
    let store = store_over(sink.clone(), test_config(10, 1_000, 100));

    let report = store.upsert_rows(&product_schema(), &[]).await.unwrap();

    assert_eq!(sink.calls(), 0);
    assert_eq!(report.total_batches, 0);
    assert!(report.is_complete());
}

// ==================== Rate-limit recovery tests ====================

#[tokio::test(start_paused = true)]
async fn test_transient_rate_limits_retry_with_doubling_backoff() {
    // First two calls throttled, third goes through.
    let sink = ScriptedSink::failing_with(rate_limits(2));
    let store = store_over(sink.clone(), test_config(10, 1_000, 100));

    let start = tokio::time::Instant::now();
    let report = store
        .upsert_rows(&product_schema(), &product_rows(5))
        .await
        .unwrap();

    assert_eq!(sink.calls(), 3);
    assert_eq!(report.batches_succeeded, 1);
    assert_eq!(report.records_upserted, 5);
    // Single batch, so the elapsed time is backoff only: 100ms + 200ms.
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_batch_is_skipped_and_the_job_continues() {
    // Batch 1 is throttled on all five attempts; batch 2 succeeds.
    let sink = ScriptedSink::failing_with(rate_limits(5));
    let store = store_over(sink.clone(), test_config(10, 1_000, 100));

    let report = store
        .upsert_rows(&product_schema(), &product_rows(15))
        .await
        .unwrap();

    // Five attempts for batch 1, then a single call for batch 2.
    assert_eq!(sink.calls(), 6);
    assert_eq!(sink.batches().last(), Some(&(10, 5)));
    assert_eq!(report.batches_skipped, 1);
    assert_eq!(report.batches_succeeded, 1);
    assert_eq!(report.records_upserted, 5);
    assert!(!report.is_complete());
}

// ==================== Fatal error tests ====================

#[tokio::test]
async fn test_non_retryable_error_aborts_the_job_unchanged() {
    let sink = ScriptedSink::failing_with(vec![
        rate_limit(),
        SinkError::Remote("wrong vector size".into()),
    ]);
    let store = store_over(sink.clone(), test_config(10, 1, 1));

    let err = store
        .upsert_rows(&product_schema(), &product_rows(30))
        .await
        .unwrap_err();

    // One throttled attempt, then the fatal one; batches 2 and 3 never run.
    assert_eq!(sink.calls(), 2);
    assert!(matches!(
        err,
        UpsertError::Sink(SinkError::Remote(msg)) if msg == "wrong vector size"
    ));
}

#[tokio::test]
async fn test_unavailable_sink_is_fatal_not_retried() {
    let sink =
        ScriptedSink::failing_with(vec![SinkError::Unavailable("connection refused".into())]);
    let store = store_over(sink.clone(), test_config(10, 1, 1));

    let err = store
        .upsert_rows(&product_schema(), &product_rows(5))
        .await
        .unwrap_err();

    assert_eq!(sink.calls(), 1);
    assert!(matches!(err, UpsertError::Sink(SinkError::Unavailable(_))));
}

#[tokio::test]
async fn test_mapping_failure_aborts_before_the_sink_sees_anything() {
    let sink = ScriptedSink::accepting();
    let store = store_over(sink.clone(), test_config(10, 1, 1));

    let rows: Vec<Row> =
        vec![serde_json::from_value(serde_json::json!({ "productDisplayName": "no id" })).unwrap()];
    let err = store
        .upsert_rows(&product_schema(), &rows)
        .await
        .unwrap_err();

    assert_eq!(sink.calls(), 0);
    assert!(matches!(err, UpsertError::Map(_)));
}

// ==================== Cancellation tests ====================

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_between_batches() {
    let sink = ScriptedSink::accepting();
    let store = store_over(sink.clone(), test_config(10, 10_000, 100));

    // Fires during the first inter-batch pause.
    let cancel = store.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    let report = store
        .upsert_rows(&product_schema(), &product_rows(30))
        .await
        .unwrap();

    assert_eq!(sink.calls(), 1);
    assert_eq!(report.batches_succeeded, 1);
    assert_eq!(report.records_upserted, 10);
    assert!(report.cancelled);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_pre_cancelled_job_does_no_work() {
    let sink = ScriptedSink::accepting();
    let store = store_over(sink.clone(), test_config(10, 1_000, 100));

    store.cancel_token().cancel();
    let report = store
        .upsert_rows(&product_schema(), &product_rows(30))
        .await
        .unwrap();

    assert_eq!(sink.calls(), 0);
    assert_eq!(report.batches_succeeded, 0);
    assert!(report.cancelled);
}
