//! Progress reporting for ingestion jobs.
//!
//! Use `NoopProgress` for headless runs (default) and `IndicatifProgress`
//! for CLI/TTY.

use crate::retry::BatchOutcome;

use indicatif::{ProgressBar, ProgressStyle};

/// One finished batch, as reported to progress observers.
#[derive(Clone, Copy, Debug)]
pub struct BatchEvent {
    /// Zero-based batch number.
    pub batch_index: usize,
    /// Total number of batches in the job.
    pub total_batches: usize,
    /// First source row covered (inclusive).
    pub first_record: usize,
    /// One past the last source row covered.
    pub end_record: usize,
    /// Terminal outcome of the batch.
    pub outcome: BatchOutcome,
}

/// Minimal progress interface used inside the ingestion loop.
pub trait Progress: Send + Sync {
    /// Set known total batches (optional).
    fn set_total(&self, _n: u64) {}
    /// Report one finished batch.
    fn batch_done(&self, _event: &BatchEvent) {}
    /// Finish the UI.
    fn finish(&self, _msg: &str) {}
}

/// No-op reporter for servers/headless runs.
#[derive(Default, Clone, Copy)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Indicatif-based bar for interactive runs.
pub struct IndicatifProgress {
    pb: ProgressBar,
}

impl IndicatifProgress {
    /// Bounded bar; the length is adjusted once the job knows its batch count.
    pub fn bar(len: u64) -> Self {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}/{len:3} {msg}").unwrap(),
        );
        Self { pb }
    }
}

impl Progress for IndicatifProgress {
    fn set_total(&self, n: u64) {
        self.pb.set_length(n);
    }

    fn batch_done(&self, event: &BatchEvent) {
        self.pb.inc(1);
        let label = match event.outcome {
            BatchOutcome::Success => "ok",
            BatchOutcome::Skipped { .. } => "skipped",
        };
        self.pb.set_message(format!(
            "batch {}/{} records {}..{} {}",
            event.batch_index + 1,
            event.total_batches,
            event.first_record + 1,
            event.end_record,
            label
        ));
    }

    fn finish(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}
