//! Runtime configuration: environment-driven knobs for the job and the sink.

use crate::errors::ConfigError;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DistanceKind {
    Cosine,
    Dot,
    Euclid,
}

impl DistanceKind {
    /// Parse from env string (case-insensitive). Defaults to Cosine.
    pub fn from_env(s: Option<String>) -> Self {
        match s
            .unwrap_or_else(|| "Cosine".to_string())
            .to_lowercase()
            .as_str()
        {
            "cosine" => DistanceKind::Cosine,
            "dot" | "dotproduct" => DistanceKind::Dot,
            "euclid" | "l2" => DistanceKind::Euclid,
            _ => DistanceKind::Cosine,
        }
    }
}

/// Qdrant connectivity and collection parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// gRPC URL (e.g., "http://localhost:6334").
    pub url: String,
    /// Optional API key for managed deployments.
    pub api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Vector distance metric (Cosine by default).
    pub distance: DistanceKind,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "product_catalog".to_string(),
            distance: DistanceKind::Cosine,
        }
    }
}

/// Batching, pacing, and retry knobs for one ingestion job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    /// Records per upsert call.
    pub batch_size: usize,
    /// Rate-limited attempts before a batch is abandoned.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles each retry.
    pub initial_delay: Duration,
    /// Fixed pause between consecutive batches.
    pub inter_batch_delay: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_retries: 5,
            initial_delay: Duration::from_secs(2),
            inter_batch_delay: Duration::from_secs(2),
        }
    }
}

/// Top-level runtime configuration for the loader.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpsertConfig {
    /// Qdrant connectivity & collection settings.
    pub qdrant: QdrantConfig,
    /// Batch/retry/pacing settings.
    pub job: JobConfig,
    /// Dimensionality of the generated vectors.
    pub vector_dim: usize,
    /// Input JSONL dataset (one JSON object per line).
    pub dataset_path: PathBuf,
}

impl Default for UpsertConfig {
    fn default() -> Self {
        Self {
            qdrant: QdrantConfig::default(),
            job: JobConfig::default(),
            vector_dim: 512,
            dataset_path: PathBuf::from("data/products.jsonl"),
        }
    }
}

impl UpsertConfig {
    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `QDRANT_URL` (default: "http://localhost:6334")
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default: "product_catalog")
    /// - `QDRANT_DISTANCE` (values: "Cosine" | "Dot" | "Euclid"; default: "Cosine")
    /// - `VECTOR_DIM` (default: 512)
    /// - `UPSERT_BATCH_SIZE` (default: 10)
    /// - `UPSERT_MAX_RETRIES` (default: 5)
    /// - `UPSERT_INITIAL_DELAY_SECS` (default: 2, fractional allowed)
    /// - `UPSERT_BATCH_PAUSE_SECS` (default: 2, fractional allowed)
    /// - `DATASET_PATH` (default: "data/products.jsonl")
    ///
    /// Unset variables fall back to defaults; a set but malformed value is an
    /// error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        let qdrant = QdrantConfig {
            url: std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".into()),
            api_key: std::env::var("QDRANT_API_KEY").ok(),
            collection: std::env::var("QDRANT_COLLECTION")
                .unwrap_or_else(|_| "product_catalog".into()),
            distance: DistanceKind::from_env(std::env::var("QDRANT_DISTANCE").ok()),
        };

        let job = JobConfig {
            batch_size: read_usize_env("UPSERT_BATCH_SIZE")?.unwrap_or(10),
            max_retries: read_u32_env("UPSERT_MAX_RETRIES")?.unwrap_or(5),
            initial_delay: read_secs_env("UPSERT_INITIAL_DELAY_SECS")?
                .unwrap_or_else(|| Duration::from_secs(2)),
            inter_batch_delay: read_secs_env("UPSERT_BATCH_PAUSE_SECS")?
                .unwrap_or_else(|| Duration::from_secs(2)),
        };

        let cfg = Self {
            qdrant,
            job,
            vector_dim: read_usize_env("VECTOR_DIM")?.unwrap_or(512),
            dataset_path: std::env::var("DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/products.jsonl")),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values before a job starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qdrant.url.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("qdrant url is empty".into()));
        }
        if self.qdrant.collection.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("collection is empty".into()));
        }
        if self.job.batch_size == 0 {
            return Err(ConfigError::InvalidConfig("batch_size must be > 0".into()));
        }
        if self.vector_dim == 0 {
            return Err(ConfigError::InvalidConfig("vector_dim must be > 0".into()));
        }
        Ok(())
    }
}

/// Read an optional `usize` from env; unset → `None`, malformed → error.
fn read_usize_env(key: &str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConfigError::EnvParse {
                key: key.into(),
                value: v,
            }),
        Err(_) => Ok(None),
    }
}

/// Read an optional `u32` from env; unset → `None`, malformed → error.
fn read_u32_env(key: &str) -> Result<Option<u32>, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::EnvParse {
                key: key.into(),
                value: v,
            }),
        Err(_) => Ok(None),
    }
}

/// Read an optional duration given in (possibly fractional) seconds.
fn read_secs_env(key: &str) -> Result<Option<Duration>, ConfigError> {
    match std::env::var(key) {
        Ok(v) => parse_secs(key, &v).map(Some),
        Err(_) => Ok(None),
    }
}

/// Parse a seconds value; negatives, NaN, and values `Duration` cannot
/// hold are all reported as parse errors.
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ConfigError::EnvParse {
            key: key.into(),
            value: value.into(),
        })
}
