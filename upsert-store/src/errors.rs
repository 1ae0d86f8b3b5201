//! Crate-wide error hierarchy for the upsert engine.
//!
//! Goals:
//! - Single root `UpsertError` for all public functions.
//! - Sink failures classified into explicit variants (rate limit vs the rest),
//!   so callers and the retry layer never inspect message text.
//! - Ergonomic `?` via `From` impls generated by `thiserror`.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type UpsertResult<T> = Result<T, UpsertError>;

/// Root error type for the upsert-store crate.
#[derive(Debug, Error)]
pub enum UpsertError {
    /// Remote sink failure that escaped the retry layer.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Row-to-record mapping failure.
    #[error(transparent)]
    Map(#[from] MapError),

    /// Configuration problems (bad env values, invalid batch size, etc.).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O or filesystem errors while reading the dataset.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed dataset row.
    #[error("parse error at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Classified failure returned by a remote sink.
///
/// `RateLimited` is the only transient class; the retry executor keys off the
/// variant alone. Everything else aborts the running job unchanged.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Remote end is throttling the caller.
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Transport-level failure (connection refused/reset, DNS, timeout).
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// Any other remote failure (bad request, schema mismatch, server fault).
    #[error("sink error: {0}")]
    Remote(String),
}

impl SinkError {
    /// True only for the transient rate-limit class.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SinkError::RateLimited { .. })
    }
}

/// Row-to-FieldRecord mapping errors.
///
/// These indicate a data/schema mismatch, never a transient condition, so the
/// scheduler treats them as fatal for the whole job.
#[derive(Debug, Error)]
pub enum MapError {
    /// A required column is absent or null in the source row.
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    /// A value could not be coerced to the declared column type.
    #[error("column '{column}': cannot coerce {value} to {expected}")]
    Coercion {
        column: String,
        expected: &'static str,
        value: String,
    },

    /// Generated vector length does not match the configured dimension.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSize { got: usize, want: usize },
}

/// Configuration and environment errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse an environment variable into the expected type.
    #[error("failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: String, value: String },

    /// Configuration combination is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
