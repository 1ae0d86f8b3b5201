//! Placeholder embedding vectors.

use crate::errors::UpsertError;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::{future::Future, pin::Pin};

/// Provider interface for embedding vectors.
///
/// Async because real providers perform HTTP requests; the stock random
/// generator resolves immediately.
pub trait VectorProvider: Send + Sync {
    /// Produces a vector of exactly `dim` components.
    fn generate<'a>(
        &'a self,
        dim: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, UpsertError>> + Send + 'a>>;
}

/// Uniform random vectors with components in `[-0.5, 0.5)`.
///
/// Good enough to exercise a collection end to end before a real embedding
/// backend is wired in; the engine depends only on the length invariant,
/// never on the distribution.
pub struct RandomVectors {
    rng: Option<Mutex<StdRng>>,
}

impl RandomVectors {
    /// Thread-local entropy; every run differs.
    pub fn new() -> Self {
        Self { rng: None }
    }

    /// Deterministic stream for reproducible runs and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for RandomVectors {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorProvider for RandomVectors {
    fn generate<'a>(
        &'a self,
        dim: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, UpsertError>> + Send + 'a>> {
        Box::pin(async move {
            let v: Vec<f32> = match &self.rng {
                Some(m) => {
                    let mut rng = m.lock().unwrap_or_else(|p| p.into_inner());
                    (0..dim).map(|_| rng.gen_range(-0.5f32..0.5)).collect()
                }
                None => {
                    let mut rng = rand::thread_rng();
                    (0..dim).map(|_| rng.gen_range(-0.5f32..0.5)).collect()
                }
            };
            Ok(v)
        })
    }
}
