//! Qdrant-backed [`RemoteSink`] adapter.
//!
//! Concentrates all `qdrant-client` usage behind the sink trait, hiding the
//! verbose builder pattern and keeping the engine decoupled from the client.
//! Client failures are classified here, at the boundary; the rest of the
//! crate only ever sees tagged [`SinkError`] variants.

use crate::config::{DistanceKind, UpsertConfig};
use crate::errors::{SinkError, UpsertError};
use crate::record::{FieldRecord, FieldValue};
use crate::sink::RemoteSink;

use qdrant_client::{Qdrant, QdrantError};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointId, PointStruct, UpsertPointsBuilder, Value as QValue,
    Vector, VectorParamsBuilder, Vectors, value, vectors,
};
use std::collections::HashMap;
use std::{future::Future, pin::Pin};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Adapter over the Qdrant client.
pub struct QdrantSink {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
}

impl QdrantSink {
    /// Creates the client from the given configuration.
    ///
    /// Uses the builder-based API of `qdrant-client` and supports optional
    /// API key authentication. Does not touch the collection yet; see
    /// [`QdrantSink::connect`].
    pub fn new(cfg: &UpsertConfig) -> Result<Self, UpsertError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant.url);
        if let Some(key) = &cfg.qdrant.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(|e| classify(&e))?;

        Ok(Self {
            client,
            collection: cfg.qdrant.collection.clone(),
            distance: cfg.qdrant.distance,
        })
    }

    /// Creates the client and makes sure the target collection exists.
    pub async fn connect(cfg: &UpsertConfig) -> Result<Self, UpsertError> {
        let sink = Self::new(cfg)?;
        sink.ensure_collection(cfg.vector_dim).await?;
        Ok(sink)
    }

    /// Ensures that the collection exists in Qdrant.
    ///
    /// - If the collection already exists → no-op.
    /// - If missing → creates it with the given dimension and the configured
    ///   distance function.
    pub async fn ensure_collection(&self, dim: usize) -> Result<(), UpsertError> {
        info!(
            "Ensuring collection '{}' with dim={} distance={:?}",
            self.collection, dim, self.distance
        );

        match self.client.collection_info(&self.collection).await {
            Ok(_) => {
                debug!("Collection '{}' already exists", self.collection);
                return Ok(());
            }
            Err(err) => {
                warn!(
                    "Collection '{}' not found, will be created (error={})",
                    self.collection, err
                );
            }
        }

        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dim as u64, distance)),
            )
            .await
            .map_err(|e| classify(&e))?;

        info!("Collection '{}' created", self.collection);
        Ok(())
    }

    /// Builds one Qdrant point: payload from the typed fields, one dense
    /// vector, and a stable id.
    fn point(&self, record: &FieldRecord) -> PointStruct {
        let mut payload: HashMap<String, QValue> = HashMap::new();
        for (name, fv) in &record.fields {
            payload.insert(name.clone(), qvalue(fv));
        }

        let vectors = Vectors {
            vectors_options: Some(vectors::VectorsOptions::Vector(Vector {
                data: record.vector.clone(),
                indices: None,
                vectors_count: None,
                vector: None,
            })),
        };

        PointStruct {
            id: Some(stable_point_id(&self.collection, record)),
            payload,
            vectors: Some(vectors),
            ..Default::default()
        }
    }
}

/// Stable point id: UUIDv5 of the record's own `id` field when present,
/// otherwise of `collection/row_index`. Re-running a job updates points
/// instead of duplicating them.
fn stable_point_id(collection: &str, record: &FieldRecord) -> PointId {
    let seed = match record.fields.get("id") {
        Some(FieldValue::Str(s)) => s.clone(),
        Some(FieldValue::Int(i)) => i.to_string(),
        _ => format!("{collection}/{}", record.row_index),
    };
    Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes())
        .to_string()
        .into()
}

impl RemoteSink for QdrantSink {
    fn upsert<'a>(
        &'a self,
        batch: &'a [FieldRecord],
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>> {
        Box::pin(async move {
            if batch.is_empty() {
                debug!("No records provided for upsert");
                return Ok(());
            }

            let points: Vec<PointStruct> = batch.iter().map(|r| self.point(r)).collect();

            debug!(
                "Upserting {} points into collection '{}'",
                points.len(),
                self.collection
            );

            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
                .await
                .map(|_| ())
                .map_err(|e| classify(&e))
        })
    }
}

/// Wraps a typed field into a Qdrant `Value`.
fn qvalue(v: &FieldValue) -> QValue {
    use value::Kind as K;
    match v {
        FieldValue::Str(s) => QValue {
            kind: Some(K::StringValue(s.clone())),
        },
        FieldValue::Int(i) => QValue {
            kind: Some(K::IntegerValue(*i)),
        },
        FieldValue::Float(f) => QValue {
            kind: Some(K::DoubleValue(*f)),
        },
        FieldValue::Bool(b) => QValue {
            kind: Some(K::BoolValue(*b)),
        },
    }
}

/// Maps a client error onto the engine's classification.
///
/// A throttled status carrying a `retry-after` hint arrives as a dedicated
/// client variant and keeps its hint; everything else is classified off the
/// rendered text.
fn classify(err: &QdrantError) -> SinkError {
    match err {
        QdrantError::ResourceExhaustedError {
            retry_after_seconds, ..
        } => SinkError::RateLimited {
            retry_after_secs: Some(*retry_after_seconds),
        },
        _ => classify_text(&err.to_string()),
    }
}

/// Text classification for errors the client leaves untyped.
///
/// A throttled status renders differently across client and transport
/// versions ("Resource exhausted:", "resource has been exhausted",
/// "ResourceExhausted"), so all known spellings are matched. Everything
/// unrecognized is a plain remote fault.
fn classify_text(msg: &str) -> SinkError {
    let lower = msg.to_lowercase();

    if lower.contains("resource exhausted")
        || lower.contains("resource has been exhausted")
        || lower.contains("resourceexhausted")
        || lower.contains("too many requests")
        || lower.contains("rate limit")
    {
        SinkError::RateLimited {
            retry_after_secs: None,
        }
    } else if lower.contains("unavailable")
        || lower.contains("connection")
        || lower.contains("broken pipe")
        || lower.contains("reset by peer")
        || lower.contains("transport error")
        || lower.contains("dns error")
        || lower.contains("timed out")
        || lower.contains("timeout")
    {
        SinkError::Unavailable(msg.to_string())
    } else {
        SinkError::Remote(msg.to_string())
    }
}
