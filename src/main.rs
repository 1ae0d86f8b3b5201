use std::error::Error;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use upsert_store::{
    FieldKind, FieldSchema, FieldSpec, IndicatifProgress, UpsertConfig, UpsertStore,
};

/// Column layout of the product catalog dataset.
///
/// `id` is the only required column; payload columns that are absent or null
/// in a source row are omitted from the stored point.
fn product_schema() -> FieldSchema {
    FieldSchema::new(vec![
        FieldSpec::required("id", FieldKind::Int),
        FieldSpec::optional("gender", FieldKind::Str),
        FieldSpec::optional("masterCategory", FieldKind::Str),
        FieldSpec::optional("subCategory", FieldKind::Str),
        FieldSpec::optional("articleType", FieldKind::Str),
        FieldSpec::optional("baseColour", FieldKind::Str),
        FieldSpec::optional("season", FieldKind::Str),
        FieldSpec::optional("year", FieldKind::Int),
        FieldSpec::optional("usage", FieldKind::Str),
        FieldSpec::optional("productDisplayName", FieldKind::Str),
        FieldSpec::optional("image", FieldKind::Str),
    ])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment overrides from a .env file when one is present.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,upsert_store=info"))
        .unwrap();

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cfg = UpsertConfig::from_env()?;
    info!(
        collection = %cfg.qdrant.collection,
        dataset = %cfg.dataset_path.display(),
        batch_size = cfg.job.batch_size,
        vector_dim = cfg.vector_dim,
        "Starting catalog upload"
    );

    let store = UpsertStore::connect(cfg)
        .await?
        .with_progress(Box::new(IndicatifProgress::bar(0)));

    let cancel = store.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, stopping after the current batch");
            cancel.cancel();
        }
    });

    let report = store.upsert_file(&product_schema()).await?;

    if report.is_complete() {
        info!("All data has been uploaded successfully!");
    } else if report.cancelled {
        warn!(
            completed = report.batches_succeeded,
            total = report.total_batches,
            "Upload cancelled before completion"
        );
    } else {
        warn!(
            skipped = report.batches_skipped,
            upserted = report.records_upserted,
            "Upload finished with skipped batches"
        );
    }

    Ok(())
}
