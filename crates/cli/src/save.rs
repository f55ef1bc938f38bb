use anyhow::{Context, Result};
use emotion_core::models::NewUsageRecord;
use emotion_core::store::UsageStore;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub name: String,
    pub image_path: PathBuf,
    pub emotion: String,
    pub confidence: f32,
    pub timestamp: Option<String>,
}

/// Stores one prediction together with the raw bytes of the input image.
pub async fn save_result(store: &dyn UsageStore, req: SaveRequest) -> Result<i64> {
    let image = std::fs::read(&req.image_path)
        .with_context(|| format!("read image {}", req.image_path.display()))?;
    let mut record = NewUsageRecord::new(req.name, image, req.emotion, req.confidence);
    if let Some(ts) = req.timestamp {
        record = record.with_timestamp(ts);
    }
    let id = store.insert(record).await.context("save result")?;
    info!(id, backend = %store.backend(), "result saved to database");
    Ok(id)
}
