use anyhow::Result;
use emotion_core::models::UsageRecord;
use emotion_core::store::UsageStore;

pub fn format_entry(record: &UsageRecord) -> String {
    format!(
        "{} – {}: {} ({:.2})",
        record.timestamp, record.name, record.emotion, record.confidence
    )
}

/// Renders the most recent records, newest first.
pub async fn render_history(store: &dyn UsageStore, json: bool) -> Result<String> {
    let rows = store.recent().await?;
    if json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "backend": store.backend(),
            "records": rows,
        }))?);
    }
    if rows.is_empty() {
        return Ok("No records found.".to_string());
    }
    let mut out = vec!["Recent entries".to_string()];
    out.extend(rows.iter().map(format_entry));
    Ok(out.join("\n"))
}
