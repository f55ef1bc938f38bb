use serde::{Deserialize, Serialize};

/// One saved prediction, as stored in the `usage` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageRecord {
    pub id: i64,
    pub name: String,
    pub timestamp: String,
    #[serde(skip_serializing, default)]
    pub image: Vec<u8>,
    pub emotion: String,
    pub confidence: f32,
}

/// A record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUsageRecord {
    pub name: String,
    pub timestamp: String,
    pub image: Vec<u8>,
    pub emotion: String,
    pub confidence: f32,
}

impl NewUsageRecord {
    /// Stamps the record with the current UTC time.
    pub fn new(
        name: impl Into<String>,
        image: Vec<u8>,
        emotion: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            name: name.into(),
            timestamp: now_timestamp(),
            image,
            emotion: emotion.into(),
            confidence,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.emotion.trim().is_empty() {
            return Err("emotion must not be empty".into());
        }
        if self.timestamp.trim().is_empty() {
            return Err("timestamp must not be empty".into());
        }
        if !self.confidence.is_finite() {
            return Err(format!("confidence must be finite, got {}", self.confidence));
        }
        Ok(())
    }
}

impl From<UsageRecord> for NewUsageRecord {
    fn from(r: UsageRecord) -> Self {
        Self {
            name: r.name,
            timestamp: r.timestamp,
            image: r.image,
            emotion: r.emotion,
            confidence: r.confidence,
        }
    }
}

pub fn now_timestamp() -> String {
    format_timestamp(chrono::Utc::now().naive_utc())
}

/// Naive ISO-8601, e.g. `2024-05-01T12:30:45.123456`. The fraction is left
/// out when the microseconds are zero.
pub fn format_timestamp(at: chrono::NaiveDateTime) -> String {
    use chrono::Timelike;
    if at.nanosecond() / 1_000 == 0 {
        at.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
