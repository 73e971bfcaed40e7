use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque id assigned by the metadata store; the `/qr/{id}` path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Metadata for one generated QR code.
///
/// Records are written once and never updated. `views` is kept for
/// compatibility with existing documents; nothing increments it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRecord {
    pub id: RecordId,
    pub text: String,
    pub image_url: String,
    pub fg_color: String,
    pub bg_color: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
}

/// Creation payload: a record before the store has assigned its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub text: String,
    pub image_url: String,
    pub fg_color: String,
    pub bg_color: String,
    pub timestamp: DateTime<Utc>,
    pub views: u64,
}

impl NewRecord {
    pub fn into_record(self, id: RecordId) -> QrRecord {
        QrRecord {
            id,
            text: self.text,
            image_url: self.image_url,
            fg_color: self.fg_color,
            bg_color: self.bg_color,
            timestamp: self.timestamp,
            views: self.views,
        }
    }
}
