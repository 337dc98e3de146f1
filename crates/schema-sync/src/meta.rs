//! Cache entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caching validators from a successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    /// HTTP ETag header (sent back as If-None-Match)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// HTTP Last-Modified header (sent back as If-Modified-Since)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl Validator {
    pub fn etag(etag: impl Into<String>) -> Self {
        Self {
            etag: Some(etag.into()),
            last_modified: None,
        }
    }

    pub fn last_modified(last_modified: impl Into<String>) -> Self {
        Self {
            etag: None,
            last_modified: Some(last_modified.into()),
        }
    }

    /// True when neither validator is present, so no conditional request is possible.
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// One cached schema.
///
/// Persisted as a single JSON document so validators and payload are always
/// replaced together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Declared source URL (without the bundle parameter)
    pub url: String,
    /// When the payload was fetched
    pub fetched_at: DateTime<Utc>,
    #[serde(flatten)]
    pub validator: Validator,
    /// The bundled schema document
    #[serde(rename = "schema")]
    pub payload: Value,
}

impl CacheEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(url: String, validator: Validator, payload: Value) -> Self {
        Self {
            url,
            fetched_at: Utc::now(),
            validator,
            payload,
        }
    }
}
