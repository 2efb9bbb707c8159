//! DTOs for API requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query string of a fetch request.
#[derive(Debug, Deserialize)]
pub struct GetQuery {
    /// Key to look up
    pub key: Option<String>,
}

/// Body of a store request.
///
/// Missing fields take their empty value and are rejected by validation,
/// so a client sees "key is required" rather than a decoder message.
#[derive(Debug, Deserialize)]
pub struct SetRequest {
    /// Key to store under
    #[serde(default)]
    pub key: String,
    /// Arbitrary JSON payload
    #[serde(default)]
    pub value: Value,
    /// Time-to-live as a duration string, e.g. "5s" or "1m30s"
    #[serde(default)]
    pub expiration: String,
}

/// Response for a successful store.
#[derive(Debug, Serialize)]
pub struct SetResponse {
    /// Key that was stored
    pub key: String,
    /// Duration string as supplied
    pub expiration: String,
    /// Parsed TTL in milliseconds
    pub ttl_ms: u64,
}

/// Response for health check.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Wall-clock startup time
    pub started_at: DateTime<Utc>,
}
