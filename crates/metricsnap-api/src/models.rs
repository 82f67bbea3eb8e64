// API response types
//
// Listing endpoints wrap their records in the `Page<T>` envelope; the data
// endpoint returns a bare array of `Sample`. Platform fields this tool does
// not consume are kept in `extra` so nothing is lost on decode.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Page envelope ────────────────────────────────────────────────────

/// Paged listing envelope.
///
/// ```json
/// { "totalElements": 1, "content": [...], "pageNumber": 0, "pageSize": 10000, "totalPages": 1 }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

// ── Device ───────────────────────────────────────────────────────────

/// A monitored device, root of the traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alternate_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Catch-all for platform metadata (poll frequency, plugin info, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Object ───────────────────────────────────────────────────────────

/// A monitored sub-component of a device (interface, probe, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredObject {
    pub id: i64,
    #[serde(default)]
    pub device_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Indicator ────────────────────────────────────────────────────────

/// A named metric series attached to an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub id: i64,
    #[serde(default)]
    pub device_id: i64,
    #[serde(default)]
    pub object_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data_units: Option<String>,
    #[serde(default)]
    pub display_units: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Sample ───────────────────────────────────────────────────────────

/// One timestamped observation from the `data` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    /// Milliseconds since the Unix epoch, zero when the platform omits it.
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub focus: i64,
}

// ── Time window ──────────────────────────────────────────────────────

/// Query window for the `data` endpoint, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    /// Window of length `span` ending at `end_ms`.
    pub fn trailing(end_ms: i64, span: Duration) -> Self {
        let span_ms = i64::try_from(span.as_millis()).unwrap_or(i64::MAX);
        Self {
            start_ms: end_ms.saturating_sub(span_ms),
            end_ms,
        }
    }

    /// Window of length `span` ending at the current second.
    pub fn ending_now(span: Duration) -> Self {
        let end_ms = chrono::Utc::now().timestamp().saturating_mul(1000);
        Self::trailing(end_ms, span)
    }
}
