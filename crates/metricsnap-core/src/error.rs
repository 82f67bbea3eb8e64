// ── Core error types ──
//
// Sign-in and device-listing failures end the run. Everything below the
// device level is a `FetchFailed`: logged, counted, and the subtree skipped.

use std::fmt;

use thiserror::Error;

/// Hierarchy level of the records a fetch was listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Device,
    Object,
    Indicator,
    Sample,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Device => "device",
            Self::Object => "object",
            Self::Indicator => "indicator",
            Self::Sample => "sample",
        })
    }
}

/// Identifiers of the records above a failed fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParentIds {
    pub device: Option<i64>,
    pub object: Option<i64>,
    pub indicator: Option<i64>,
}

impl ParentIds {
    pub fn device(device: i64) -> Self {
        Self {
            device: Some(device),
            ..Self::default()
        }
    }

    pub fn object(device: i64, object: i64) -> Self {
        Self {
            device: Some(device),
            object: Some(object),
            indicator: None,
        }
    }

    pub fn indicator(device: i64, object: i64, indicator: i64) -> Self {
        Self {
            device: Some(device),
            object: Some(object),
            indicator: Some(indicator),
        }
    }
}

impl fmt::Display for ParentIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("device", self.device),
            ("object", self.object),
            ("indicator", self.indicator),
        ]
        .into_iter()
        .filter_map(|(name, id)| id.map(|id| format!("{name}={id}")))
        .collect();

        if parts.is_empty() {
            f.write_str("root")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fatal ────────────────────────────────────────────────────────
    #[error("Authentication failed: {source}")]
    Authentication {
        #[source]
        source: metricsnap_api::Error,
    },

    #[error("Could not list devices: {source}")]
    DeviceListing {
        #[source]
        source: metricsnap_api::Error,
    },

    // ── Local (subtree skipped) ──────────────────────────────────────
    #[error("Failed to list {level}s under {parents}: {source}")]
    FetchFailed {
        level: Level,
        parents: ParentIds,
        #[source]
        source: metricsnap_api::Error,
    },

    // ── Output ───────────────────────────────────────────────────────
    #[error("Report output failed: {0}")]
    Output(#[from] std::io::Error),

    // ── Setup ────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Whether this error ends the run (as opposed to skipping a subtree).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::FetchFailed { .. })
    }
}

// Client construction only fails on bad URLs or TLS material, both of
// which come from configuration.
impl From<metricsnap_api::Error> for CoreError {
    fn from(err: metricsnap_api::Error) -> Self {
        match err {
            metricsnap_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid API URL: {e}"),
            },
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
