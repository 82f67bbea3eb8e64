// ── Runtime export configuration ──
//
// These types describe *what* to export and *how hard* to hit the API.
// They never touch disk: the binary builds an `ExportConfig` from its
// config file, environment and flags and hands it in.

use std::time::Duration;

use metricsnap_api::{Credentials, TlsMode, TransportConfig};
use url::Url;

use crate::error::Level;
use crate::report::ReportFormat;

/// Default trailing window: five minutes.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(300);

/// Independent concurrency ceilings for each traversal level.
///
/// `objects` applies per device and `indicators` per object, so the
/// worst-case number of in-flight leaf requests is the product of all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanoutLimits {
    pub devices: usize,
    pub objects: usize,
    pub indicators: usize,
}

impl Default for FanoutLimits {
    fn default() -> Self {
        Self {
            devices: 4,
            objects: 8,
            indicators: 10,
        }
    }
}

impl FanoutLimits {
    /// Ceiling on simultaneous leaf requests across the whole run.
    pub fn max_in_flight(&self) -> usize {
        self.devices
            .saturating_mul(self.objects)
            .saturating_mul(self.indicators)
    }

    /// Slots for workers of `level`. Samples are consumed inline by their
    /// indicator worker and never get a level of their own.
    pub fn slots(&self, level: Level) -> usize {
        match level {
            Level::Device => self.devices,
            Level::Object => self.objects,
            Level::Indicator => self.indicators,
            Level::Sample => 1,
        }
    }

    /// Reject zero ceilings, which would never admit a worker.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("devices", self.devices),
            ("objects", self.objects),
            ("indicators", self.indicators),
        ] {
            if value == 0 {
                return Err(format!("concurrency.{name} must be at least 1"));
            }
        }
        Ok(())
    }
}

/// Traversal policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// One request at a time, depth first.
    Sequential,
    /// Bounded fan-out with a semaphore per level.
    Bounded(FanoutLimits),
}

impl Default for Schedule {
    fn default() -> Self {
        Self::Bounded(FanoutLimits::default())
    }
}

impl Schedule {
    /// Slots for workers of `level`, or `None` when children run inline.
    pub fn slots(&self, level: Level) -> Option<usize> {
        match self {
            Self::Sequential => None,
            Self::Bounded(limits) => Some(limits.slots(level)),
        }
    }
}

/// Configuration for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// API base URL, e.g. `https://nms.example.com/api/v2/`.
    pub url: Url,
    pub credentials: Credentials,
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Length of the trailing sample window.
    pub window: Duration,
    pub page_size: u32,
    pub max_pages: u32,
    pub schedule: Schedule,
    pub format: ReportFormat,
}

impl ExportConfig {
    pub fn new(url: Url, credentials: Credentials) -> Self {
        Self {
            url,
            credentials,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            window: DEFAULT_WINDOW,
            page_size: metricsnap_api::client::DEFAULT_PAGE_SIZE,
            max_pages: metricsnap_api::client::DEFAULT_MAX_PAGES,
            schedule: Schedule::default(),
            format: ReportFormat::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}
