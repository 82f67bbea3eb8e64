//! Traversal and reporting engine for metricsnap.
//!
//! Signs in to the monitoring platform, walks devices → objects →
//! indicators → samples with bounded concurrency at each level and writes
//! one report line per sample to a [`SampleSink`].
//!
//! ```text
//! Exporter ──▶ MetricSource (ApiClient)
//!    │
//!    └──▶ Walk ──▶ fan_out per level ──▶ SampleSink (Reporter<Stdout>)
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod report;
pub mod scheduler;
pub mod source;

pub use config::{DEFAULT_WINDOW, ExportConfig, FanoutLimits, Schedule};
pub use error::{CoreError, Level, ParentIds};
pub use export::Exporter;
pub use report::{ReportFormat, Reporter, SampleRecord, SampleSink};
pub use scheduler::ExportSummary;
pub use source::MetricSource;

// Re-exported so callers need only this crate for the common types.
pub use metricsnap_api::{
    AuthToken, Credentials, Device, Indicator, MonitoredObject, Sample, TimeWindow, TlsMode,
};
