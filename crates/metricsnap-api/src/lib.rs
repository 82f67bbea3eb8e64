// metricsnap-api: Async Rust client for the monitoring platform REST API (v2)
//
// Sign-in plus the four hierarchy listings (devices, objects, indicators,
// indicator data). Everything else lives in `metricsnap-core`.

pub mod auth;
pub mod client;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod transport;

pub use auth::{AuthToken, Credentials};
pub use client::ApiClient;
pub use error::Error;
pub use models::{Device, Indicator, MonitoredObject, Page, Sample, TimeWindow};
pub use transport::{TlsMode, TransportConfig};
