// ── Export run orchestration ──
//
// sign in → list devices → open report → traverse → close report.
// Sign-in and device listing happen before anything is written, so a
// fatal failure never leaves a half-open report on stdout.

use std::sync::Arc;
use std::time::Duration;

use metricsnap_api::{ApiClient, Credentials, TimeWindow};
use tracing::info;

use crate::config::{DEFAULT_WINDOW, ExportConfig, Schedule};
use crate::error::CoreError;
use crate::report::SampleSink;
use crate::scheduler::{ExportSummary, Walk};
use crate::source::MetricSource;

/// Drives one export from a [`MetricSource`] into a [`SampleSink`].
pub struct Exporter<S, K> {
    source: Arc<S>,
    sink: Arc<K>,
    schedule: Schedule,
    window: Duration,
}

impl<K: SampleSink> Exporter<ApiClient, K> {
    /// Build an exporter backed by the REST API described in `config`.
    pub fn connect(config: &ExportConfig, sink: Arc<K>) -> Result<Self, CoreError> {
        if let Schedule::Bounded(limits) = config.schedule {
            limits
                .validate()
                .map_err(|message| CoreError::Config { message })?;
        }

        let client = ApiClient::new(config.url.as_str(), &config.transport())?
            .with_page_size(config.page_size)
            .with_max_pages(config.max_pages);

        Ok(Self::new(client, sink)
            .with_schedule(config.schedule)
            .with_window(config.window))
    }
}

impl<S: MetricSource, K: SampleSink> Exporter<S, K> {
    pub fn new(source: S, sink: Arc<K>) -> Self {
        Self {
            source: Arc::new(source),
            sink,
            schedule: Schedule::default(),
            window: DEFAULT_WINDOW,
        }
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Export the trailing window ending now.
    pub async fn run(&self, credentials: &Credentials) -> Result<ExportSummary, CoreError> {
        self.run_window(credentials, TimeWindow::ending_now(self.window))
            .await
    }

    /// Export samples within `window`.
    ///
    /// Fails only on sign-in, device listing or report delimiter writes.
    /// Failures further down are counted in the returned summary.
    pub async fn run_window(
        &self,
        credentials: &Credentials,
        window: TimeWindow,
    ) -> Result<ExportSummary, CoreError> {
        let token = self
            .source
            .sign_in(credentials)
            .await
            .map_err(|source| CoreError::Authentication { source })?;

        let devices = self
            .source
            .list_devices(&token)
            .await
            .map_err(|source| CoreError::DeviceListing { source })?;
        info!(
            devices = devices.len(),
            start_ms = window.start_ms,
            end_ms = window.end_ms,
            "exporting samples"
        );

        self.sink.open()?;
        let walk = Arc::new(Walk::new(
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            token,
            window,
            self.schedule,
        ));
        let summary = walk.run(devices).await;
        self.sink.close()?;

        Ok(summary)
    }
}
