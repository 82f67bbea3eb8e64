// ── Bounded fan-out traversal ──
//
// devices → objects → indicators → samples. Each level admits its
// children through its own semaphore: a permit is taken *before* the
// worker is spawned and released when the worker finishes, so at most
// `slots` siblings under one parent are ever in flight. A parent joins
// all of its children before it returns and gives up its own permit.
//
// Failures below the device level are logged and counted; the subtree
// under the failed fetch is skipped and its siblings carry on.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metricsnap_api::{AuthToken, Device, Indicator, MonitoredObject, TimeWindow};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

use crate::config::Schedule;
use crate::error::{CoreError, Level, ParentIds};
use crate::report::{SampleRecord, SampleSink};
use crate::source::MetricSource;

/// Counts gathered over one export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub devices: u64,
    pub objects: u64,
    pub indicators: u64,
    /// Samples written to the sink.
    pub samples: u64,
    /// Listings that failed and had their subtree skipped.
    pub failed_fetches: u64,
    /// Samples the sink refused.
    pub failed_writes: u64,
    pub panicked_workers: u64,
}

impl ExportSummary {
    /// No fetch, write or worker failed.
    pub fn is_complete(&self) -> bool {
        self.failed_fetches == 0 && self.failed_writes == 0 && self.panicked_workers == 0
    }
}

#[derive(Debug, Default)]
struct Tally {
    devices: AtomicU64,
    objects: AtomicU64,
    indicators: AtomicU64,
    samples: AtomicU64,
    failed_fetches: AtomicU64,
    failed_writes: AtomicU64,
    panicked_workers: AtomicU64,
}

fn bump(counter: &AtomicU64, n: usize) -> u64 {
    counter.fetch_add(u64::try_from(n).unwrap_or(u64::MAX), Ordering::Relaxed)
}

impl Tally {
    fn snapshot(&self) -> ExportSummary {
        ExportSummary {
            devices: self.devices.load(Ordering::Relaxed),
            objects: self.objects.load(Ordering::Relaxed),
            indicators: self.indicators.load(Ordering::Relaxed),
            samples: self.samples.load(Ordering::Relaxed),
            failed_fetches: self.failed_fetches.load(Ordering::Relaxed),
            failed_writes: self.failed_writes.load(Ordering::Relaxed),
            panicked_workers: self.panicked_workers.load(Ordering::Relaxed),
        }
    }
}

/// Shared state of one traversal. Workers hold it through an `Arc`.
pub(crate) struct Walk<S, K> {
    source: Arc<S>,
    sink: Arc<K>,
    token: AuthToken,
    window: TimeWindow,
    schedule: Schedule,
    tally: Tally,
}

impl<S: MetricSource, K: SampleSink> Walk<S, K> {
    pub(crate) fn new(
        source: Arc<S>,
        sink: Arc<K>,
        token: AuthToken,
        window: TimeWindow,
        schedule: Schedule,
    ) -> Self {
        Self {
            source,
            sink,
            token,
            window,
            schedule,
            tally: Tally::default(),
        }
    }

    /// Visit every device and return once the whole tree has been joined.
    pub(crate) async fn run(self: Arc<Self>, devices: Vec<Device>) -> ExportSummary {
        bump(&self.tally.devices, devices.len());

        let walk = Arc::clone(&self);
        let panicked = fan_out(
            self.schedule.slots(Level::Device),
            Level::Device,
            devices,
            move |device| Arc::clone(&walk).visit_device(device),
        )
        .await;
        self.tally
            .panicked_workers
            .fetch_add(panicked, Ordering::Relaxed);

        self.tally.snapshot()
    }

    async fn visit_device(self: Arc<Self>, device: Device) {
        let objects = match self.source.list_objects(&self.token, device.id).await {
            Ok(objects) => objects,
            Err(source) => {
                self.fetch_failed(Level::Object, ParentIds::device(device.id), source);
                return;
            }
        };
        debug!(device = device.id, objects = objects.len(), "listed objects");
        bump(&self.tally.objects, objects.len());

        let device = Arc::new(device);
        let walk = Arc::clone(&self);
        let panicked = fan_out(
            self.schedule.slots(Level::Object),
            Level::Object,
            objects,
            move |object| Arc::clone(&walk).visit_object(Arc::clone(&device), object),
        )
        .await;
        self.tally
            .panicked_workers
            .fetch_add(panicked, Ordering::Relaxed);
    }

    async fn visit_object(self: Arc<Self>, device: Arc<Device>, object: MonitoredObject) {
        let indicators = match self
            .source
            .list_indicators(&self.token, device.id, object.id)
            .await
        {
            Ok(indicators) => indicators,
            Err(source) => {
                self.fetch_failed(
                    Level::Indicator,
                    ParentIds::object(device.id, object.id),
                    source,
                );
                return;
            }
        };
        debug!(
            device = device.id,
            object = object.id,
            indicators = indicators.len(),
            "listed indicators"
        );
        bump(&self.tally.indicators, indicators.len());

        let object = Arc::new(object);
        let walk = Arc::clone(&self);
        let panicked = fan_out(
            self.schedule.slots(Level::Indicator),
            Level::Indicator,
            indicators,
            move |indicator| {
                Arc::clone(&walk).visit_indicator(
                    Arc::clone(&device),
                    Arc::clone(&object),
                    indicator,
                )
            },
        )
        .await;
        self.tally
            .panicked_workers
            .fetch_add(panicked, Ordering::Relaxed);
    }

    async fn visit_indicator(
        self: Arc<Self>,
        device: Arc<Device>,
        object: Arc<MonitoredObject>,
        indicator: Indicator,
    ) {
        let samples = match self
            .source
            .list_samples(&self.token, device.id, object.id, indicator.id, self.window)
            .await
        {
            Ok(samples) => samples,
            Err(source) => {
                self.fetch_failed(
                    Level::Sample,
                    ParentIds::indicator(device.id, object.id, indicator.id),
                    source,
                );
                return;
            }
        };
        trace!(
            device = device.id,
            object = object.id,
            indicator = indicator.id,
            samples = samples.len(),
            "listed samples"
        );

        for sample in &samples {
            let record = SampleRecord {
                device: &device,
                object: &object,
                indicator: &indicator,
                sample,
            };
            match self.sink.emit(&record) {
                Ok(()) => {
                    bump(&self.tally.samples, 1);
                }
                Err(e) => {
                    // Only the first failure is worth a warning; a closed
                    // stdout fails every remaining write the same way.
                    if bump(&self.tally.failed_writes, 1) == 0 {
                        warn!(indicator = indicator.id, "could not write sample: {e}");
                    } else {
                        trace!(indicator = indicator.id, "could not write sample: {e}");
                    }
                }
            }
        }
    }

    fn fetch_failed(&self, level: Level, parents: ParentIds, source: metricsnap_api::Error) {
        bump(&self.tally.failed_fetches, 1);
        let err = CoreError::FetchFailed {
            level,
            parents,
            source,
        };
        warn!("{err}, skipping");
    }
}

/// Run `work` for every item and wait for all of them.
///
/// With `slots == None` items run one after another on the current task.
/// Otherwise each item gets its own spawned worker, admitted only once a
/// semaphore permit is held. Returns the number of workers that panicked.
pub(crate) async fn fan_out<T, F, Fut>(
    slots: Option<usize>,
    level: Level,
    items: Vec<T>,
    mut work: F,
) -> u64
where
    T: Send + 'static,
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = ()> + Send + 'static,
{
    let Some(slots) = slots else {
        for item in items {
            work(item).await;
        }
        return 0;
    };

    let semaphore = Arc::new(Semaphore::new(slots.max(1)));
    let mut workers = JoinSet::new();

    for item in items {
        // The semaphore is never closed, so this only fails if that changes.
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            error!(level = %level, "admission semaphore closed, dropping remaining work");
            break;
        };
        let task = work(item);
        workers.spawn(async move {
            task.await;
            drop(permit);
        });
    }

    let mut panicked = 0;
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                error!(level = %level, "worker panicked: {e}");
                panicked += 1;
            }
        }
    }
    panicked
}
