// ── Report output ──
//
// One line per sample, bracketed by `{` and `}`. Workers call `emit`
// concurrently; each line is rendered first and written whole while the
// writer lock is held, so lines never interleave mid-line.

use std::io::{self, Write};
use std::sync::Mutex;

use metricsnap_api::{Device, Indicator, MonitoredObject, Sample};

/// A sample together with the records it was found under.
#[derive(Debug, Clone, Copy)]
pub struct SampleRecord<'a> {
    pub device: &'a Device,
    pub object: &'a MonitoredObject,
    pub indicator: &'a Indicator,
    pub sample: &'a Sample,
}

/// Terminal callback of the traversal, invoked once per sample.
///
/// `open` runs before the first worker starts and `close` after the last
/// one has been joined.
pub trait SampleSink: Send + Sync + 'static {
    fn open(&self) -> io::Result<()> {
        Ok(())
    }

    fn emit(&self, record: &SampleRecord<'_>) -> io::Result<()>;

    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Line layout of the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// `  "<indicator>|ST[device:<device>,object:<object>": "<value>",`
    #[default]
    Keyed,
    /// `<device>.<object>.<indicator>: <value>`
    Dotted,
}

impl ReportFormat {
    /// Render one report line (no trailing newline).
    ///
    /// Values always carry six decimals: `42` renders as `42.000000`.
    pub fn render(self, record: &SampleRecord<'_>) -> String {
        let SampleRecord {
            device,
            object,
            indicator,
            sample,
        } = record;
        match self {
            Self::Keyed => format!(
                "  \"{}|ST[device:{},object:{}\": \"{:.6}\",",
                indicator.name, device.name, object.name, sample.value
            ),
            Self::Dotted => format!(
                "{}.{}.{}: {:.6}",
                device.name, object.name, indicator.name, sample.value
            ),
        }
    }
}

/// Writes the report to any `Write` target (stdout in production).
#[derive(Debug)]
pub struct Reporter<W> {
    out: Mutex<W>,
    format: ReportFormat,
}

impl Reporter<io::Stdout> {
    pub fn stdout(format: ReportFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self {
            out: Mutex::new(out),
            format,
        }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("report writer lock poisoned"))?;
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")
    }
}

impl<W: Write + Send + 'static> SampleSink for Reporter<W> {
    fn open(&self) -> io::Result<()> {
        self.write_line("{")
    }

    fn emit(&self, record: &SampleRecord<'_>) -> io::Result<()> {
        self.write_line(&self.format.render(record))
    }

    fn close(&self) -> io::Result<()> {
        self.write_line("}")?;
        self.out
            .lock()
            .map_err(|_| io::Error::other("report writer lock poisoned"))?
            .flush()
    }
}
