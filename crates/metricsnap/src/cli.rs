//! Clap derive structures for the `metricsnap` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use metricsnap_core::ReportFormat;

/// metricsnap -- snapshot monitoring samples into a flat report
#[derive(Debug, Parser)]
#[command(
    name = "metricsnap",
    version,
    about = "Export a trailing window of monitoring samples as a flat report",
    long_about = "Signs in to the monitoring platform REST API, walks every device,\n\
        monitored object and indicator, and prints the monitoring samples observed\n\
        in the trailing window, one line each. Diagnostics go to stderr, the report to stdout."
)]
pub struct Cli {
    /// Config file [default: platform config dir]/config.toml
    #[arg(long, env = "METRICSNAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// API base URL, e.g. https://nms.example.com/api/v2/
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// Sign-in name
    #[arg(long)]
    pub username: Option<String>,

    /// Traverse one request at a time instead of fanning out
    #[arg(long)]
    pub sequential: bool,

    /// Report line format [default: keyed, or dotted with --sequential]
    #[arg(long, short = 'f')]
    pub format: Option<FormatArg>,

    /// Trailing window length, e.g. 5m or 90s
    #[arg(long, short = 'w', value_parser = humantime::parse_duration)]
    pub window: Option<Duration>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k')]
    pub insecure: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// `  "<indicator>|ST[device:<d>,object:<o>": "<value>",`
    Keyed,
    /// `<device>.<object>.<indicator>: <value>`
    Dotted,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Keyed => Self::Keyed,
            FormatArg::Dotted => Self::Dotted,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn window_accepts_humantime() {
        let cli = Cli::try_parse_from(["metricsnap", "--window", "90s", "--sequential"]).unwrap();
        assert_eq!(cli.window, Some(Duration::from_secs(90)));
        assert!(cli.sequential);
    }
}
