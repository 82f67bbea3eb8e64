//! CLI-owned configuration: TOML file, environment, credential resolution,
//! and translation to `metricsnap_core::ExportConfig`.
//!
//! Core never sees these types -- it receives a pre-built `ExportConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use metricsnap_core::{
    Credentials, DEFAULT_WINDOW, ExportConfig, FanoutLimits, ReportFormat, Schedule, TlsMode,
};

use crate::cli::Cli;
use crate::error::CliError;

/// Keyring service name; the entry user is the sign-in name.
const KEYRING_SERVICE: &str = "metricsnap";

/// Environment variable checked for the password after `password_env`.
const PASSWORD_VAR: &str = "METRICSNAP_PASSWORD";

// ── TOML config structs ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// API base URL (e.g. "https://nms.example.com/api/v2/").
    pub url: Option<String>,

    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Request timeout in seconds.
    pub timeout: u64,

    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// Trailing window length in seconds.
    pub window_secs: u64,

    pub page_size: u32,

    pub max_pages: u32,

    pub schedule: ScheduleMode,

    /// Report format; defaults to keyed, or dotted when sequential.
    pub format: Option<FormatName>,

    pub concurrency: Concurrency,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            password_env: None,
            timeout: 30,
            insecure: false,
            ca_cert: None,
            window_secs: DEFAULT_WINDOW.as_secs(),
            page_size: metricsnap_api::client::DEFAULT_PAGE_SIZE,
            max_pages: metricsnap_api::client::DEFAULT_MAX_PAGES,
            schedule: ScheduleMode::Concurrent,
            format: None,
            concurrency: Concurrency::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    Concurrent,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatName {
    Keyed,
    Dotted,
}

impl From<FormatName> for ReportFormat {
    fn from(name: FormatName) -> Self {
        match name {
            FormatName::Keyed => Self::Keyed,
            FormatName::Dotted => Self::Dotted,
        }
    }
}

/// Per-level worker ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Concurrency {
    pub devices: usize,
    pub objects: usize,
    pub indicators: usize,
}

impl Default for Concurrency {
    fn default() -> Self {
        let limits = FanoutLimits::default();
        Self {
            devices: limits.devices,
            objects: limits.objects,
            indicators: limits.indicators,
        }
    }
}

// ── Config file path ─────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "metricsnap").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("metricsnap");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ───────────────────────────────────────────────────

/// Defaults, then the TOML file at `path` (if present), then `METRICSNAP_*`.
///
/// Nested keys use a double underscore: `METRICSNAP_CONCURRENCY__DEVICES`.
/// `METRICSNAP_PASSWORD` is left to the credential chain.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("METRICSNAP_")
                .split("__")
                .ignore(&["password", "config"]),
        )
}

pub fn load_config(path: &Path) -> Result<Config, CliError> {
    debug!(path = %path.display(), "loading config");
    Ok(figment(path).extract()?)
}

// ── Resolution ───────────────────────────────────────────────────────

/// Resolve the password: `password_env` variable, `METRICSNAP_PASSWORD`,
/// system keyring, then plaintext config.
pub fn resolve_password(config: &Config, username: &str) -> Option<SecretString> {
    if let Some(ref env_name) = config.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var(PASSWORD_VAR) {
        return Some(SecretString::from(val));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, username) {
        if let Ok(secret) = entry.get_password() {
            debug!("password read from keyring");
            return Some(SecretString::from(secret));
        }
    }

    config.password.clone().map(SecretString::from)
}

/// Translate the loaded `Config` plus CLI flags into an `ExportConfig`.
///
/// Flags win over the file and environment.
pub fn resolve(config: &Config, cli: &Cli, path: &Path) -> Result<ExportConfig, CliError> {
    let path_display = path.display().to_string();

    // 1. URL
    let url_str = cli
        .url
        .as_deref()
        .or(config.url.as_deref())
        .ok_or_else(|| CliError::NoUrl {
            path: path_display.clone(),
        })?;
    let url: url::Url = url_str.parse().map_err(|e| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL {url_str}: {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(CliError::Validation {
            field: "url".into(),
            reason: format!("{url_str} cannot be used as a base URL"),
        });
    }

    // 2. Credentials
    let username = cli
        .username
        .clone()
        .or_else(|| config.username.clone())
        .ok_or_else(|| CliError::NoCredentials {
            path: path_display.clone(),
        })?;
    let password = resolve_password(config, &username).ok_or(CliError::NoCredentials {
        path: path_display,
    })?;

    // 3. TLS
    let tls = if cli.insecure || config.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca) = config.ca_cert {
        TlsMode::CustomCa(ca.clone())
    } else {
        TlsMode::System
    };

    // 4. Traversal
    let sequential = cli.sequential || config.schedule == ScheduleMode::Sequential;
    let schedule = if sequential {
        Schedule::Sequential
    } else {
        let limits = FanoutLimits {
            devices: config.concurrency.devices,
            objects: config.concurrency.objects,
            indicators: config.concurrency.indicators,
        };
        limits.validate().map_err(|reason| CliError::Validation {
            field: "concurrency".into(),
            reason,
        })?;
        Schedule::Bounded(limits)
    };

    let format = cli
        .format
        .map(ReportFormat::from)
        .or(config.format.map(ReportFormat::from))
        .unwrap_or(if sequential {
            ReportFormat::Dotted
        } else {
            ReportFormat::Keyed
        });

    let window = cli
        .window
        .unwrap_or(Duration::from_secs(config.window_secs));
    if window.is_zero() {
        return Err(CliError::Validation {
            field: "window".into(),
            reason: "must be longer than zero".into(),
        });
    }

    let mut export = ExportConfig::new(url, Credentials::new(username, password));
    export.tls = tls;
    export.timeout = Duration::from_secs(cli.timeout.unwrap_or(config.timeout));
    export.window = window;
    export.page_size = config.page_size;
    export.max_pages = config.max_pages;
    export.schedule = schedule;
    export.format = format;
    Ok(export)
}
