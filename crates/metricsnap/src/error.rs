//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with help text and
//! process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use metricsnap_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(metricsnap::connection_failed),
        help(
            "Check that the API is reachable from this host.\n\
             URL: {url}\n\
             For self-signed certificates try --insecure or set ca_cert."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: metricsnap_api::Error,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed at {url}")]
    #[diagnostic(
        code(metricsnap::auth_failed),
        help(
            "Verify the username and password.\n\
             The password is read from password_env, METRICSNAP_PASSWORD,\n\
             the system keyring (service \"metricsnap\") or the config file."
        )
    )]
    AuthFailed {
        url: String,
        #[source]
        source: metricsnap_api::Error,
    },

    #[error("No credentials configured")]
    #[diagnostic(
        code(metricsnap::no_credentials),
        help(
            "Set username and password in {path},\n\
             or export METRICSNAP_USERNAME and METRICSNAP_PASSWORD."
        )
    )]
    NoCredentials { path: String },

    // ── Remote data ──────────────────────────────────────────────────
    #[error("Could not list devices at {url}")]
    #[diagnostic(code(metricsnap::device_listing))]
    DeviceListing {
        url: String,
        #[source]
        source: metricsnap_api::Error,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No API URL configured")]
    #[diagnostic(
        code(metricsnap::no_url),
        help(
            "Pass --url, export METRICSNAP_URL, or set url in {path}.\n\
             Example: https://nms.example.com/api/v2/"
        )
    )]
    NoUrl { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(metricsnap::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(metricsnap::config))]
    Config(Box<figment::Error>),

    // ── Output ───────────────────────────────────────────────────────
    #[error("Could not write the report")]
    #[diagnostic(code(metricsnap::output))]
    Output(#[source] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NoUrl { .. } | Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::DeviceListing { .. } | Self::Output(_) => exit_code::GENERAL,
        }
    }

    /// Translate a core error for the API at `url`.
    pub fn from_core(err: CoreError, url: &str) -> Self {
        let url = url.to_owned();
        match err {
            CoreError::Authentication { source } | CoreError::DeviceListing { source }
                if source.is_transport() =>
            {
                Self::ConnectionFailed { url, source }
            }

            CoreError::Authentication { source } => Self::AuthFailed { url, source },

            CoreError::DeviceListing { source }
                if matches!(source, metricsnap_api::Error::Authentication { .. }) =>
            {
                Self::AuthFailed { url, source }
            }

            CoreError::DeviceListing { source } | CoreError::FetchFailed { source, .. } => {
                Self::DeviceListing { url, source }
            }

            CoreError::Output(e) => Self::Output(e),

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
