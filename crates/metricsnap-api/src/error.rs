use thiserror::Error;

/// Top-level error type for the `metricsnap-api` crate.
///
/// The three failure kinds every call can hit are [`Transport`](Self::Transport),
/// [`EmptyResponse`](Self::EmptyResponse) and
/// [`Deserialization`](Self::Deserialization). `metricsnap-core` decides
/// which of them abort a run and which only skip a subtree.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in was refused, or the API rejected the token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status from an endpoint.
    #[error("API error (HTTP {status}) from {endpoint}: {message}")]
    Api {
        status: u16,
        endpoint: String,
        message: String,
    },

    /// The endpoint answered with the `[]` "no data" sentinel where a
    /// document was required.
    #[error("No data returned from {endpoint}")]
    EmptyResponse { endpoint: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error from {endpoint}: {message}")]
    Deserialization {
        endpoint: String,
        message: String,
        body: String,
    },
}

impl Error {
    /// Returns `true` for failures that happened before any HTTP response
    /// arrived (connect, DNS, timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
