// REST API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, `x-auth-token` injection,
// status mapping, the `[]` no-data sentinel and `Page<T>` unwrapping.
// Endpoint methods live in `auth.rs` and `hierarchy.rs` as inherent impls
// to keep this module focused on transport mechanics.

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::AuthToken;
use crate::error::Error;
use crate::models::Page;
use crate::transport::TransportConfig;

/// Header carrying the token returned by sign-in.
pub(crate) const AUTH_HEADER: &str = "x-auth-token";

/// Oversized page requested on every listing, so one request covers
/// almost every deployment.
pub const DEFAULT_PAGE_SIZE: u32 = 10_000;

/// Ceiling on pages followed for a single listing.
pub const DEFAULT_MAX_PAGES: u32 = 1_000;

/// What a listing does when the endpoint answers `[]` instead of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EmptyBody {
    /// Fail with [`Error::EmptyResponse`].
    Reject,
    /// Treat it as a page with no content.
    AsEmpty,
}

/// Raw HTTP client for the v2 REST API.
///
/// Every endpoint path is joined onto `base_url`, which always ends in a
/// slash (e.g. `https://nms.example.com/api/v2/`).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    page_size: u32,
    max_pages: u32,
}

impl ApiClient {
    /// Create a client from a base URL and a `TransportConfig`.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        })
    }

    /// Override the page size requested by listings.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Override the maximum number of pages followed per listing.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// The API base URL (always slash-terminated).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative endpoint path (e.g. `"devices/7/objects"`).
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and return the body text.
    ///
    /// 401/403 map to [`Error::Authentication`], any other non-success
    /// status to [`Error::Api`].
    pub(crate) async fn get_text(&self, url: Url, token: &AuthToken) -> Result<String, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTH_HEADER, token.header_value()?)
            .send()
            .await?;

        read_body(resp).await
    }

    /// GET a paged listing, following `totalPages` until every page is read.
    ///
    /// The first page is `page=0`. Pagination stops at the reported page
    /// count, at the first empty page, or at `max_pages`.
    pub(crate) async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &AuthToken,
        empty: EmptyBody,
    ) -> Result<Vec<T>, Error> {
        let mut items = Vec::new();
        let mut page: u32 = 0;

        loop {
            let mut url = self.url(path)?;
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("size", &self.page_size.to_string());
            let endpoint = url.to_string();

            let body = self.get_text(url, token).await?;

            if is_empty_sentinel(&body) {
                if page == 0 && empty == EmptyBody::Reject {
                    return Err(Error::EmptyResponse { endpoint });
                }
                trace!(endpoint = %endpoint, "empty listing");
                break;
            }

            let envelope: Page<T> = decode(&endpoint, &body)?;
            let fetched = envelope.content.len();
            items.extend(envelope.content);
            page += 1;

            if fetched == 0 || page >= envelope.total_pages {
                break;
            }
            if page >= self.max_pages {
                warn!(
                    endpoint = %endpoint,
                    total_pages = envelope.total_pages,
                    max_pages = self.max_pages,
                    "page limit reached, listing truncated"
                );
                break;
            }
        }

        Ok(items)
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Check the status and read the body of a response.
pub(crate) async fn read_body(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    let endpoint = resp.url().to_string();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("token rejected by {endpoint} (HTTP {status})"),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            endpoint,
            message: preview(&body),
        });
    }

    Ok(resp.text().await?)
}

/// The API answers `[]` when a query matched nothing.
pub(crate) fn is_empty_sentinel(body: &str) -> bool {
    body.trim() == "[]"
}

/// Decode a JSON body, keeping the raw text on failure.
pub(crate) fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        endpoint: endpoint.to_owned(),
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
