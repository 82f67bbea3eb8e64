// Sign-in
//
// `POST authentication/signin?nmsLogin=false` exchanges a name/password pair
// for a token. The token is returned to the caller and passed explicitly to
// every later request; the client itself stays stateless.

use std::collections::HashMap;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::{ApiClient, decode, is_empty_sentinel, read_body};
use crate::error::Error;

/// Name/password pair accepted by the sign-in endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Token returned by sign-in, sent as `x-auth-token` on every GET.
///
/// Valid for the whole run; `Debug` output is redacted.
#[derive(Debug, Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token string.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub(crate) fn header_value(&self) -> Result<HeaderValue, Error> {
        let mut value =
            HeaderValue::from_str(self.expose()).map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl ApiClient {
    /// Exchange credentials for an [`AuthToken`].
    ///
    /// Fails with [`Error::Transport`] when the request cannot be sent,
    /// [`Error::EmptyResponse`] on a `[]` body, [`Error::Deserialization`]
    /// when the body is not a JSON object, and [`Error::Authentication`]
    /// when the status is not a success or no token is present.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthToken, Error> {
        let mut url = self.url("authentication/signin")?;
        url.query_pairs_mut().append_pair("nmsLogin", "false");
        let endpoint = url.to_string();

        debug!("signing in at {} as {}", url, credentials.username);

        let body = json!({
            "name": credentials.username,
            "password": credentials.password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let text = read_body(resp).await.map_err(|e| match e {
            Error::Api {
                status, message, ..
            } => Error::Authentication {
                message: format!("sign-in failed (HTTP {status}): {message}"),
            },
            other => other,
        })?;

        if is_empty_sentinel(&text) {
            return Err(Error::EmptyResponse { endpoint });
        }

        let fields: HashMap<String, serde_json::Value> = decode(&endpoint, &text)?;
        let token = fields
            .get("token")
            .and_then(serde_json::Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: format!("no token in sign-in response from {endpoint}"),
            })?;

        debug!("obtained token");
        Ok(AuthToken::new(token))
    }
}
