// Domoticz HTTP client
//
// Wraps `reqwest::Client` with `/json.htm` URL construction, Basic auth,
// and envelope unwrapping. Endpoint groups (devices, commands) are
// implemented as inherent methods in separate files so this module
// stays focused on transport mechanics.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::Envelope;
use crate::transport::TransportConfig;

/// Raw HTTP client for a Domoticz server.
///
/// Every query goes to `{base}/json.htm?...`. Methods return unwrapped
/// `result` payloads; the envelope is stripped before the caller sees it.
#[derive(Debug, Clone)]
pub struct DomoticzClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl DomoticzClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the server root, e.g. `http://192.168.1.10:8080`.
    pub fn new(
        base_url: Url,
        credentials: Option<Credentials>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `host:port` of the server, used to build stable pairing identifiers.
    pub fn host_string(&self) -> String {
        let host = self.base_url.host_str().unwrap_or("localhost");
        match self.base_url.port_or_known_default() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/json.htm?{query}`.
    pub(crate) fn json_url(&self, query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = self.base_url.join("json.htm")?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET and return the raw response body after status checks.
    async fn get_body(&self, url: Url) -> Result<String, Error> {
        debug!("GET {}", url);

        let mut builder = self.http.get(url);
        if let Some(credentials) = &self.credentials {
            builder = credentials.apply(builder);
        }
        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("credentials rejected (HTTP {status})"),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        resp.text().await.map_err(Error::Transport)
    }

    /// GET a `/json.htm` query and unwrap the `{ status, result }` envelope.
    pub(crate) async fn get_envelope<T: DeserializeOwned>(
        &self,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, Error> {
        let url = self.json_url(query)?;
        let body = self.get_body(url).await?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            }
        })?;

        if envelope.is_ok() {
            Ok(envelope.result)
        } else {
            Err(envelope_error(envelope.title, envelope.message))
        }
    }

    /// GET a `/json.htm` query whose payload is not wrapped in `result`.
    pub(crate) async fn get_object<T: DeserializeOwned>(
        &self,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = self.json_url(query)?;
        let body = self.get_body(url).await?;

        let status: Envelope<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;
        if !status.is_ok() {
            return Err(envelope_error(status.title, status.message));
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Domoticz reports a bad login on some builds as `ERR` with a
/// `title` mentioning the login rather than an HTTP 401.
fn envelope_error(title: Option<String>, message: Option<String>) -> Error {
    let text = message
        .filter(|m| !m.is_empty())
        .or(title)
        .unwrap_or_else(|| "status=ERR".into());
    if text.to_ascii_lowercase().contains("login") {
        Error::Authentication { message: text }
    } else {
        Error::Api { message: text }
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(i, _)| i);
    &body[..end]
}
