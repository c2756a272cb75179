//! Transport seam and its `reqwest` implementation.
//!
//! The client speaks to the game server through [`Transport`], which issues
//! parameterized GET and form-encoded POST requests and hands back the
//! parsed JSON body. Everything above this layer works with typed payloads;
//! [`serde_json::Value`] never leaves the API module.

use std::future::Future;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tracing::debug;

/// A transport-level failure: network error or non-success HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("network error; status {}; reply {body}", status_text(.status))]
pub struct TransportError {
    /// HTTP status, `None` when no response was received.
    pub status: Option<u16>,
    /// Raw response body or the network error message.
    pub body: String,
}

impl TransportError {
    /// Failure with an HTTP status and body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    /// Failure without a response (connection refused, DNS, malformed body).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: message.into(),
        }
    }
}

/// Render an optional HTTP status for error messages.
#[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)] // thiserror passes fields by reference
fn status_text(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_owned(), |s| s.to_string())
}

/// Ordered query-string or form parameters.
///
/// Lists are encoded the way the game server expects them: one `key[]`
/// pair per element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    /// An empty parameter list.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a single parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: &(impl ToString + ?Sized)) -> Self {
        self.0.push((key.into(), value.to_string()));
        self
    }

    /// Append a list parameter as repeated `key[]` pairs.
    #[must_use]
    pub fn with_list<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let list_key = format!("{key}[]");
        for value in values {
            self.0.push((list_key.clone(), value.to_string()));
        }
        self
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value stored under `key[]`.
    pub fn list(&self, key: &str) -> Vec<&str> {
        let list_key = format!("{key}[]");
        self.0
            .iter()
            .filter(|(k, _)| *k == list_key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The parameters as ordered pairs.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Issues requests against the game server.
pub trait Transport: Send + Sync {
    /// GET `path` with `query` and return the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure or non-success status.
    fn get(&self, path: &str, query: &Query)
    -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// POST `form` to `path`, optionally authorized with a bearer token, and
    /// return the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure or non-success status.
    fn post(
        &self,
        path: &str,
        form: &Query,
        token: Option<&str>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// [`Transport`] over HTTP using `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url` (e.g. `https://stt.disruptorbeam.com/`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Join the base URL and a resource path.
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Turn a response into parsed JSON or a [`TransportError`].
    async fn read_json(response: reqwest::Response) -> Result<Value, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(TransportError::status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::network(format!("response parse failed: {e}")))
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!(url = url, params = query.pairs().len(), "GET");

        let response = self
            .client
            .get(&url)
            .query(query.pairs())
            .send()
            .await
            .map_err(|e| TransportError::network(format!("GET {url} failed: {e}")))?;

        Self::read_json(response).await
    }

    async fn post(
        &self,
        path: &str,
        form: &Query,
        token: Option<&str>,
    ) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!(url = url, params = form.pairs().len(), "POST");

        let mut request = self
            .client
            .post(&url)
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .form(form.pairs());
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", STANDARD.encode(token)));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::network(format!("POST {url} failed: {e}")))?;

        Self::read_json(response).await
    }
}
