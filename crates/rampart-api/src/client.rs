// Firewall API HTTP client
//
// The single choke point for every network call. Merges default and
// caller-supplied headers, issues the request against the API root,
// classifies the response, and turns every failure into exactly one error
// notice plus a typed `Error`. Endpoint bindings live in `endpoints/` as
// inherent methods so this module stays focused on transport mechanics.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::notify::{LogRedirect, LoginRedirect, Notice, Notifier, TracingNotifier};
use crate::session::{MemorySessionStore, SessionStore};
use crate::transport::TransportConfig;

const BODY_PREVIEW_CHARS: usize = 200;

/// Error body shape the firewall API uses for non-2xx responses.
#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Per-call overrides layered on top of the client defaults.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    /// Merged over the default headers; these win on conflict.
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn queries<K: Into<String>>(mut self, pairs: impl IntoIterator<Item = (K, String)>) -> Self {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: &(impl Serialize + ?Sized)) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| Error::MalformedResponse {
            message: format!("failed to encode request body: {e}"),
            body: String::new(),
        })?;
        self.body = Some(value);
        Ok(self)
    }
}

/// HTTP client for the firewall management API.
///
/// Cheap to clone: the reqwest client, session store, and side-channel
/// handles are all shared.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    redirect: Arc<dyn LoginRedirect>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url` (e.g.
    /// `http://fw.local:5000/api`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            session: Arc::new(MemorySessionStore::new()),
            notifier: Arc::new(TracingNotifier),
            redirect: Arc::new(LogRedirect),
        }
    }

    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = store;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = redirect;
        self
    }

    /// The API root every endpoint is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Emit a notice through the configured notifier.
    pub fn notify(&self, notice: &Notice) {
        self.notifier.notify(notice);
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `<api-root><endpoint>`
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = if endpoint.starts_with('/') {
            format!("{base}{endpoint}")
        } else {
            format!("{base}/{endpoint}")
        };
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Perform a request and decode the body into `T`.
    ///
    /// Any failure emits one error notice before being returned.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        match self.execute(method, endpoint, options).await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.notifier.notify(&Notice::error(err.message()));
                Err(err)
            }
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(Method::GET, endpoint, options).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &(impl Serialize + Sync + ?Sized),
    ) -> Result<T, Error> {
        let options = match RequestOptions::new().json(body) {
            Ok(options) => options,
            Err(err) => {
                self.notifier.notify(&Notice::error(err.message()));
                return Err(err);
            }
        };
        self.request(Method::POST, endpoint, options).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(Method::DELETE, endpoint, options).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("{} {}", method, url);

        let headers = merge_headers(default_headers(), &options.headers);
        let mut builder = self.http.request(method, url).headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(ref body) = options.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        self.classify(resp).await
    }

    /// Map a response onto `Ok(T)` or the matching `Error` variant.
    async fn classify<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            self.session.clear();
            self.redirect.redirect_to_login();
            return Err(Error::Unauthenticated);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Request {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let text = if body.trim().is_empty() { "null" } else { body.as_str() };

        serde_json::from_str(text).map_err(|e| {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            Error::MalformedResponse {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}

// ── Header + error helpers ──────────────────────────────────────────

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Layer `overrides` over `base`. Every header name present in
/// `overrides` replaces all of its values in `base`.
fn merge_headers(mut base: HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    for name in overrides.keys() {
        base.remove(name);
        for value in overrides.get_all(name) {
            base.append(name.clone(), value.clone());
        }
    }
    base
}

/// Resolve the message for a non-2xx response: the server's `{ message }`
/// when present, otherwise one synthesized from the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "HTTP error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn caller_headers_win_over_defaults() {
        let mut overrides = HeaderMap::new();
        overrides.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        overrides.insert(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("abc"),
        );

        let merged = merge_headers(default_headers(), &overrides);
        assert_eq!(merged[ACCEPT], "text/plain");
        assert_eq!(merged[CONTENT_TYPE], "application/json");
        assert_eq!(merged["x-request-id"], "abc");
        assert_eq!(merged.get_all(ACCEPT).iter().count(), 1);
    }

    #[test]
    fn error_message_prefers_server_message() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message":"Invalid port"}"#);
        assert_eq!(msg, "Invalid port");
    }

    #[test]
    fn error_message_synthesized_from_status() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, "<html>nope</html>"),
            "HTTP error 404: Not Found"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":""}"#),
            "HTTP error 500: Internal Server Error"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "HTTP error 502: Bad Gateway"
        );
    }

    #[test]
    fn endpoint_url_appends_to_api_root() {
        let client = ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://fw.local:5000/api/").unwrap(),
        );
        assert_eq!(
            client.endpoint_url("/rules").unwrap().as_str(),
            "http://fw.local:5000/api/rules"
        );
        assert_eq!(
            client.endpoint_url("logs/stats").unwrap().as_str(),
            "http://fw.local:5000/api/logs/stats"
        );
    }
}
