//! Minimal HTTP client with safe logging and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout
//! - One attempt per call; non-2xx responses become [`HttpError::Api`]
//! - Redacts sensitive query params and never logs secret header values
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), asibar_http::HttpError> {
//! let client = asibar_http::HttpClient::new("https://example.com/")?;
//! let page = client
//!     .get_text("", asibar_http::RequestOpts::default())
//!     .await?;
//! println!("{} bytes, status {}", page.body.len(), page.status);
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, truncated body snippets, and final errors.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use thiserror::Error;

const SNIPPET_MAX: usize = 500;

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use asibar_http::Auth;
/// use reqwest::header::{AUTHORIZATION, HeaderValue};
///
/// let auth = Auth::Header {
///     name: AUTHORIZATION,
///     value: HeaderValue::from_static("OAuth oauth_version=\"1.0\""),
/// };
/// assert_eq!(auth.kind(), "header");
/// ```
#[derive(Clone, Debug, Default)]
pub enum Auth {
    /// Precomputed header, e.g. `Authorization: OAuth ...`
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    #[default]
    None,
}

impl Auth {
    /// Loggable name of the strategy; never the secret itself.
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use asibar_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("lang".into(), "tr".into())]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert_eq!(opts.auth.kind(), "none");
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
    pub auth: Auth,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(String, String)>>,
}

/// Decoded body of a successful text request.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub status: StatusCode,
    pub body: String,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use asibar_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("asibar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the base URL. An empty path is the base itself.
    ///
    /// ```
    /// let client = asibar_http::HttpClient::new("https://api.example.com").unwrap();
    /// let url = client.url_for("2/tweets").unwrap();
    /// assert_eq!(url.as_str(), "https://api.example.com/2/tweets");
    /// ```
    pub fn url_for(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// GET a text document (HTML, plain text) with per-request options.
    pub async fn get_text(&self, path: &str, opts: RequestOpts) -> Result<TextResponse, HttpError> {
        let (status, bytes) = self.send(Method::GET, path, None, opts).await?;
        Ok(TextResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let (_, bytes) = self.send(Method::POST, path, Some(payload), opts).await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            let snippet = snip_body(&bytes);
            tracing::warn!(
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e,
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        opts: RequestOpts,
    ) -> Result<(StatusCode, Vec<u8>), HttpError> {
        let url = self.url_for(path)?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout);

        if let Some(q) = &opts.query {
            rb = rb.query(q);
        }
        let has_body = body.is_some();
        if let Some(bytes) = body {
            rb = rb.header(CONTENT_TYPE, "application/json").body(bytes);
        }
        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }
        if let Auth::Header { name, value } = &opts.auth {
            let mut value = value.clone();
            value.set_sensitive(true);
            rb = rb.header(name, value);
        }

        let req_id = uuid::Uuid::new_v4().simple().to_string();
        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?redact_query(opts.query.as_deref().unwrap_or_default()),
            timeout_ms=timeout.as_millis() as u64,
            auth_kind=opts.auth.kind(),
            has_body,
            "http.request.start"
        );

        // ----- Send -----
        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.send");
            HttpError::Network(err.to_string())
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.body");
            HttpError::Network(err.to_string())
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let request_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-transaction-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%request_id,
            headers=?redact_headers(&headers),
            "http.response.headers"
        );
        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snip_body(&bytes),
            "http.response.body_snippet"
        );

        if status.is_success() {
            return Ok((status, bytes.to_vec()));
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            x_request_id=%request_id,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id,
        })
    }
}

// ==============================
// Helpers
// ==============================

/// Pull a human readable message out of an error body, falling back to a snippet.
///
/// Understands the Twitter v1.1 envelope (`{"errors":[{"message":..}]}`), the v2
/// problem document (`{"title":..,"detail":..}`), and plain `{"message":..}` /
/// `{"error":..}` objects.
pub fn extract_error_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct TwErrors {
        errors: Vec<Msg>,
    }

    #[derive(serde::Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        error: String,
    }

    impl Msg {
        fn first_non_empty(self) -> Option<String> {
            [self.detail, self.message, self.title, self.error]
                .into_iter()
                .find(|s| !s.is_empty())
        }
    }

    if let Ok(tw) = serde_json::from_slice::<TwErrors>(body) {
        if let Some(msg) = tw.errors.into_iter().next().and_then(Msg::first_non_empty) {
            return msg;
        }
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if let Some(msg) = m.first_non_empty() {
            return msg;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn is_secret_param(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "token"
            | "secret"
            | "client_secret"
            | "oauth_token"
            | "oauth_signature"
    )
}

fn redact_query(q: &[(String, String)]) -> Vec<(String, String)> {
    q.iter()
        .map(|(k, v)| {
            let v = if is_secret_param(k) {
                "<redacted>".to_string()
            } else {
                v.clone()
            };
            (k.clone(), v)
        })
        .collect()
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let val = if *k == AUTHORIZATION || k.as_str().eq_ignore_ascii_case("set-cookie") {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (k.as_str().to_string(), val)
        })
        .collect()
}
