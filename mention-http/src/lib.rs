//! JSON GET client shared by the API wrappers.
//!
//! - One attempt per call: transport and status errors surface to the caller
//! - Responses come back as [`HttpResponse`], so callers can read per-call
//!   headers (rate-limit budgets, request ids) next to the decoded body
//! - Redacts sensitive query params and never logs the bearer token
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), mention_http::HttpError> {
//! let client = mention_http::HttpClient::new("https://api.example.com/")?;
//! let got: mention_http::HttpResponse<serde_json::Value> = client
//!     .get_json("v1/items", mention_http::RequestOpts::default())
//!     .await?;
//! println!("{:?}", got.headers.get("x-request-id"));
//! # Ok(()) }
//! ```

use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

pub use reqwest::header::HeaderMap;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
];

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

/// What to send along with a GET.
///
/// ```
/// use mention_http::RequestOpts;
/// use std::borrow::Cow;
///
/// let opts = RequestOpts {
///     bearer: Some("token"),
///     query: vec![("user_id", Cow::Borrowed("42"))],
/// };
/// assert_eq!(opts.query.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    /// Sent as `Authorization: Bearer <token>`.
    pub bearer: Option<&'a str>,
    pub query: Vec<(&'a str, Cow<'a, str>)>,
}

/// Decoded body plus the headers of the response that carried it.
#[derive(Debug, Clone)]
pub struct HttpResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: T,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
}

impl HttpClient {
    /// Construct a client anchored to a base URL. Paths passed to
    /// [`get_json`](Self::get_json) are joined onto it, so keep the trailing `/`.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { base, inner })
    }

    /// GET `path` and decode a JSON body. Non-2xx answers become
    /// [`HttpError::Api`]; nothing is retried.
    pub async fn get_json<T>(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<HttpResponse<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let mut rb = self.inner.get(url.clone());
        if !opts.query.is_empty() {
            let pairs: Vec<(&str, &str)> =
                opts.query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }
        if let Some(tok) = opts.bearer {
            rb = rb.bearer_auth(clean_bearer(tok)?);
        }

        tracing::debug!(
            host_path = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query = ?redact_pairs(&opts.query),
            bearer = opts.bearer.is_some(),
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|e| network_error(&e))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|e| network_error(&e))?;

        let request_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-transaction-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        tracing::debug!(
            %status,
            duration_ms = t0.elapsed().as_millis() as u64,
            body_len = bytes.len(),
            x_request_id = %request_id,
            rate_limit.limit = ?header_str(&headers, "x-rate-limit-limit"),
            rate_limit.remaining = ?header_str(&headers, "x-rate-limit-remaining"),
            rate_limit.reset = ?header_str(&headers, "x-rate-limit-reset"),
            "http.response.headers"
        );

        if !status.is_success() {
            let message = extract_error_message(&bytes);
            tracing::warn!(
                %status,
                message = %message,
                x_request_id = %request_id,
                body_snippet = %snip_body(&bytes),
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }

        match serde_json::from_slice::<T>(&bytes) {
            Ok(body) => Ok(HttpResponse {
                status,
                headers,
                body,
            }),
            Err(e) => {
                let snippet = snip_body(&bytes);
                tracing::warn!(
                    serde_line = e.line(),
                    serde_col = e.column(),
                    serde_err = %e,
                    body_snippet = %snippet,
                    "http.response.decode_error"
                );
                Err(HttpError::Decode(e.to_string(), snippet))
            }
        }
    }
}

fn network_error(err: &reqwest::Error) -> HttpError {
    let message = err.to_string();
    tracing::warn!(message = %message, timeout = err.is_timeout(), "http.network_error");
    HttpError::Network(message)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn redact_pairs(pairs: &[(&str, Cow<'_, str>)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| {
            let lowered = name.to_ascii_lowercase();
            let value = match SECRET_PARAMS.contains(&lowered.as_str()) {
                true => "<redacted>".to_string(),
                false => value.to_string(),
            };
            (name.to_string(), value)
        })
        .collect()
}

/// Best human-readable message in an error body.
///
/// Twitter answers `{"errors":[{"message":..,"code":..}]}`; proxies and
/// gateways tend to send `{"error":..}` instead. Anything else is returned as
/// a body snippet.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        errors: Vec<ApiErrorEntry>,
        #[serde(default)]
        error: Option<String>,
    }
    #[derive(Deserialize)]
    struct ApiErrorEntry {
        #[serde(default)]
        message: String,
        code: Option<i64>,
    }

    let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) else {
        return snip_body(body);
    };
    if let Some(entry) = parsed.errors.into_iter().next() {
        return match entry.code {
            Some(code) => format!("{} (code {code})", entry.message),
            None => entry.message,
        };
    }
    match parsed.error {
        Some(error) if !error.is_empty() => error,
        _ => snip_body(body),
    }
}

const SNIPPET_LEN: usize = 500;

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= SNIPPET_LEN {
        return text.into_owned();
    }
    let cut = (0..=SNIPPET_LEN)
        .rev()
        .find(|i| text.is_char_boundary(*i))
        .unwrap_or(0);
    format!("{}...", &text[..cut])
}

/// Strip quotes and whitespace that pasted tokens tend to carry, then make
/// sure the result fits in an `Authorization` header.
fn clean_bearer(raw: &str) -> Result<String, HttpError> {
    let token: String = raw
        .trim()
        .trim_matches(['"', '\''])
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();

    if !token.is_ascii() {
        return Err(HttpError::Build("bearer token contains non-ASCII bytes".into()));
    }
    if token.bytes().any(|b| b.is_ascii_control()) {
        return Err(HttpError::Build("bearer token contains control characters".into()));
    }
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(token)
}
