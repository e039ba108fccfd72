//! HTTP fetcher implementation
//!
//! Every adapter goes through this module, so timeout, retry and backoff
//! behavior is identical across source kinds:
//! - Building the shared HTTP client
//! - Per-attempt timeouts
//! - Exponential backoff between failed attempts
//! - Payload decoding without retry

use crate::config::FetchConfig;
use crate::fetch::decode::decode_text;
use crate::fetch::error::FetchError;
use crate::fetch::retry::RetryPolicy;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

/// One logical GET request
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    pub headers: HeaderMap,
    pub params: Vec<(String, String)>,
}

impl<'a> FetchRequest<'a> {
    pub fn get(url: &'a str) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
            params: Vec::new(),
        }
    }

    /// Sets the User-Agent header; invalid header values are skipped
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        match HeaderValue::from_str(user_agent) {
            Ok(value) => {
                self.headers.insert(USER_AGENT, value);
            }
            Err(_) => {
                tracing::warn!(user_agent, "ignoring invalid user agent header value");
            }
        }
        self
    }

    pub fn params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.params.extend(params);
        self
    }
}

/// A successful response body with its declared media type
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Outcome of a single failed attempt that may be retried
#[derive(Debug)]
enum AttemptFailure {
    Timeout,
    Transport(String),
    Status(u16),
}

impl AttemptFailure {
    fn into_error(self, url: &str, attempts: u32) -> FetchError {
        let url = url.to_string();
        match self {
            Self::Timeout => FetchError::Timeout { url, attempts },
            Self::Transport(message) => FetchError::Transport {
                url,
                attempts,
                message,
            },
            Self::Status(status) => FetchError::Status {
                url,
                status,
                attempts,
            },
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Timeout => "timeout".to_string(),
            Self::Transport(message) => message.clone(),
            Self::Status(status) => format!("HTTP {}", status),
        }
    }
}

/// Builds the HTTP client shared by all adapters during a run
///
/// Timeouts are applied per request by the fetcher, so the client itself
/// only bounds connection setup.
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, retrying transport failures and non-2xx responses
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Return body, no retry |
/// | Non-2xx status | Retry with backoff |
/// | Timeout | Retry with backoff |
/// | Connection/body error | Retry with backoff |
/// | Malformed request (bad URL) | Fail immediately |
///
/// After `max_retries + 1` attempts the last failure is returned.
pub async fn fetch_bytes(
    client: &Client,
    request: &FetchRequest<'_>,
    policy: &RetryPolicy,
) -> Result<FetchedBody, FetchError> {
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let failure = match send_once(client, request, policy.timeout).await {
            Ok(body) => return Ok(body),
            Err(Ok(failure)) => failure,
            Err(Err(fatal)) => return Err(fatal),
        };

        if attempt >= max_attempts {
            tracing::warn!(
                url = request.url,
                attempt,
                error = %failure.describe(),
                "fetch attempt failed, retries exhausted"
            );
            return Err(failure.into_error(request.url, attempt));
        }

        let delay = policy.delay_for(attempt);
        tracing::warn!(
            url = request.url,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %failure.describe(),
            "fetch attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Fetches a URL and decodes the body as text
///
/// The charset comes from a BOM, the `Content-Type` header or an XML
/// declaration, in that order, and defaults to UTF-8. Malformed sequences
/// are replaced rather than rejected.
pub async fn fetch_text(
    client: &Client,
    request: &FetchRequest<'_>,
    policy: &RetryPolicy,
) -> Result<String, FetchError> {
    let body = fetch_bytes(client, request, policy).await?;
    let decoded = decode_text(&body.bytes, body.content_type.as_deref());
    if decoded.had_errors {
        tracing::debug!(
            url = request.url,
            encoding = decoded.encoding,
            "replaced malformed byte sequences"
        );
    }
    Ok(decoded.text)
}

/// Fetches a URL and decodes the body as JSON
///
/// A body that is not valid JSON fails immediately; it is not retried.
pub async fn fetch_json(
    client: &Client,
    request: &FetchRequest<'_>,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, FetchError> {
    let body = fetch_bytes(client, request, policy).await?;
    serde_json::from_slice(&body.bytes).map_err(|e| FetchError::Decode {
        url: request.url.to_string(),
        message: e.to_string(),
    })
}

/// Performs one attempt
///
/// `Err(Ok(_))` is a retryable failure, `Err(Err(_))` a fatal one.
async fn send_once(
    client: &Client,
    request: &FetchRequest<'_>,
    timeout: Duration,
) -> Result<FetchedBody, Result<AttemptFailure, FetchError>> {
    let mut builder = client
        .get(request.url)
        .headers(request.headers.clone())
        .timeout(timeout);
    if !request.params.is_empty() {
        builder = builder.query(&request.params);
    }

    let response = builder.send().await.map_err(|e| classify(request.url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Ok(AttemptFailure::Status(status.as_u16())));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match response.bytes().await {
        Ok(bytes) => Ok(FetchedBody {
            bytes: bytes.to_vec(),
            content_type,
        }),
        Err(e) => Err(classify(request.url, e)),
    }
}

fn classify(url: &str, error: reqwest::Error) -> Result<AttemptFailure, FetchError> {
    if error.is_builder() {
        return Err(FetchError::Request {
            url: url.to_string(),
            message: error.to_string(),
        });
    }

    if error.is_timeout() {
        Ok(AttemptFailure::Timeout)
    } else {
        Ok(AttemptFailure::Transport(error.to_string()))
    }
}
