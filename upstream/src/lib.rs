//! Client for the external combine API.
//!
//! # Architecture
//!
//! - [`CombineClient`] - builds the request for an ordered pair and decodes the result
//! - [`retry`] - 429 handling: sleep for `Retry-After` + 1s and resend, in a loop
//!
//! # Error Handling
//!
//! Every non-throttling failure comes back as a typed [`CombineError`]. The
//! client never aborts the process itself; the caller decides which kinds
//! end the run (see [`CombineError::is_fatal`]).

mod error;
pub mod retry;

use std::time::Duration;

use craftmap_types::{Discovery, OrderedPair};
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use url::Url;

pub use error::{BuildError, CombineError};
pub use retry::{RateLimitPolicy, RetryOutcome, send_with_rate_limit_retry};

/// Canonical combine endpoint.
pub const COMBINE_API_URL: &str = "https://neal.fun/api/infinite-craft/pair";
/// Referer the upstream expects from its own web client.
pub const DEFAULT_REFERER: &str = "https://neal.fun/infinite-craft/";
/// Identifies this crawler to the upstream operator.
pub const DEFAULT_USER_AGENT: &str = "InfiniteCraft_Mapper/rate-limited";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const MAX_REDIRECTS: usize = 10;

/// Error bodies are kept for diagnostics but never in full.
const MAX_ERROR_BODY_BYTES: usize = 2 * 1024;

/// Everything needed to talk to the combine endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub referer: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub rate_limit: RateLimitPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: COMBINE_API_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Default settings against a different endpoint.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}

/// Issues combine requests for ordered pairs.
#[derive(Debug, Clone)]
pub struct CombineClient {
    http: reqwest::Client,
    endpoint: Url,
    rate_limit: RateLimitPolicy,
}

impl CombineClient {
    pub fn new(config: ClientConfig) -> Result<Self, BuildError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|source| BuildError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                source,
            })?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(REFERER, header_value("referer", &config.referer)?);
        default_headers.insert(USER_AGENT, header_value("user-agent", &config.user_agent)?);

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
            .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            rate_limit: config.rate_limit,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The request URL for `pair`: the endpoint with `first` and `second` appended.
    #[must_use]
    pub fn request_url(&self, pair: &OrderedPair) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("first", pair.first())
            .append_pair("second", pair.second());
        url
    }

    /// Ask the upstream what `pair` produces.
    ///
    /// Blocks through any amount of 429 throttling (bounded only by the
    /// policy's retry cap). The decoded body is returned as-is.
    pub async fn combine(&self, pair: &OrderedPair) -> Result<Discovery, CombineError> {
        let url = self.request_url(pair);
        tracing::debug!(url = %url, "Calling combine API");

        let outcome =
            send_with_rate_limit_retry(|| self.http.get(url.clone()), &self.rate_limit).await;

        match outcome {
            RetryOutcome::Success(response) => {
                let body = response.bytes().await.map_err(CombineError::Transport)?;
                let discovery: Discovery = serde_json::from_slice(&body)?;
                tracing::debug!(
                    pair = %pair,
                    result = %discovery.result,
                    emoji = %discovery.emoji,
                    is_new = discovery.is_new,
                    "Combine API answered"
                );
                Ok(discovery)
            }
            RetryOutcome::HttpError(response) => {
                let status = response.status();
                let body = read_capped_error_body(response).await;
                Err(CombineError::from_status(status, body))
            }
            RetryOutcome::RateLimited { attempts } => Err(CombineError::RateLimited { attempts }),
            RetryOutcome::Transport(e) => Err(CombineError::Transport(e)),
        }
    }
}

fn header_value(header: &'static str, value: &str) -> Result<HeaderValue, BuildError> {
    HeaderValue::from_str(value).map_err(|_| BuildError::InvalidHeader {
        header,
        value: value.to_string(),
    })
}

async fn read_capped_error_body(response: reqwest::Response) -> String {
    match response.bytes().await {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            truncate_to_char_boundary(&text, MAX_ERROR_BODY_BYTES).to_string()
        }
        Err(e) => format!("<unreadable body: {e}>"),
    }
}

fn truncate_to_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
