//! Rate-limit retry policy for the combine endpoint.
//!
//! The upstream signals throttling with HTTP 429 and a `Retry-After` header
//! in whole seconds. We sleep for that long plus a one second pad and send
//! the identical request again. Only 429 is retried: every other failure is
//! handed back to the caller untouched.
//!
//! # Policy
//!
//! - `Retry-After` missing or unparsable: 60 seconds
//! - Padding: +1 second on every wait
//! - Retries: unbounded unless `max_retries` is set

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, header::HeaderMap};

/// How to wait out HTTP 429 responses.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Wait used when the server sends no usable `Retry-After`.
    pub default_retry_after: Duration,
    /// Added to every wait.
    pub padding: Duration,
    /// Give up after this many consecutive 429 retries. `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            default_retry_after: Duration::from_secs(60),
            padding: Duration::from_secs(1),
            max_retries: None,
        }
    }
}

impl RateLimitPolicy {
    /// How long to sleep before retrying a throttled request.
    #[must_use]
    pub fn delay_for(&self, headers: &HeaderMap) -> Duration {
        parse_retry_after(headers).unwrap_or(self.default_retry_after) + self.padding
    }

    /// Whether another retry is allowed after `retries` have already happened.
    #[must_use]
    pub fn allows_retry(&self, retries: u32) -> bool {
        self.max_retries.is_none_or(|max| retries < max)
    }
}

/// Parse a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are not supported by the upstream and parse as `None`.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    let secs = value.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}

/// Outcome of a rate-limited send.
///
/// This is a sum type that structurally distinguishes success from failure,
/// ensuring callers cannot accidentally treat an error response as success.
#[derive(Debug)]
pub enum RetryOutcome {
    /// Request succeeded (2xx status).
    Success(Response),
    /// Any non-2xx status other than 429. The response is kept for error body inspection.
    HttpError(Response),
    /// Still throttled after the policy's retry cap.
    RateLimited { attempts: u32 },
    /// The request never produced a response.
    Transport(reqwest::Error),
}

impl RetryOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Send a request, sleeping and resending on HTTP 429 as `policy` dictates.
///
/// `build_request` is called once per attempt so every resend is identical.
/// The retry is a loop, so sustained throttling costs time, not stack.
pub async fn send_with_rate_limit_retry<F>(
    build_request: F,
    policy: &RateLimitPolicy,
) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let mut retries: u32 = 0;

    loop {
        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) => return RetryOutcome::Transport(e),
        };

        let status = response.status();
        if status.is_success() {
            return RetryOutcome::Success(response);
        }
        if status != StatusCode::TOO_MANY_REQUESTS {
            return RetryOutcome::HttpError(response);
        }

        if !policy.allows_retry(retries) {
            return RetryOutcome::RateLimited {
                attempts: retries + 1,
            };
        }

        let delay = policy.delay_for(response.headers());
        retries += 1;
        tracing::warn!(
            retry = retries,
            delay_secs = delay.as_secs_f64(),
            "Rate limited by combine API, sleeping before retry"
        );
        drop(response);
        tokio::time::sleep(delay).await;
    }
}
