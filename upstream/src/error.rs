use reqwest::StatusCode;
use thiserror::Error;

/// Failure to construct a [`crate::CombineClient`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid combine endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid {header} header value {value:?}")]
    InvalidHeader { header: &'static str, value: String },
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Why a combine request produced no result.
///
/// The exploration loop decides per kind whether to abort the run or skip
/// the attempt; see [`CombineError::is_fatal`].
#[derive(Debug, Error)]
pub enum CombineError {
    /// Still throttled after the configured retry cap.
    #[error("combine API still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// 4xx other than 429: the request itself is wrong.
    #[error("combine API rejected request with {status}: {body}")]
    ClientError { status: StatusCode, body: String },

    /// 5xx, or any other non-success status.
    #[error("combine API failed with {status}: {body}")]
    ServerError { status: StatusCode, body: String },

    #[error("combine request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("malformed combine response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CombineError {
    /// Whether this failure points at a systemic upstream problem that should
    /// stop the whole run rather than just this attempt.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ClientError { .. } | Self::ServerError { .. } | Self::Decode(_)
        )
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ClientError { status, .. } | Self::ServerError { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::Transport(e) => e.status(),
            Self::Decode(_) => None,
        }
    }

    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        if status.is_client_error() {
            Self::ClientError { status, body }
        } else {
            Self::ServerError { status, body }
        }
    }
}
