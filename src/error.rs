//! Error types for the mail.tm client.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for all mail.tm client operations.
pub enum Error {
    /// Underlying HTTP client error (connection, TLS, timeouts).
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    /// HTTP response returned a non-success status with body.
    ///
    /// Status 429 never reaches callers while rate-limit handling is
    /// enabled; it is absorbed by the retry loop in the connection
    /// manager. A 401 here means the token is stale or the credentials
    /// are wrong and the caller must re-authenticate.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// JSON serialization or deserialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The requested domain is not in the active-domains list.
    #[error("domain not available: {0}")]
    DomainNotAvailable(String),
    /// The API currently offers no active domain to build an address with.
    #[error("no active domain available")]
    NoActiveDomain,
    /// The event-stream connection failed or was closed by the server.
    #[error("event stream error: {0}")]
    Stream(String),
    /// A single event payload could not be decoded.
    ///
    /// Recoverable: the subscription stays open and the next event can
    /// still be consumed.
    #[error("could not decode event payload: {0}")]
    EventDecode(String),
}

impl Error {
    /// The HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Request(e) => e.status(),
            _ => None,
        }
    }

    /// True when the server rejected the credentials or token (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Result type for mail.tm client operations.
pub type Result<T> = std::result::Result<T, Error>;
