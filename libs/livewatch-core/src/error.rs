use thiserror::Error;

/// Input validation failures. Surfaced to the caller as-is and never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("not a link to {expected}: {input}")]
    InvalidSource { input: String, expected: String },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Transient failure of a single probe. Always absorbed into an inconclusive result.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout
        } else if err.is_body() || err.is_decode() {
            ProbeError::Body(err)
        } else {
            ProbeError::Transport(err)
        }
    }
}
