//! Domain-level error taxonomy for revq.

/// Benign outcome of interpreting a classifier reply that did not
/// match the expected `category, description` shape.
///
/// This is deliberately not a [`ReviewError`] variant: a malformed
/// reply degrades the single line it belongs to and must never abort
/// the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unparsable classifier reply: {raw}")]
pub struct UnparsableReply {
    /// The raw reply text as received from the backend.
    pub raw: String,
}

/// revq pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// Missing or malformed inputs. Fails fast, before any upstream call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-2xx response from an external API.
    #[error("upstream error: status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Network-level failure or timeout talking to an external API.
    #[error("transport error: {0}")]
    Transport(String),

    /// Anything unanticipated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ReviewError {
    /// Map a reqwest failure onto the taxonomy. Timeouts and
    /// connection failures are transport problems; response-body
    /// decode failures mean the upstream answered with an unexpected
    /// shape.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ReviewError::Transport(err.to_string())
        } else if err.is_decode() {
            ReviewError::Internal(format!("unexpected upstream payload: {err}"))
        } else {
            ReviewError::Transport(err.to_string())
        }
    }
}

/// Result type for revq domain operations.
pub type Result<T> = std::result::Result<T, ReviewError>;
