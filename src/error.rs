use thiserror::Error;

pub const MISSING_INPUT_ALERT: &str = "Please enter both URL and message.";
pub const REQUEST_FAILURE_ALERT: &str = "Failed to send message. Check the log for details.";

/// Failure raised by an `HttpClient` before any response was received
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Everything that can go wrong after a request has been dispatched.
/// All variants are reported to the user the same way.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid JSON in response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("response has no answer field")]
    MissingAnswer,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("missing input: endpoint and message are both required")]
    MissingInput,

    #[error("request failed: {0}")]
    RequestFailure(#[from] RequestFailure),
}

impl ChatError {
    /// Text shown in the user-facing alert. Request failures carry no detail here;
    /// the detail goes to the log.
    pub fn alert_text(&self) -> &'static str {
        match self {
            ChatError::MissingInput => MISSING_INPUT_ALERT,
            ChatError::RequestFailure(_) => REQUEST_FAILURE_ALERT,
        }
    }
}
