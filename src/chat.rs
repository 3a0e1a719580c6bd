//! Send cycle for one chat message
//!
//! A send is split in two halves so the UI can keep several requests in
//! flight: [`ChatInteractionHandler::begin`] validates the inputs and records
//! the user's message synchronously, [`ChatInteractionHandler::complete`]
//! performs the POST and records the server's answer. Completions append in
//! whatever order responses arrive.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::client::{HttpClient, QuestionRequest};
use crate::error::{ChatError, RequestFailure};
use crate::input::TextField;
use crate::message::Message;
use crate::transcript::TranscriptStore;

/// What to render when a successful response carries no `answer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingAnswerPolicy {
    /// Append a server message with empty text
    #[default]
    Empty,
    /// Treat the response as a failed request
    Fail,
}

impl FromStr for MissingAnswerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "empty" => Ok(MissingAnswerPolicy::Empty),
            "fail" => Ok(MissingAnswerPolicy::Fail),
            other => Err(format!("unknown policy '{other}', expected 'empty' or 'fail'")),
        }
    }
}

/// The two user-editable fields a send reads from
#[derive(Debug, Clone, Default)]
pub struct ChatInputs {
    pub endpoint: TextField,
    pub question: TextField,
}

impl ChatInputs {
    pub fn new(endpoint: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            endpoint: TextField::new(endpoint),
            question: TextField::new(question),
        }
    }
}

/// Snapshot of the inputs for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub endpoint_url: String,
    pub question_text: String,
}

impl RequestConfig {
    /// Only emptiness is checked. The URL is not validated and whitespace counts as content.
    pub fn from_inputs(inputs: &ChatInputs) -> Result<Self, ChatError> {
        if inputs.endpoint.is_empty() || inputs.question.is_empty() {
            return Err(ChatError::MissingInput);
        }

        Ok(Self {
            endpoint_url: inputs.endpoint.value().to_string(),
            question_text: inputs.question.value().to_string(),
        })
    }
}

/// A send whose user message is already in the transcript
#[derive(Debug)]
pub struct PendingSend {
    id: u64,
    config: RequestConfig,
}

#[derive(Clone)]
pub struct ChatInteractionHandler {
    client: Arc<dyn HttpClient>,
    transcript: Arc<dyn TranscriptStore>,
    policy: MissingAnswerPolicy,
    next_id: Arc<AtomicU64>,
}

impl ChatInteractionHandler {
    pub fn new(client: Arc<dyn HttpClient>, transcript: Arc<dyn TranscriptStore>) -> Self {
        Self {
            client,
            transcript,
            policy: MissingAnswerPolicy::default(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn with_policy(mut self, policy: MissingAnswerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Full send cycle. Returns the appended server message on success.
    pub async fn send_message(&self, inputs: &mut ChatInputs) -> Result<Message, ChatError> {
        let pending = self.begin(inputs)?;
        self.complete(pending).await
    }

    /// Validate the inputs, append the user's message and clear the question field.
    /// On `MissingInput` nothing is touched.
    pub fn begin(&self, inputs: &mut ChatInputs) -> Result<PendingSend, ChatError> {
        let config = RequestConfig::from_inputs(inputs)?;

        self.transcript.append(Message::user(config.question_text.as_str()));
        inputs.question.clear();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(send_id = id, endpoint = %config.endpoint_url, "Dispatching question");

        Ok(PendingSend { id, config })
    }

    /// Perform the request for a pending send. On success the server's answer is
    /// appended; on failure the detail is logged and the transcript is left alone.
    pub async fn complete(&self, pending: PendingSend) -> Result<Message, ChatError> {
        let PendingSend { id, config } = pending;

        match self.exchange(&config).await {
            Ok(answer) => {
                let message = Message::server(answer);
                self.transcript.append(message.clone());
                info!(send_id = id, "Received answer");
                Ok(message)
            }
            Err(failure) => {
                error!(
                    send_id = id,
                    endpoint = %config.endpoint_url,
                    error = %failure,
                    "Failed to send message"
                );
                Err(failure.into())
            }
        }
    }

    async fn exchange(&self, config: &RequestConfig) -> Result<String, RequestFailure> {
        let body = serde_json::to_value(QuestionRequest {
            question: &config.question_text,
        })?;

        let response = self.client.post_json(&config.endpoint_url, &body).await?;

        if !response.is_success() {
            return Err(RequestFailure::Status(response.status));
        }

        extract_answer(&response.body, self.policy)
    }
}

/// Pull the display text out of a response body
fn extract_answer(body: &str, policy: MissingAnswerPolicy) -> Result<String, RequestFailure> {
    let value: Value = serde_json::from_str(body)?;

    // `get` yields None for non-object bodies as well
    match value.get("answer") {
        Some(Value::String(answer)) => Ok(answer.clone()),
        Some(Value::Null) | None => match policy {
            MissingAnswerPolicy::Empty => Ok(String::new()),
            MissingAnswerPolicy::Fail => Err(RequestFailure::MissingAnswer),
        },
        Some(other) => Ok(other.to_string()),
    }
}
