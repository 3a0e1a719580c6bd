use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::TransportError;

/// Request body sent to the chat endpoint
#[derive(Debug, Serialize)]
pub struct QuestionRequest<'a> {
    pub question: &'a str,
}

/// Raw response as received, before any status or body interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used by the chat handler. Implementations only move bytes;
/// they must not treat non-2xx statuses as errors.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

#[derive(Clone, Default)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        // `json` sets Content-Type: application/json
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
