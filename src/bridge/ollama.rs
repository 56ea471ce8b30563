//! Ollama chat bridge.
//!
//! Posts the whole transcript to `/api/chat` with streaming disabled and
//! returns the assistant's answer.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{BridgeError, ChatBackend, ChatSettings};
use crate::protocol::{extract_answer, ChatOptions, ChatRequest, Transcript};

/// Per-request client timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Bridge to an Ollama server.
pub struct OllamaBridge {
    base_url: String,
    client: Client,
}

impl OllamaBridge {
    /// Create a bridge with the default 120 second timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BridgeError> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Create a bridge with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a bridge around an existing HTTP client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for OllamaBridge {
    async fn send(
        &self,
        settings: &ChatSettings,
        transcript: &Transcript,
    ) -> Result<String, BridgeError> {
        let url = self.chat_url();

        let request = ChatRequest {
            model: &settings.model,
            messages: transcript.messages(),
            stream: false,
            options: ChatOptions {
                temperature: settings.temperature,
                num_predict: settings.max_tokens,
            },
        };

        debug!(
            url = %url,
            model = %settings.model,
            messages = transcript.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(describe(&e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, "chat request rejected");
            return Err(BridgeError::Transport(format!(
                "server returned status {}: {}",
                status,
                body.trim()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::Transport(describe(&e)))?;

        let data: Value = serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "response body is not JSON");
            BridgeError::Schema
        })?;

        extract_answer(&data).ok_or_else(|| {
            debug!(body = %body, "no recognized answer field in response");
            BridgeError::Schema
        })
    }
}

/// Flatten a reqwest error and its sources into one line.
fn describe(err: &reqwest::Error) -> String {
    let mut message = if err.is_timeout() {
        format!("request timed out ({})", err)
    } else {
        err.to_string()
    };
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
