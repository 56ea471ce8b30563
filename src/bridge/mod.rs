//! Request/response bridge to the inference server.
//!
//! The session driver talks to a [`ChatBackend`]; [`ollama::OllamaBridge`] is
//! the only real implementation.

pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::Transcript;

pub use ollama::OllamaBridge;

/// Model and sampling settings for a chat call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    /// Model name, passed through to the server verbatim.
    pub model: String,
    /// Sampling temperature. Not clamped; the server validates it.
    pub temperature: f64,
    /// Output token budget (`num_predict`).
    pub max_tokens: u32,
}

/// Failure of a single chat exchange.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Connection failure, timeout or non-success HTTP status.
    #[error("Ollama request failed: {0}")]
    Transport(String),
    /// The server answered, but with a body we don't recognize.
    #[error("Unexpected Ollama response schema")]
    Schema,
}

/// Something that can answer a transcript.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the transcript and return the trimmed answer text.
    ///
    /// Issues exactly one request and never retries.
    async fn send(&self, settings: &ChatSettings, transcript: &Transcript)
        -> Result<String, BridgeError>;
}
