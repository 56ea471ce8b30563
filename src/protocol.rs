//! Wire types for the Ollama chat API.
//!
//! Requests are sent non-streaming; the answer is pulled out of whichever
//! known response shape the server returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered conversation history. The system message, when present, is always
/// first and only ever set at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript with the given system prompt.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
    pub options: ChatOptions,
}

/// Sampling options forwarded to the model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChatOptions {
    pub temperature: f64,
    pub num_predict: u32,
}

/// Pulls an answer out of one particular response shape.
type ShapeMatcher = fn(&Value) -> Option<String>;

/// Known response shapes, tried in order.
const RESPONSE_SHAPES: &[(&str, ShapeMatcher)] = &[
    ("message.content", message_content),
    ("response", response_field),
];

/// `{"message": {"content": "..."}}`, the documented non-streaming shape.
fn message_content(body: &Value) -> Option<String> {
    body.get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// `{"response": ...}`, as returned by `/api/generate` style builds.
fn response_field(body: &Value) -> Option<String> {
    match body.get("response")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Extract the trimmed answer text from a parsed response body.
///
/// Returns `None` when the body matches none of the known shapes.
pub fn extract_answer(body: &Value) -> Option<String> {
    RESPONSE_SHAPES.iter().find_map(|(name, matcher)| {
        matcher(body).map(|answer| {
            tracing::debug!(shape = *name, "matched response shape");
            answer.trim().to_string()
        })
    })
}
