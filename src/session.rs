//! Session driver.
//!
//! Owns the transcript for one conversation and runs either the interactive
//! chat loop or a single question.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::bridge::{BridgeError, ChatBackend, ChatSettings};
use crate::client::Console;
use crate::protocol::Transcript;

/// Persona sent as the first message of every conversation.
pub const SYSTEM_PROMPT: &str = "\
You are TeachMeFinance, a *financial education* assistant.
Your goals:
- Explain personal-finance concepts clearly (budgeting, saving, emergency funds, diversification, index funds, retirement accounts, risk tolerance).
- Be concise, structured, and beginner-friendly; use examples or rules of thumb where helpful.
- You are **not** a financial advisor; avoid personalized investment advice or fiduciary recommendations.
- If the user asks for individualized advice, provide general education and suggest consulting a licensed professional for personal recommendations.
- Avoid giving tax/legal advice; you may explain general concepts with disclaimers.
- When math is needed, show steps briefly and state assumptions.
";

/// Process exit status for a failed `ask`.
pub const EXIT_FAILURE: i32 = 1;

/// One conversation: the system prompt followed by user/assistant turns.
pub struct Session {
    transcript: Transcript,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::with_system(SYSTEM_PROMPT),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Ask one question in the context of the conversation so far.
    ///
    /// The question is recorded before the call. The answer is only recorded
    /// on success, so a failed turn leaves the question unanswered in the
    /// transcript.
    pub async fn exchange(
        &mut self,
        backend: &dyn ChatBackend,
        settings: &ChatSettings,
        question: &str,
    ) -> Result<String, BridgeError> {
        self.transcript.push_user(question);
        let answer = backend.send(settings, &self.transcript).await?;
        self.transcript.push_assistant(answer.clone());
        Ok(answer)
    }
}

/// Whether a (trimmed) line ends the session.
pub fn is_exit_command(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Run the interactive loop until `exit`, `quit` or end of input.
///
/// Each turn reads a line, sends it, and shows either the answer or the
/// error before prompting again. Returns the finished session.
pub async fn run_interactive<R, W>(
    backend: &dyn ChatBackend,
    settings: &ChatSettings,
    input: R,
    console: &mut Console<W>,
) -> Result<Session>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = Session::new();
    let mut lines = input.lines();

    console.banner(&settings.model)?;

    loop {
        console.prompt()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            console.line_break()?;
            info!("end of input, leaving chat");
            break;
        };

        let question = line.trim();
        if is_exit_command(question) {
            info!("leaving chat");
            break;
        }

        debug!(turn = session.transcript().len(), "sending question");
        match session.exchange(backend, settings, question).await {
            Ok(answer) => console.answer(&answer)?,
            Err(e) => {
                debug!(error = %e, "chat exchange failed");
                console.error(&e)?;
            }
        }
    }

    Ok(session)
}

/// Answer a single question with a fresh two-message transcript.
pub async fn ask(
    backend: &dyn ChatBackend,
    settings: &ChatSettings,
    question: &str,
) -> Result<String, BridgeError> {
    let mut transcript = Transcript::with_system(SYSTEM_PROMPT);
    transcript.push_user(question);
    backend.send(settings, &transcript).await
}

/// Run `ask`, printing the answer to `out` or the error to `err`.
///
/// Returns the process exit status.
pub async fn run_ask(
    backend: &dyn ChatBackend,
    settings: &ChatSettings,
    question: &str,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<i32> {
    match ask(backend, settings, question).await {
        Ok(answer) => {
            writeln!(out, "{}", answer)?;
            Ok(0)
        }
        Err(e) => {
            debug!(error = %e, "ask failed");
            writeln!(err, "Error: {}", e)?;
            Ok(EXIT_FAILURE)
        }
    }
}
