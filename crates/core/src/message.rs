//! Message and chat-log domain types.
//!
//! These are the value objects that flow through the system: the user
//! types a line → [`ChatLog`] records it → the assembler renders a
//! window of it → the backend generates a continuation → the log
//! records that too.

use serde::{Deserialize, Serialize};

/// The fixed author label of the chat initializer.
///
/// The initializer is conceptually prepended before all history and is
/// never dropped from a rendered window.
pub const INITIALIZER_AUTHOR: &str = "Initial Prompt: ";

/// A single chat message. Immutable once created.
///
/// `author` is a display label (the initializer label, the configured
/// user label, or the configured assistant label), not an identity. The
/// backend infers conversation structure purely from these labels in
/// the rendered text, so they double as delimiters on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who said this (display label, rendered verbatim).
    pub author: String,

    /// The text content.
    pub content: String,
}

impl Message {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
        }
    }

    /// Render this message as a single context line: author label
    /// immediately followed by content, no separator.
    pub fn render(&self) -> String {
        format!("{}{}", self.author, self.content)
    }
}

/// The conversation history: one initializer plus an append-only,
/// chronologically ordered message sequence.
///
/// Nothing ever removes or reorders an entry. Trimming for the token
/// budget happens only in the rendered projection
/// ([`ChatLog::render_window`]), never in the log itself.
#[derive(Debug, Clone)]
pub struct ChatLog {
    initializer: Message,
    messages: Vec<Message>,
}

impl ChatLog {
    /// Create an empty log with the given initializer text.
    pub fn new(initializer_content: impl Into<String>) -> Self {
        Self {
            initializer: Message::new(INITIALIZER_AUTHOR, initializer_content),
            messages: Vec::new(),
        }
    }

    /// Append a message. The only mutation the log supports.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn initializer(&self) -> &Message {
        &self.initializer
    }

    /// Read-only view of the history, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Render the transmitted context for the suffix starting at
    /// `start`: initializer line, then `messages[start..]` one line
    /// each, then the generation marker (the assistant label, telling
    /// the backend where to continue). Lines are joined with `\n`.
    ///
    /// The initializer is always the first line, regardless of `start`.
    /// `start == len` renders initializer and marker only.
    ///
    /// # Panics
    ///
    /// Panics if `start` is past the end of the history.
    pub fn render_window(&self, start: usize, marker: &str) -> String {
        assert!(
            start <= self.messages.len(),
            "window start {start} is out of bounds for a history of {} messages",
            self.messages.len()
        );
        let mut lines = Vec::with_capacity(self.messages.len() - start + 2);
        lines.push(self.initializer.render());
        for message in &self.messages[start..] {
            lines.push(message.render());
        }
        lines.push(marker.to_string());
        lines.join("\n")
    }
}
