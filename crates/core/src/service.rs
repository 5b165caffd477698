//! LanguageService trait — the abstraction over the generation backend.
//!
//! A LanguageService answers exactly two questions about a rendered
//! context: "does it fit your input budget?" and "what comes next?".
//! The backend owns the tokenizer and the model-specific maximum, so
//! the client never estimates token counts itself.
//!
//! The protocol is strict request/response with no request identifiers:
//! a second request must never be issued while a reply is outstanding.
//! Methods take `&mut self` so that single-in-flight discipline is
//! enforced by construction rather than by a lock or a queue.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// The backend's verdict on a tokenization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCheck {
    /// Whether the submitted text would exceed the backend's input
    /// budget (which may be lower than the configured maximum).
    pub exceeded: bool,
}

/// The seam between the session logic and the wire client.
///
/// The concrete TCP client implements this; tests script it.
#[async_trait]
pub trait LanguageService: Send {
    /// Ask whether `text` fits the backend's input budget.
    async fn check_fits(&mut self, text: &str) -> Result<TokenCheck, ServiceError>;

    /// Generate a continuation of `text`.
    async fn generate(&mut self, text: &str) -> Result<String, ServiceError>;
}
