//! ChatSession — one-turn orchestration over the append-only log.
//!
//! A turn is strictly sequential: append the user message, assemble a
//! window, generate, append the reply. The session holds the service by
//! value and every step takes `&mut self`, so a new turn cannot start
//! while a previous one is in flight.

use consolechat_core::error::ServiceError;
use consolechat_core::message::{ChatLog, Message};
use consolechat_core::service::LanguageService;

use crate::assembler::{Assembly, ContextAssembler};

/// Result of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The backend produced a continuation; it has been appended to
    /// the log.
    Reply(String),
    /// Not even the newest message fits the input budget. The user
    /// message stays in the log (the log is never rolled back); the
    /// caller should ask the user to shorten their input.
    Unfittable,
}

/// A single conversation against one backend service.
pub struct ChatSession<S: LanguageService> {
    log: ChatLog,
    service: S,
    assembler: ContextAssembler,
    user_label: String,
    assistant_label: String,
}

impl<S: LanguageService> ChatSession<S> {
    pub fn new(
        service: S,
        initializer: impl Into<String>,
        user_label: impl Into<String>,
        assistant_label: impl Into<String>,
    ) -> Self {
        let assistant_label = assistant_label.into();
        Self {
            log: ChatLog::new(initializer),
            assembler: ContextAssembler::new(assistant_label.clone()),
            service,
            user_label: user_label.into(),
            assistant_label,
        }
    }

    /// Read-only view of the conversation so far.
    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    /// Run one full turn for the given user input.
    ///
    /// On an unfittable turn the generation endpoint is never
    /// contacted. On a service error the turn is fatal; the user
    /// message remains recorded but no assistant message is appended.
    pub async fn process_turn(&mut self, user_text: &str) -> Result<TurnOutcome, ServiceError> {
        self.log
            .push(Message::new(self.user_label.clone(), user_text));

        let window = match self.assembler.assemble(&mut self.service, &self.log).await? {
            Assembly::Window(window) => window,
            Assembly::Unfittable { .. } => return Ok(TurnOutcome::Unfittable),
        };

        let reply = self.service.generate(&window.text).await?;
        self.log
            .push(Message::new(self.assistant_label.clone(), reply.clone()));
        Ok(TurnOutcome::Reply(reply))
    }

    /// Tear down, handing the service back for its shutdown path.
    pub fn into_service(self) -> S {
        self.service
    }
}
