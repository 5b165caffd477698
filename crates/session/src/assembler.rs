//! Context-window assembly — the core negotiation loop.
//!
//! The backend owns the tokenizer and the model-specific input limit,
//! so the only way to learn whether a window fits is to ask it. The
//! assembler grows a candidate window backward from the newest message,
//! one message and one round trip at a time, and keeps the last window
//! the backend confirmed. The initializer is always the first line of
//! every candidate and is never part of the trimmable suffix.
//!
//! # Determinism
//!
//! Assembly is read-only with respect to the log and issues no request
//! beyond the first failed check, so for a fixed history and fixed
//! backend verdicts two consecutive runs produce the same window.

use consolechat_core::error::ServiceError;
use consolechat_core::message::ChatLog;
use consolechat_core::service::LanguageService;

/// A window the backend confirmed to fit, ready for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledWindow {
    /// The rendered context: initializer + suffix + generation marker.
    pub text: String,
    /// Index into the log where the included suffix starts.
    pub start: usize,
    /// Number of history messages included.
    pub messages_included: usize,
    /// Round trips spent on this assembly.
    pub checks_issued: usize,
}

/// Outcome of one assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    /// The largest confirmed-fitting window.
    Window(AssembledWindow),
    /// Even `initializer + newest message + marker` exceeds the budget.
    Unfittable { checks_issued: usize },
}

/// The context assembler. Stateless — create one and reuse it.
pub struct ContextAssembler {
    /// Generation marker appended to every candidate (the assistant
    /// label, telling the backend where to continue).
    marker: String,
}

impl ContextAssembler {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Find the maximal contiguous history suffix, ending at the newest
    /// message, whose rendering the backend confirms to fit.
    ///
    /// # Algorithm
    ///
    /// 1. Candidate = newest message only.
    /// 2. Ask `check_fits`. On "exceeded", stop immediately — the
    ///    previously confirmed window (if any) stands.
    /// 3. On fit, record the candidate; if the oldest message is
    ///    already included, stop. Otherwise grow by one older message
    ///    (kept in chronological order after the initializer) and
    ///    repeat.
    ///
    /// Issues at most `log.len()` round trips. The caller must have
    /// appended the turn's user message before calling; an empty log
    /// has no suffix to send and reports [`Assembly::Unfittable`].
    pub async fn assemble<S: LanguageService>(
        &self,
        service: &mut S,
        log: &ChatLog,
    ) -> Result<Assembly, ServiceError> {
        let n = log.len();
        let mut accepted: Option<(String, usize)> = None;
        let mut checks_issued = 0;

        for start in (0..n).rev() {
            let candidate = log.render_window(start, &self.marker);
            checks_issued += 1;

            let verdict = service.check_fits(&candidate).await?;
            tracing::debug!(
                start,
                candidate_messages = n - start,
                exceeded = verdict.exceeded,
                "window check"
            );
            if verdict.exceeded {
                break;
            }

            accepted = Some((candidate, start));
        }

        match accepted {
            Some((text, start)) => {
                let window = AssembledWindow {
                    text,
                    start,
                    messages_included: n - start,
                    checks_issued,
                };
                tracing::debug!(
                    included = window.messages_included,
                    dropped = window.start,
                    checks = checks_issued,
                    "context window assembled"
                );
                Ok(Assembly::Window(window))
            }
            None => {
                tracing::warn!(history_len = n, checks = checks_issued, "no window fits");
                Ok(Assembly::Unfittable { checks_issued })
            }
        }
    }
}
