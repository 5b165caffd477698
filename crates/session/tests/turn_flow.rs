//! End-to-end turn tests: a `ChatSession` over a scripted service.
//!
//! The scripted service answers fit checks by line count (each message
//! renders as one line, so the line count is a faithful stand-in for
//! the backend's token count) and records every request it sees.

use consolechat_core::error::ServiceError;
use consolechat_core::message::Message;
use consolechat_core::service::{LanguageService, TokenCheck};
use consolechat_session::{ChatSession, TurnOutcome};

// ── Scripted service ─────────────────────────────────────────────────────

struct ScriptedService {
    /// Windows with more lines than this "exceed the budget".
    max_lines: usize,
    /// Canned generation output.
    reply: String,
    /// Fail the next generate call with a backend error.
    fail_generate: bool,
    check_log: Vec<String>,
    generate_log: Vec<String>,
}

impl ScriptedService {
    fn with_budget(max_lines: usize) -> Self {
        Self {
            max_lines,
            reply: "scripted reply".into(),
            fail_generate: false,
            check_log: Vec::new(),
            generate_log: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl LanguageService for ScriptedService {
    async fn check_fits(&mut self, text: &str) -> Result<TokenCheck, ServiceError> {
        self.check_log.push(text.to_string());
        Ok(TokenCheck {
            exceeded: text.lines().count() > self.max_lines,
        })
    }

    async fn generate(&mut self, text: &str) -> Result<String, ServiceError> {
        self.generate_log.push(text.to_string());
        if self.fail_generate {
            return Err(ServiceError::Backend("generation blew up".into()));
        }
        Ok(self.reply.clone())
    }
}

fn session(service: ScriptedService) -> ChatSession<ScriptedService> {
    ChatSession::new(service, "Be helpful.", "User: ", "Bot: ")
}

// ── Scenario A: budget fits everything ───────────────────────────────────

#[tokio::test]
async fn full_history_window_when_everything_fits() {
    let mut sess = session(ScriptedService::with_budget(usize::MAX));
    sess.process_turn("u1").await.unwrap();
    sess.process_turn("u2").await.unwrap();

    let outcome = sess.process_turn("u3").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Reply("scripted reply".into()));

    let service = sess.into_service();
    // the generate call carried the entire history
    let sent = service.generate_log.last().unwrap();
    assert_eq!(
        sent,
        "Initial Prompt: Be helpful.\n\
         User: u1\nBot: scripted reply\n\
         User: u2\nBot: scripted reply\n\
         User: u3\nBot: "
    );
}

// ── Scenario B: budget fits only the newest message ──────────────────────

#[tokio::test]
async fn newest_only_window_under_tight_budget() {
    // 3 lines: initializer + one message + marker
    let mut sess = session(ScriptedService::with_budget(3));
    sess.process_turn("u1").await.unwrap();
    sess.process_turn("u2").await.unwrap();

    let outcome = sess.process_turn("u3").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Reply(_)));

    let service = sess.into_service();
    assert_eq!(
        service.generate_log.last().unwrap(),
        "Initial Prompt: Be helpful.\nUser: u3\nBot: "
    );
}

// ── Scenario C: unfittable turn ──────────────────────────────────────────

#[tokio::test]
async fn unfittable_turn_skips_generation_and_keeps_message() {
    // even initializer + newest + marker (3 lines) is too big
    let mut sess = session(ScriptedService::with_budget(2));

    let outcome = sess.process_turn("a very long message").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Unfittable);

    // the user message stays recorded; no assistant entry, no generate
    assert_eq!(sess.log().len(), 1);
    assert_eq!(sess.log().messages()[0].content, "a very long message");
    let service = sess.into_service();
    assert!(service.generate_log.is_empty());
    assert_eq!(service.check_log.len(), 1);
}

#[tokio::test]
async fn unfittable_turns_keep_accumulating() {
    // append-only by design: an unfittable message is never removed,
    // so the log keeps growing across failed turns.
    let mut sess = session(ScriptedService::with_budget(2));
    assert_eq!(
        sess.process_turn("too long").await.unwrap(),
        TurnOutcome::Unfittable
    );
    assert_eq!(
        sess.process_turn("also fine").await.unwrap(),
        TurnOutcome::Unfittable
    );
    assert_eq!(sess.log().len(), 2);
}

// ── Fatal turn failure ───────────────────────────────────────────────────

#[tokio::test]
async fn generate_failure_propagates_without_assistant_entry() {
    let mut service = ScriptedService::with_budget(usize::MAX);
    service.fail_generate = true;
    let mut sess = session(service);

    let err = sess.process_turn("hello").await.unwrap_err();
    assert!(matches!(err, ServiceError::Backend(_)));

    // the user message was appended before the failure and stays
    assert_eq!(sess.log().len(), 1);
    assert_eq!(sess.log().messages()[0].author, "User: ");
}

// ── Invariants across turns ──────────────────────────────────────────────

#[tokio::test]
async fn history_is_append_only_across_turn_outcomes() {
    let mut sess = session(ScriptedService::with_budget(3));

    sess.process_turn("first").await.unwrap();
    let snapshot: Vec<Message> = sess.log().messages().to_vec();

    sess.process_turn("second").await.unwrap();
    sess.process_turn("third").await.unwrap();

    // prior entries are never reordered or removed
    assert!(sess.log().len() > snapshot.len());
    assert_eq!(&sess.log().messages()[..snapshot.len()], &snapshot[..]);
}

#[tokio::test]
async fn every_checked_window_is_anchored() {
    let mut sess = session(ScriptedService::with_budget(4));
    sess.process_turn("u1").await.unwrap();
    sess.process_turn("u2").await.unwrap();
    sess.process_turn("u3").await.unwrap();

    let service = sess.into_service();
    assert!(!service.check_log.is_empty());
    for window in &service.check_log {
        assert!(window.starts_with("Initial Prompt: Be helpful.\n"));
        assert!(window.ends_with("\nBot: "));
    }
}

#[tokio::test]
async fn check_count_is_bounded_by_history_length() {
    let mut sess = session(ScriptedService::with_budget(usize::MAX));
    sess.process_turn("u1").await.unwrap(); // history: 1 → 1 check
    sess.process_turn("u2").await.unwrap(); // history: 3 → 3 checks
    sess.process_turn("u3").await.unwrap(); // history: 5 → 5 checks

    let service = sess.into_service();
    assert_eq!(service.check_log.len(), 1 + 3 + 5);
}
