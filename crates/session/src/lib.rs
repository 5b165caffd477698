//! Context-window assembly and turn orchestration for ConsoleChat.
//!
//! [`ContextAssembler`] negotiates, one token-count round trip at a
//! time, how much trailing history fits the backend's input budget.
//! [`ChatSession`] owns the append-only chat log and drives one turn:
//! append user input, assemble, generate, append the reply.

pub mod assembler;
pub mod session;

pub use assembler::{AssembledWindow, Assembly, ContextAssembler};
pub use session::{ChatSession, TurnOutcome};
