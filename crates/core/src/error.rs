//! Error types for the ConsoleChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the top-level [`Error`]
//! wraps them for callers that don't care which layer failed.

use thiserror::Error;

/// The top-level error type for all ConsoleChat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Service protocol errors ---
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    // --- Channel / transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures reported by or about the generation service.
///
/// All variants terminate the current turn; none are retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The reply could not be decoded, or its tag was not recognized.
    #[error("Malformed service reply: {0}")]
    Protocol(String),

    /// The backend explicitly replied with `type: "error"`.
    #[error("Backend reported an error: {0}")]
    Backend(String),

    /// The LOAD command was not acknowledged with `loaded`.
    #[error("Model load failed: {0}")]
    Load(String),

    /// The channel itself failed.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// Failures of the request/response channel to the backend process.
///
/// These are fatal: the caller must tear down the connection and
/// terminate the backend process.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to backend at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("Failed to send request: {0}")]
    Send(String),

    #[error("Failed to receive reply: {0}")]
    Recv(String),

    #[error("No reply from backend within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Reply frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Failed to spawn backend process: {0}")]
    Spawn(String),
}
