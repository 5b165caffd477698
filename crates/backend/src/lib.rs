//! Backend wire protocol and process supervision for ConsoleChat.
//!
//! The generation backend is an external process that owns the model,
//! the tokenizer, and the real input budget. This crate provides:
//!
//! - [`wire`] — command encoding (`VERB,payload` inside length-prefixed
//!   frames) and typed JSON reply decoding
//! - [`ServiceClient`] — one TCP connection, strict one-request-at-a-
//!   time, bounded per-request wait
//! - [`BackendProcess`] — spawn/kill the backend and relay its output
//!   into the log

pub mod client;
pub mod frame;
pub mod process;
pub mod wire;

pub use client::ServiceClient;
pub use process::BackendProcess;
pub use wire::{Command, LoadParams, ServiceReply};
