//! # ConsoleChat Core
//!
//! Domain types, traits, and error definitions for the ConsoleChat
//! terminal client. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The generation backend is reachable only through the
//! [`LanguageService`] trait defined here. The concrete wire client
//! lives in its own crate; tests substitute scripted implementations.
//! All crates depend inward on core.

pub mod error;
pub mod message;
pub mod service;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, ServiceError, TransportError};
pub use message::{ChatLog, Message, INITIALIZER_AUTHOR};
pub use service::{LanguageService, TokenCheck};
