//! Command encoding and reply decoding for the backend protocol.
//!
//! Requests are UTF-8 text of the form `VERB,payload`. The backend
//! splits on the *first* comma only, so payload text may itself contain
//! commas and newlines; framing is handled one level down (see
//! [`crate::frame`]). Replies are JSON objects with a `type` tag.

use consolechat_core::error::ServiceError;
use serde::Deserialize;

/// Parameters for the `LOAD` command. The same tuple is passed to the
/// backend process on its command line at spawn time.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadParams {
    pub model_path: String,
    pub port: u16,
    pub max_input_length: u32,
    pub max_output_length: u32,
    pub temperature: f32,
}

/// A request to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Load the model. Acknowledged with `status: loaded`.
    Load(LoadParams),
    /// Check whether the text fits the backend's input budget.
    Tokenize(String),
    /// Generate a continuation of the text.
    Generate(String),
    /// Terminate the backend. No reply is sent.
    Exit,
}

impl Command {
    /// Encode as the textual `VERB,payload` frame body.
    pub fn encode(&self) -> String {
        match self {
            Command::Load(p) => format!(
                "LOAD,{},{},{},{},{}",
                p.model_path, p.port, p.max_input_length, p.max_output_length, p.temperature
            ),
            Command::Tokenize(text) => format!("TOKENIZE,{text}"),
            Command::Generate(text) => format!("GENERATE,{text}"),
            // The backend matches the lowercase verb; payload is ignored.
            Command::Exit => "exit,".into(),
        }
    }

    /// The verb, for log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Load(_) => "LOAD",
            Command::Tokenize(_) => "TOKENIZE",
            Command::Generate(_) => "GENERATE",
            Command::Exit => "exit",
        }
    }
}

/// A decoded reply from the backend. Exactly one per request, in
/// request order.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceReply {
    /// A status acknowledgment (e.g. `loaded`).
    Status { message: String },
    /// Verdict of a tokenization check.
    TokenCheck { exceeded: bool },
    /// Generated continuation text.
    Generated { text: String },
    /// The backend reported a failure.
    Error { message: String },
}

/// The raw JSON shape. Reply tags vary between backend versions
/// (`status` for everything vs. `tokenize`/`generate` per verb), so
/// classification also looks at which fields are present.
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "maxLengthExceeded")]
    max_length_exceeded: Option<bool>,
}

/// Decode a reply frame body into a [`ServiceReply`].
///
/// An unrecognized tag or a tag without its required field is a
/// protocol error, not a backend error.
pub fn decode_reply(body: &[u8]) -> Result<ServiceReply, ServiceError> {
    let raw: RawReply = serde_json::from_slice(body).map_err(|e| {
        ServiceError::Protocol(format!(
            "reply is not a valid JSON object: {e} (got {:?})",
            String::from_utf8_lossy(&body[..body.len().min(128)])
        ))
    })?;

    match raw.kind.as_str() {
        "error" => Ok(ServiceReply::Error {
            message: raw
                .message
                .unwrap_or_else(|| "backend sent an error without a message".into()),
        }),
        "tokenize" => match raw.max_length_exceeded {
            Some(exceeded) => Ok(ServiceReply::TokenCheck { exceeded }),
            None => Err(ServiceError::Protocol(
                "tokenize reply is missing maxLengthExceeded".into(),
            )),
        },
        "generate" => match raw.message {
            Some(text) => Ok(ServiceReply::Generated { text }),
            None => Err(ServiceError::Protocol(
                "generate reply is missing message".into(),
            )),
        },
        "status" => {
            if let Some(exceeded) = raw.max_length_exceeded {
                Ok(ServiceReply::TokenCheck { exceeded })
            } else if let Some(message) = raw.message {
                Ok(ServiceReply::Status { message })
            } else {
                Err(ServiceError::Protocol(
                    "status reply carries neither message nor maxLengthExceeded".into(),
                ))
            }
        }
        other => Err(ServiceError::Protocol(format!(
            "unrecognized reply tag: {other:?}"
        ))),
    }
}
