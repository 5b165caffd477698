//! ServiceClient — the one-request-at-a-time wire client.
//!
//! Owns the single channel to the backend process. Strict FIFO 1:1
//! request/response is enforced by construction: every operation takes
//! `&mut self` and runs send-then-receive to completion before
//! returning, so a second request cannot exist while a reply is
//! outstanding. There is no queue and there are no retries.

use std::time::Duration;

use async_trait::async_trait;
use consolechat_config::BackendConfig;
use consolechat_core::error::{ServiceError, TransportError};
use consolechat_core::service::{LanguageService, TokenCheck};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::frame::{read_frame, write_frame};
use crate::wire::{decode_reply, Command, LoadParams, ServiceReply};

/// Client for the generation backend's request/response channel.
///
/// Generic over the stream so tests can drive it over an in-memory
/// duplex; production code uses [`ServiceClient::connect`].
#[derive(Debug)]
pub struct ServiceClient<S = TcpStream> {
    stream: S,
    timeout: Duration,
    peer: String,
}

impl ServiceClient<TcpStream> {
    /// Connect to a freshly spawned backend.
    ///
    /// The backend needs a moment to bind its socket, so the connect is
    /// retried with backoff, bounded by `startup_max_attempts`. There
    /// is deliberately no fixed startup sleep.
    pub async fn connect(backend: &BackendConfig) -> Result<Self, TransportError> {
        let addr = format!("{}:{}", backend.host, backend.port);
        let backoff = Duration::from_millis(backend.startup_backoff_ms);
        let mut last_error = String::new();

        for attempt in 1..=backend.startup_max_attempts {
            match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    tracing::debug!(%addr, attempt, "connected to backend");
                    return Ok(Self::from_stream(
                        stream,
                        Duration::from_secs(backend.request_timeout_secs),
                        addr,
                    ));
                }
                Err(e) => {
                    tracing::debug!(%addr, attempt, error = %e, "backend not ready yet");
                    last_error = e.to_string();
                    if attempt < backend.startup_max_attempts {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(TransportError::Connect {
            addr,
            reason: format!(
                "{last_error} (after {} attempts)",
                backend.startup_max_attempts
            ),
        })
    }
}

impl<S> ServiceClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-connected stream.
    pub fn from_stream(stream: S, timeout: Duration, peer: String) -> Self {
        Self {
            stream,
            timeout,
            peer,
        }
    }

    /// Send one command and await its reply, with a bounded wait.
    ///
    /// An `Error`-tagged reply is classified here so every operation
    /// surfaces it uniformly as [`ServiceError::Backend`].
    async fn request(&mut self, command: &Command) -> Result<ServiceReply, ServiceError> {
        let body = command.encode();
        tracing::debug!(verb = command.verb(), bytes = body.len(), "sending request");

        write_frame(&mut self.stream, body.as_bytes())
            .await
            .map_err(ServiceError::Transport)?;

        let reply_body = tokio::time::timeout(self.timeout, read_frame(&mut self.stream))
            .await
            .map_err(|_| {
                ServiceError::Transport(TransportError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            })?
            .map_err(ServiceError::Transport)?;

        match decode_reply(&reply_body)? {
            ServiceReply::Error { message } => Err(ServiceError::Backend(message)),
            reply => Ok(reply),
        }
    }

    /// Load the model. Succeeds only on `status: loaded`.
    pub async fn load(&mut self, params: &LoadParams) -> Result<(), ServiceError> {
        tracing::info!(peer = %self.peer, model = %params.model_path, "loading model");
        match self.request(&Command::Load(params.clone())).await? {
            ServiceReply::Status { message } if message == "loaded" => Ok(()),
            other => Err(ServiceError::Load(format!(
                "backend did not acknowledge load: {other:?}"
            ))),
        }
    }

    /// Tell the backend to terminate. Fire-and-forget: no reply is
    /// awaited and send failures are only logged, since the process is
    /// being torn down anyway.
    pub async fn shutdown(mut self) {
        if let Err(e) = write_frame(&mut self.stream, Command::Exit.encode().as_bytes()).await {
            tracing::debug!(error = %e, "exit command not delivered");
        }
    }
}

#[async_trait]
impl<S> LanguageService for ServiceClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn check_fits(&mut self, text: &str) -> Result<TokenCheck, ServiceError> {
        match self.request(&Command::Tokenize(text.into())).await? {
            ServiceReply::TokenCheck { exceeded } => Ok(TokenCheck { exceeded }),
            other => Err(ServiceError::Protocol(format!(
                "expected a token check reply, got {other:?}"
            ))),
        }
    }

    async fn generate(&mut self, text: &str) -> Result<String, ServiceError> {
        match self.request(&Command::Generate(text.into())).await? {
            ServiceReply::Generated { text } => Ok(text),
            // older backends tag generated text as a plain status
            ServiceReply::Status { message } => Ok(message),
            other => Err(ServiceError::Protocol(format!(
                "expected generated text, got {other:?}"
            ))),
        }
    }
}
