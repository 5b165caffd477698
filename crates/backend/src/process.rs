//! Backend process supervision.
//!
//! The generation backend is spawned once at session start and must be
//! gone by the time the host process exits, on every exit path. The
//! child is created with `kill_on_drop` so even a panic unwinding past
//! the supervisor takes the backend down; orderly shutdown goes through
//! [`BackendProcess::kill`] after the exit command has been sent.

use std::process::Stdio;

use consolechat_config::BackendConfig;
use consolechat_core::error::TransportError;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::wire::LoadParams;

/// Handle to the spawned backend process.
pub struct BackendProcess {
    child: Child,
}

impl BackendProcess {
    /// Spawn the backend script with the load tuple on its command
    /// line, mirroring the `LOAD` payload. Stdout and stderr are
    /// relayed line-by-line into the log.
    pub fn spawn(backend: &BackendConfig, params: &LoadParams) -> Result<Self, TransportError> {
        let mut child = Command::new(&backend.interpreter)
            .arg(&backend.script)
            .arg(&params.model_path)
            .arg(params.port.to_string())
            .arg(params.max_input_length.to_string())
            .arg(params.max_output_length.to_string())
            .arg(params.temperature.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TransportError::Spawn(format!(
                    "{} {}: {e}",
                    backend.interpreter, backend.script
                ))
            })?;

        if let Some(stdout) = child.stdout.take() {
            relay_output(stdout, false);
        }
        if let Some(stderr) = child.stderr.take() {
            relay_output(stderr, true);
        }

        tracing::info!(
            interpreter = %backend.interpreter,
            script = %backend.script,
            port = params.port,
            "backend process spawned"
        );
        Ok(Self { child })
    }

    /// Terminate the backend. Call after the exit command has been
    /// sent (or when the channel is already broken).
    pub async fn kill(&mut self) {
        match self.child.kill().await {
            Ok(()) => tracing::debug!("backend process terminated"),
            Err(e) => tracing::warn!(error = %e, "failed to kill backend process"),
        }
    }

    /// Whether the child has exited.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

/// Relay one of the child's output pipes into the log.
fn relay_output<R>(pipe: R, is_stderr: bool)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                tracing::warn!(target: "backend", "{line}");
            } else {
                tracing::info!(target: "backend", "{line}");
            }
        }
    });
}
