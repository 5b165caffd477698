//! `consolechat chat` — Interactive chat against the local backend.
//!
//! Owns the backend process for the whole session: spawn before the
//! first request, kill on every exit path (normal `exit`, Ctrl-C, EOF,
//! or a fatal error anywhere in the turn loop).

use std::io::Write;
use std::path::PathBuf;

use consolechat_backend::{BackendProcess, LoadParams, ServiceClient};
use consolechat_config::AppConfig;
use consolechat_core::service::LanguageService;
use consolechat_session::{ChatSession, TurnOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => AppConfig::load_from(&path)?,
        None => AppConfig::load()?,
    };
    tracing::debug!(?config, "configuration loaded");

    if config.model_path.is_empty() {
        eprintln!();
        eprintln!("  ERROR: No model configured!");
        eprintln!();
        eprintln!("  Set `model_path` in your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        eprintln!("  (Run `consolechat onboard` to generate one.)");
        eprintln!();
        return Err("No model path configured. See above for setup instructions.".into());
    }

    let params = LoadParams {
        model_path: config.model_path.clone(),
        port: config.backend.port,
        max_input_length: config.max_input_length,
        max_output_length: config.max_output_length,
        temperature: config.temperature,
    };

    // The process handle lives here so every exit path below — success,
    // connect failure, turn-loop error — walks through kill().
    let mut process = BackendProcess::spawn(&config.backend, &params)?;
    let result = run_session(&config, &params).await;
    process.kill().await;
    result
}

async fn run_session(
    config: &AppConfig,
    params: &LoadParams,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = ServiceClient::connect(&config.backend).await?;

    println!("Loading model, this may take a few minutes...");
    client.load(params).await?;
    println!("Successfully loaded model.");

    let mut session = ChatSession::new(
        client,
        config.initializer.clone(),
        config.user_label.clone(),
        config.assistant_label.clone(),
    );

    println!();
    println!("  Model:  {}", config.model_path);
    println!(
        "  Budget: {} input / {} output tokens",
        config.max_input_length, config.max_output_length
    );
    println!();
    println!("  Type your message and press Enter. Type 'exit' to quit.");
    println!();

    // One long-lived SIGINT listener for the whole session, so an
    // interrupt lands even while a turn is awaiting the backend. A
    // listener created per loop iteration would miss events delivered
    // between registrations.
    let (interrupt_tx, mut interrupt) = mpsc::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt_tx.send(()).await;
        }
    });

    let result = turn_loop(
        config,
        &mut session,
        BufReader::new(tokio::io::stdin()),
        &mut interrupt,
    )
    .await;

    // Fire-and-forget exit command; the caller kills the process next.
    session.into_service().shutdown().await;
    result
}

async fn turn_loop<S, R>(
    config: &AppConfig,
    session: &mut ChatSession<S>,
    input: R,
    interrupt: &mut mpsc::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: LanguageService,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        print!("{}", config.user_label);
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = interrupt.recv() => {
                println!();
                return Ok(());
            }
            line = lines.next_line() => line?,
        };

        let text = match line {
            Some(line) => line.trim().to_string(),
            None => return Ok(()), // EOF
        };
        if text.is_empty() {
            continue;
        }
        if text == "exit" {
            return Ok(());
        }

        // An interrupted turn abandons the in-flight request and leaves
        // the channel desynced; the only thing that happens next is
        // shutdown and kill, so that's acceptable.
        let outcome = tokio::select! {
            _ = interrupt.recv() => {
                println!();
                return Ok(());
            }
            outcome = session.process_turn(&text) => outcome?,
        };

        match outcome {
            TurnOutcome::Reply(reply) => {
                println!("{}{}", config.assistant_label, reply);
            }
            TurnOutcome::Unfittable => {
                println!("Message too long, please try again.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use consolechat_backend::frame::{read_frame, write_frame};
    use consolechat_core::error::ServiceError;
    use consolechat_core::service::TokenCheck;
    use tokio::net::TcpListener;

    /// Fit checks always pass; generation never completes.
    struct StalledService;

    #[async_trait::async_trait]
    impl LanguageService for StalledService {
        async fn check_fits(&mut self, _text: &str) -> Result<TokenCheck, ServiceError> {
            Ok(TokenCheck { exceeded: false })
        }

        async fn generate(&mut self, _text: &str) -> Result<String, ServiceError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn interrupt_mid_generation_ends_the_loop() {
        let config = AppConfig::default();
        let mut session = ChatSession::new(StalledService, "init", "User: ", "Assistant: ");
        let (tx, mut interrupt) = mpsc::channel(1);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(()).await;
        });

        // the generation for "hello" would block forever without the
        // interrupt being observed during the turn
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            turn_loop(&config, &mut session, &b"hello\n"[..], &mut interrupt),
        )
        .await
        .expect("interrupt must end the loop while a turn is in flight");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn interrupt_while_awaiting_input_ends_the_loop() {
        let config = AppConfig::default();
        let mut session = ChatSession::new(StalledService, "init", "User: ", "Assistant: ");
        let (tx, mut interrupt) = mpsc::channel(1);

        // a reader that stays open but never produces a line
        let (reader, _writer) = tokio::io::duplex(8);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(()).await;
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            turn_loop(&config, &mut session, BufReader::new(reader), &mut interrupt),
        )
        .await
        .expect("interrupt must end the loop while awaiting input");
        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_load_terminates_backend_without_any_turn() {
        // a stand-in backend process that just sleeps; extra spawn args
        // become shell positional parameters
        let mut backend_cfg = consolechat_config::BackendConfig {
            interpreter: "sh".into(),
            script: "-c".into(),
            startup_max_attempts: 3,
            startup_backoff_ms: 50,
            request_timeout_secs: 5,
            ..consolechat_config::BackendConfig::default()
        };

        // a fake service endpoint that rejects the LOAD and records
        // every request it sees
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        backend_cfg.port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            while let Ok(body) = read_frame(&mut stream).await {
                seen.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&body).to_string());
                write_frame(
                    &mut stream,
                    br#"{"type":"error","message":"model not found"}"#,
                )
                .await
                .unwrap();
            }
        });

        let config = AppConfig {
            model_path: "sleep 30".into(),
            backend: backend_cfg,
            ..AppConfig::default()
        };
        let params = LoadParams {
            model_path: config.model_path.clone(),
            port: config.backend.port,
            max_input_length: config.max_input_length,
            max_output_length: config.max_output_length,
            temperature: config.temperature,
        };

        // same bracket as `run`: spawn, run the session, kill
        let mut process = BackendProcess::spawn(&config.backend, &params).unwrap();
        let result = run_session(&config, &params).await;
        process.kill().await;

        assert!(result.is_err());
        assert!(process.has_exited());

        // the LOAD was the only request — no tokenize, no generate
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("LOAD,"));
    }
}
