//! Ask the dashboard assistant one question and stream the answer to stdout.
//!
//! Without `--endpoint` the client settings come from the environment (a
//! `.env` file is loaded first): `DASHCHAT_ENDPOINT`,
//! `DASHCHAT_CREDENTIAL_HEADER` and `DASHCHAT_TIMEOUT_SECS`; other flags
//! override them. The key is always read from `DASHCHAT_API_KEY`.
//!
//! Ctrl-C cancels the turn and keeps whatever text already arrived.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dashchat_stream::observability::init_observability;
use dashchat_stream::prelude::*;
use dashchat_stream::NarrationSink;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dashchat", about = "Stream an answer from the dashboard assistant")]
struct Args {
    /// Question to ask.
    message: String,
    /// Chat-stream endpoint URL (overrides DASHCHAT_ENDPOINT).
    #[arg(long)]
    endpoint: Option<String>,
    /// Header carrying the API key (overrides DASHCHAT_CREDENTIAL_HEADER).
    #[arg(long)]
    credential_header: Option<String>,
    /// Request timeout in seconds (overrides DASHCHAT_TIMEOUT_SECS).
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// JSON file with earlier messages (`[{"role":"user","content":"..."}]`).
    #[arg(long)]
    history: Option<PathBuf>,
    /// JSON file with the dashboard snapshot sent as `currentData`.
    #[arg(long)]
    context: Option<PathBuf>,
    /// Print the completed answer again as a narration cue on stderr.
    #[arg(long)]
    narrate: bool,
    /// Print the final transcript as JSON after the turn.
    #[arg(long)]
    transcript: bool,
}

struct StderrNarrator;

impl NarrationSink for StderrNarrator {
    fn speak(&self, text: &str) {
        info!(chars = text.len(), "narrating completed answer");
        eprintln!("\n[narration] {text}");
    }
}

fn resolve_config(args: &Args) -> Result<ChatClientConfig, SessionError> {
    let mut config = match &args.endpoint {
        Some(endpoint) => ChatClientConfig::new(endpoint.trim()),
        None => ChatClientConfig::from_env()?,
    };
    if let Some(header) = &args.credential_header {
        config = config.credential_header(header.trim());
    }
    if let Some(secs) = args.timeout_secs {
        config = config.timeout(Duration::from_secs(secs.max(1)));
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid JSON in {}: {e}", path.display()))?;
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_observability();
    let args = Args::parse();

    let mut builder = ChatClient::builder()
        .http(resolve_config(&args)?)?
        .credentials(Arc::new(EnvCredential::new()));
    if let Some(path) = &args.context {
        let snapshot: serde_json::Value = read_json(path)?;
        builder = builder.context(Arc::new(snapshot));
    }
    if args.narrate {
        builder = builder.narrator(Arc::new(StderrNarrator));
    }
    let client = builder.build()?;

    let history: Vec<Message> = match &args.history {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let mut session = client.session_with_history(history);
    let mut events = session.subscribe();
    let abort = session.abort_handle();

    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = events.recv().await {
            match &event {
                SessionEvent::ContentDelta { text, .. } => {
                    let _ = write!(stdout, "{text}");
                    let _ = stdout.flush();
                }
                SessionEvent::Completed { .. } => println!(),
                SessionEvent::Failed { failure, .. } => eprintln!("\nchat failed: {failure}"),
                SessionEvent::Cancelled { .. } => eprintln!("\n[cancelled]"),
                SessionEvent::StateChanged { .. } => {}
            }
            if event.is_terminal() {
                break;
            }
        }
    });

    let state = {
        let turn = session.start(args.message.clone());
        tokio::pin!(turn);
        tokio::select! {
            state = &mut turn => state?,
            _ = tokio::signal::ctrl_c() => {
                abort.abort();
                turn.await?
            }
        }
    };
    let _ = printer.await;

    if args.transcript {
        println!("{}", serde_json::to_string_pretty(session.transcript())?);
    }

    Ok(match state {
        SessionState::Completed | SessionState::Cancelled => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
