//! Session Shell
//!
//! A line-oriented terminal surface for the session conductor. Reads
//! commands and messages from stdin and prints the transcript as it
//! changes.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local backend
//! session-shell
//!
//! # Explicit server and token
//! session-shell --api-url https://chat.example.com --token "$TOKEN"
//!
//! # Verbose logging (written to stderr)
//! session-shell --log-level debug
//! ```

mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use session_conductor::{
    default_config_path, load_config_from_path, ConductorMessage, Conductor, ConfigOverrides,
    HttpChatApi,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, HELP};
use crate::render::{session_lines, Renderer};

/// Session Shell - terminal chat client
#[derive(Parser, Debug)]
#[command(name = "session-shell")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chat API base URL
    #[arg(long, env = "CONDUCTOR_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the chat API
    #[arg(long, env = "CONDUCTOR_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Messages per history page
    #[arg(long)]
    page_size: Option<u32>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "CONDUCTOR_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(config_path).context("Failed to load config")?;
    overrides(&args).apply(&mut config);
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        api = %config.api.base_url,
        source = ?config.source(),
        "Starting session shell"
    );

    let backend = HttpChatApi::from_config(&config.api).context("Failed to build API client")?;
    let (tx, mut rx) = mpsc::channel(config.channel_capacity);
    let mut conductor = Conductor::new(backend, config, tx);
    let mut renderer = Renderer::new();
    let mut out = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    emit(&mut out, &["Type /help for commands.".to_string()]).await?;
    conductor.start().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match commands::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => emit(&mut out, &[HELP.to_string()]).await?,
                    Ok(Command::Sessions) => {
                        let view = conductor.view();
                        let listed = session_lines(view.sessions(), view.active_session_id());
                        emit(&mut out, &listed).await?;
                    }
                    Ok(command) => {
                        if let Some(event) = command.into_event() {
                            conductor.handle_event(event).await?;
                        }
                    }
                    Err(message) => emit(&mut out, &[message]).await?,
                }
            }
            Some(completion) = conductor.next_completion() => {
                conductor.apply_completion(completion).await;
            }
            Some(msg) = rx.recv() => {
                emit(&mut out, &renderer.render(&msg)).await?;
            }
        }
    }

    if conductor.in_flight() > 0 {
        tracing::debug!(in_flight = conductor.in_flight(), "Exiting with requests in flight");
    }
    drain(&mut rx, &mut renderer, &mut out).await?;
    Ok(())
}

/// Initialize tracing on stderr so it never interleaves with the transcript
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "session_shell={level},session_conductor={level},reqwest=warn,hyper=warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn overrides(args: &Args) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::new();
    if let Some(url) = &args.api_url {
        overrides = overrides.with_api_url(url.clone());
    }
    if let Some(token) = &args.token {
        overrides = overrides.with_token(token.clone());
    }
    if let Some(size) = args.page_size {
        overrides = overrides.with_page_size(size);
    }
    if let Some(secs) = args.timeout_secs {
        overrides = overrides.with_timeout_secs(secs);
    }
    overrides
}

async fn emit(out: &mut Stdout, lines: &[String]) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    let mut buf = lines.join("\n");
    buf.push('\n');
    out.write_all(buf.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

/// Print whatever the conductor queued before exit
async fn drain(
    rx: &mut mpsc::Receiver<ConductorMessage>,
    renderer: &mut Renderer,
    out: &mut Stdout,
) -> Result<()> {
    while let Ok(msg) = rx.try_recv() {
        emit(out, &renderer.render(&msg)).await?;
    }
    Ok(())
}
