use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ratatui::{backend::Backend, Terminal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod chat;
mod client;
mod config;
mod error;
mod handler;
mod input;
mod message;
mod transcript;
mod tui;
mod ui;

use app::App;
use chat::{ChatInputs, ChatInteractionHandler, MissingAnswerPolicy};
use client::ReqwestClient;
use config::{Config, ENDPOINT_ENV};
use transcript::{Transcript, TranscriptStore};

#[derive(Parser)]
#[command(name = "chatline")]
#[command(about = "Chat with any endpoint that answers {\"question\"} with {\"answer\"}")]
struct Cli {
    /// Endpoint URL (overrides CHATLINE_ENDPOINT and the config file)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where the interactive mode writes its log
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one question and print the exchange
    Ask {
        /// Your question
        question: String,
    },
    /// Show or change the saved defaults
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current config
    Show,
    /// Update saved defaults
    Set {
        /// Default endpoint URL
        #[arg(long)]
        endpoint: Option<String>,
        /// What to show when a response has no answer field
        #[arg(long)]
        missing_answer: Option<MissingAnswerPolicy>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };
    let config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to read config at {}", config_path.display()))?;

    let endpoint = config.resolve_endpoint(cli.url.as_deref(), std::env::var(ENDPOINT_ENV).ok());

    match cli.command {
        None => {
            let log_path = match cli.log_file {
                Some(path) => path,
                None => default_log_path()?,
            };
            init_file_logging(&log_path)?;
            run_interactive(&config, endpoint).await
        }
        Some(Commands::Ask { question }) => {
            init_stderr_logging();
            ask(&config, endpoint, question).await
        }
        Some(Commands::Config { action }) => run_config(config, &config_path, action),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,chatline=debug".into())
}

fn default_log_path() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .context("Could not determine data directory")?
        .join("chatline");
    Ok(dir.join("chatline.log"))
}

/// The TUI owns the terminal, so interactive logs go to a file
fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_chat(config: &Config, transcript: &Transcript) -> ChatInteractionHandler {
    ChatInteractionHandler::new(Arc::new(ReqwestClient::new()), Arc::new(transcript.clone()))
        .with_policy(config.missing_answer)
}

async fn run_interactive(config: &Config, endpoint: String) -> Result<()> {
    let transcript = Transcript::new();
    let chat = build_chat(config, &transcript);
    let mut app = App::new(chat, transcript, endpoint);

    tracing::info!("Starting interactive session");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(Duration::from_millis(300));

    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;

    if !app.pending.is_empty() {
        tracing::info!(pending = app.pending.len(), "Exiting with sends still in flight");
    }

    result
}

/// Draw, wait for one event, collect finished sends; until the app asks to quit
async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut tui::EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        handler::handle_next(app, events.next().await);
        app.poll_pending().await;

        if app.should_quit {
            return Ok(());
        }
    }
}

async fn ask(config: &Config, endpoint: String, question: String) -> Result<()> {
    let transcript = Transcript::new();
    let chat = build_chat(config, &transcript);
    let mut inputs = ChatInputs::new(endpoint, question);

    let outcome = chat.send_message(&mut inputs).await;

    for message in transcript.entries() {
        println!("{}: {}", message.origin().label(), message.text());
    }

    if let Err(err) = outcome {
        eprintln!("{}", err.alert_text());
        std::process::exit(1);
    }

    Ok(())
}

fn run_config(mut config: Config, path: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            endpoint,
            missing_answer,
        } => {
            if let Some(endpoint) = endpoint {
                config.endpoint_url = Some(endpoint).filter(|url| !url.is_empty());
            }
            if let Some(policy) = missing_answer {
                config.missing_answer = policy;
            }
            config.save_to(path)?;
            println!("Saved {}", path.display());
        }
    }
    Ok(())
}
