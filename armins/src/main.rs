//! armins - chat client for an argument-mining service
//!
//! Submits text to the analysis service and keeps a local history of chats.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Chats: $XDG_DATA_HOME/armins/ (~/.local/share/armins/)
//! - Config: $XDG_CONFIG_HOME/armins/config.toml (~/.config/armins/config.toml)
//! - Logs: $XDG_STATE_HOME/armins/ (~/.local/state/armins/)

mod message_format;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use armins_core::config::BaseUrlSource;
use armins_core::{ChatSession, Config, FileInfo, MessageInput};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::message_format::{print_catalog, print_chats, print_message, print_messages};

#[derive(Parser)]
#[command(name = "armins")]
#[command(about = "Chat with an argument-mining service")]
#[command(version)]
struct Args {
    /// Analysis service base URL (overrides config and ARMINS_API_BASE_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Select this chat before running the command
    #[arg(long, value_name = "ID")]
    chat: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List chats, newest first
    Chats,

    /// Start a new chat and print its id
    New,

    /// Delete a chat and its messages
    Delete {
        /// Chat id
        id: String,
    },

    /// Show the messages of the active (or given) chat
    Show {
        /// Chat id
        id: Option<String>,
    },

    /// Submit text for analysis
    Send {
        /// Text to analyze
        text: Option<String>,

        /// Attach a file
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// ADU classifier model id
        #[arg(long, value_name = "ID")]
        adu_model: Option<String>,

        /// Stance classifier model id
        #[arg(long, value_name = "ID")]
        stance_model: Option<String>,

        /// Use few-shot mode for the ADU classifier, if the model supports it
        #[arg(long)]
        few_shot_adu: bool,

        /// Use few-shot mode for the stance classifier, if the model supports it
        #[arg(long)]
        few_shot_stance: bool,
    },

    /// Show available models and the current selection
    Models,

    /// Interactive chat
    Repl,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(url) = &args.api_url {
        config.api.set_base_url(url.clone(), BaseUrlSource::Override);
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    let _log_guard =
        armins_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("armins starting up");

    let mut session = ChatSession::open(&config).context("failed to open chat session")?;
    if let Some(chat_id) = &args.chat {
        session.select_chat(chat_id);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    let result = runtime.block_on(run(&mut session, args.command));

    tracing::info!("armins shutting down");

    result
}

async fn run(session: &mut ChatSession, command: Command) -> Result<()> {
    match command {
        Command::Chats => print_chats(session),
        Command::New => {
            let chat_id = session.start_new_chat();
            println!("{}", chat_id);
        }
        Command::Delete { id } => session.delete_chat(&id),
        Command::Show { id } => {
            if let Some(id) = id {
                session.select_chat(&id);
            }
            print_messages(session.current_messages());
        }
        Command::Send {
            text,
            file,
            adu_model,
            stance_model,
            few_shot_adu,
            few_shot_stance,
        } => {
            load_models(session).await;
            if let Some(model) = adu_model {
                if !session.set_adu_model(&model) {
                    anyhow::bail!("ADU model '{}' is not available", model);
                }
            }
            if let Some(model) = stance_model {
                if !session.set_stance_model(&model) {
                    anyhow::bail!("Stance model '{}' is not available", model);
                }
            }
            session.set_few_shot_adu(few_shot_adu);
            session.set_few_shot_stance(few_shot_stance);

            let file = file.as_deref().map(file_info).transpose()?;
            let input = MessageInput { text, file };
            if input.is_empty() {
                anyhow::bail!("nothing to send: provide text or --file");
            }

            send(session, input).await;
            if let Some(error) = session.error() {
                anyhow::bail!("{}", error);
            }
        }
        Command::Models => {
            load_models(session).await;
            print_catalog(session.catalog());
        }
        Command::Repl => repl(session).await?,
    }
    Ok(())
}

/// Fetch the catalog, reporting a fallback on stderr.
async fn load_models(session: &mut ChatSession) {
    session.fetch_models().await;
    if let Some(error) = session.error() {
        eprintln!("warning: {}", error);
        session.clear_error();
    }
}

/// Submit one message with a spinner while the placeholder is loading.
async fn send(session: &mut ChatSession, input: MessageInput) {
    let Some(pending) = session.begin_send(input) else {
        return;
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Analyzing...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let backend = session.backend();
    let outcome = pending.execute(backend.as_ref()).await;
    spinner.finish_and_clear();

    let chat_id = pending.chat_id().to_string();
    let message_id = pending.message_id().to_string();
    session.complete(pending, outcome);

    if let Some(message) = session
        .messages(&chat_id)
        .iter()
        .find(|m| m.id() == message_id)
    {
        print_message(message);
    }
}

fn file_info(path: &Path) -> Result<FileInfo> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FileInfo {
        name,
        size: metadata.len(),
    })
}

async fn repl(session: &mut ChatSession) -> Result<()> {
    load_models(session).await;
    println!("armins interactive mode. Type /quit to exit.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read input")?;
        let line = line.trim();

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => println!("{}", session.start_new_chat()),
            "/chats" => print_chats(session),
            "/models" => print_catalog(session.catalog()),
            "/select" if !rest.is_empty() => {
                session.select_chat(rest);
                print_messages(session.current_messages());
            }
            "/delete" if !rest.is_empty() => session.delete_chat(rest),
            "/select" | "/delete" => println!("usage: {} <chat id>", command),
            _ => {
                send(session, MessageInput::text(line)).await;
                session.clear_error();
            }
        }
    }

    Ok(())
}
