//! CLI entry point for chat-widget

mod surface;

use anyhow::Result;
use chat_widget_client::{ChatClient, HttpChatClient};
use chat_widget_controller::{
    ControllerOptions, ConversationController, Outcome, Submission, WidgetEvent,
};
use chat_widget_core::config::{Config, ConfigLoader};
use chat_widget_core::logging::init_logging;
use chat_widget_core::session::open_store;
use chat_widget_core::{SessionStore, Transcript};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Confirm;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::surface::TerminalSurface;

#[derive(Parser)]
#[command(name = "chat-widget")]
#[command(about = "Chat with a retrieval-augmented answering service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation (default)
    Chat {
        /// Write the transcript as HTML to this file on exit
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Ask a single question
    Ask {
        /// Question to send
        #[arg(short, long)]
        message: String,
        /// Write the transcript as HTML to this file
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Inspect the session token
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Manage server-side conversation history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Check whether the answering service is up
    Health,
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Print the stored session token
    Show,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Ask the service to forget this session's history
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };
    let config = config_loader.load()?;

    let _log_guard = init_logging(&config.logging);
    debug!(config_dir = %config_loader.config_dir().display(), "Configuration loaded");

    match cli.command.unwrap_or(Commands::Chat { html: None }) {
        Commands::Chat { html } => run_chat(&config, html.as_deref()).await?,
        Commands::Ask { message, html } => run_ask(&config, &message, html.as_deref()).await?,
        Commands::Session {
            command: SessionCommands::Show,
        } => run_session_show(&config),
        Commands::History {
            command: HistoryCommands::Clear { yes },
        } => run_history_clear(&config, yes).await?,
        Commands::Health => run_health(&config).await?,
    }

    Ok(())
}

fn build_controller(
    config: &Config,
) -> (ConversationController, mpsc::UnboundedReceiver<WidgetEvent>) {
    let client: Arc<dyn ChatClient> = Arc::new(HttpChatClient::from_config(&config.service));
    let store = open_store(&config.session);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let controller =
        ConversationController::new(client, store, ControllerOptions::from(&config.widget))
            .with_events(event_tx);
    (controller, event_rx)
}

/// Interactive conversation on stdin/stdout
async fn run_chat(config: &Config, html: Option<&Path>) -> Result<()> {
    println!("{}", style("chat-widget").bold().cyan());
    println!(
        "{}",
        style(format!("Connected to {}. Type /quit to leave.", config.service.base_url)).dim()
    );

    let (mut controller, event_rx) = build_controller(config);
    let mut surface = TerminalSurface::new(event_rx, false).interactive();
    surface.drain();

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let (result_tx, mut result_rx) = mpsc::unbounded_channel();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = line_rx.recv(), if stdin_open => match line {
                Some(line) if line.trim() == "/quit" => break,
                Some(line) => match controller.submit(&line) {
                    Submission::Ignored => surface.prompt(),
                    Submission::Rejected => {
                        surface.notice("Still waiting for the previous answer.")
                    }
                    Submission::Started(exchange) => {
                        tokio::spawn(exchange.deliver_to(result_tx.clone()));
                    }
                },
                None => {
                    debug!("Input closed");
                    stdin_open = false;
                }
            },
            Some(result) = result_rx.recv() => {
                let _ = controller.complete(result);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        surface.drain();

        // drain the last answer before leaving on end of input
        if !stdin_open && controller.input_enabled() {
            break;
        }
    }

    drop(surface);
    println!();
    if let Some(path) = html {
        write_html(controller.transcript(), path)?;
    }
    Ok(())
}

/// One exchange, then exit
async fn run_ask(config: &Config, message: &str, html: Option<&Path>) -> Result<()> {
    let (mut controller, event_rx) = build_controller(config);
    let mut surface = TerminalSurface::new(event_rx, true);
    surface.drain();

    let outcome = match controller.submit(message) {
        Submission::Started(exchange) => {
            surface.drain();
            let result = exchange.run().await;
            controller.complete(result)
        }
        Submission::Ignored => Outcome::Ignored,
        Submission::Rejected => Outcome::Rejected,
    };
    surface.drain();
    drop(surface);

    if let Some(path) = html {
        write_html(controller.transcript(), path)?;
    }

    match outcome {
        Outcome::Answered => Ok(()),
        Outcome::Ignored => anyhow::bail!("Nothing to ask: the message is empty"),
        Outcome::FellBack | Outcome::Rejected => anyhow::bail!("The question was not answered"),
    }
}

fn run_session_show(config: &Config) {
    let store = open_store(&config.session);
    match store.get() {
        Some(token) => println!("{}", token),
        None => println!("{}", style("none").dim()),
    }
    if config.session.persist {
        println!(
            "{}",
            style(format!(
                "stored under \"{}\" in {}",
                config.session.storage_key, config.session.storage_path
            ))
            .dim()
        );
    }
}

async fn run_history_clear(config: &Config, yes: bool) -> Result<()> {
    let Some(token) = open_store(&config.session).get() else {
        println!("No session yet, nothing to clear.");
        return Ok(());
    };

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Clear the service's history for this session?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let client = HttpChatClient::from_config(&config.service);
    if client.clear_history(&token).await? {
        println!("{} History cleared", style("✓").green().bold());
    } else {
        println!(
            "{} The service has no history for this session",
            style("✗").yellow()
        );
    }
    Ok(())
}

async fn run_health(config: &Config) -> Result<()> {
    let client = HttpChatClient::from_config(&config.service);
    match client.health().await {
        Ok(true) => {
            println!("{}: {}", config.service.base_url, style("up").green());
            Ok(())
        }
        Ok(false) => {
            println!("{}: {}", config.service.base_url, style("down").red());
            anyhow::bail!("Service reported itself unhealthy")
        }
        Err(e) => {
            println!("{}: {}", config.service.base_url, style("unreachable").red());
            Err(e.into())
        }
    }
}

fn write_html(transcript: &Transcript, path: &Path) -> Result<()> {
    std::fs::write(path, transcript.to_html())?;
    println!("Transcript written to {}", path.display());
    Ok(())
}
