//! MindMate in the terminal
//!
//! Usage: mindmate [--data-dir DIR] [--no-sync] [chat|list|show|new|send|clear|delete]
//!
//! With no subcommand an interactive chat is started on the active
//! conversation. Inside the chat, lines starting with `/` are commands:
//! /new [title], /list, /switch <id>, /clear, /delete, /quit

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use mindmate_chat::app_config::AppConfig;
use mindmate_chat::models::DEFAULT_TITLE;
use mindmate_chat::{
    build_exchange, open_store, Conversation, ExchangeOutcome, Message, MessageExchange,
    MessageRole, ReplySource,
};

#[derive(Parser)]
#[command(name = "mindmate")]
#[command(about = "MindMate wellbeing chat", long_about = None)]
struct Cli {
    /// Directory holding conversation data (overrides CHAT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Do not notify the chat backend of sent messages
    #[arg(long, global = true)]
    no_sync: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat on the active conversation
    Chat,

    /// List conversations, newest first
    List,

    /// Print a conversation (the active one by default)
    Show { id: Option<String> },

    /// Start a new conversation and make it active
    New { title: Option<String> },

    /// Send one message and print the reply
    Send {
        text: String,

        /// Target conversation (the active one by default)
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Reset a conversation's history (the active one by default)
    Clear { id: Option<String> },

    /// Delete a conversation
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if cli.no_sync {
        config.backend_auth_token = None;
    }

    let store = open_store(&config.data_dir).await?;
    let exchange = build_exchange(&config, store)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat_loop(&exchange).await?,
        Commands::List => print_list(&exchange).await,
        Commands::Show { id } => {
            let store = exchange.store();
            let conv = match id {
                Some(id) => store.get(&id).await.context("No such conversation")?,
                None => store.get_active().await,
            };
            print_conversation(&conv);
        }
        Commands::New { title } => {
            let conv = exchange
                .store()
                .create(title.unwrap_or_else(|| DEFAULT_TITLE.to_string()))
                .await;
            println!("{}", conv.id);
        }
        Commands::Send { text, conversation } => {
            let id = match conversation {
                Some(id) => id,
                None => exchange.store().active_id().await,
            };
            print_outcome(&exchange.send_user_message(&id, &text).await);
        }
        Commands::Clear { id } => {
            let id = match id {
                Some(id) => id,
                None => exchange.store().active_id().await,
            };
            if !exchange.store().clear_messages(&id).await {
                anyhow::bail!("No such conversation: {}", id);
            }
        }
        Commands::Delete { id } => {
            if !exchange.store().delete(&id).await {
                anyhow::bail!("No such conversation: {}", id);
            }
        }
    }

    Ok(())
}

async fn chat_loop(exchange: &MessageExchange) -> Result<()> {
    let store = exchange.store();
    print_conversation(&store.get_active().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        let Some(command) = line.strip_prefix('/') else {
            let active = store.active_id().await;
            print_outcome(&exchange.send_user_message(&active, line).await);
            continue;
        };

        let (name, arg) = command
            .split_once(' ')
            .map(|(n, a)| (n, a.trim()))
            .unwrap_or((command, ""));

        match name {
            "quit" | "exit" => break,
            "new" => {
                let title = if arg.is_empty() { DEFAULT_TITLE } else { arg };
                print_conversation(&store.create(title).await);
            }
            "list" => print_list(exchange).await,
            "switch" => {
                if store.set_active(arg).await {
                    print_conversation(&store.get_active().await);
                } else {
                    println!("No conversation with id {arg:?}");
                }
            }
            "clear" => {
                let active = store.active_id().await;
                store.clear_messages(&active).await;
                print_conversation(&store.get_active().await);
            }
            "delete" => {
                let active = store.active_id().await;
                store.delete(&active).await;
                print_conversation(&store.get_active().await);
            }
            other => println!("Unknown command /{other}"),
        }
    }

    Ok(())
}

async fn print_list(exchange: &MessageExchange) {
    let active = exchange.store().active_id().await;
    for summary in exchange.store().summaries().await {
        let marker = if summary.id == active { '*' } else { ' ' };
        let when = summary
            .when
            .map(|t| format!(" • {}", t.with_timezone(&Local).format("%H:%M")))
            .unwrap_or_default();
        println!("{marker} {}  {}\n    {}{}", summary.id, summary.title, summary.last, when);
    }
}

fn print_conversation(conv: &Conversation) {
    println!("── {} ──", conv.title);
    for message in &conv.messages {
        print_message(message);
    }
}

fn print_message(message: &Message) {
    let who = match message.role {
        MessageRole::User => "You",
        MessageRole::Assistant => "MindMate",
    };
    let when = message.timestamp.with_timezone(&Local).format("%H:%M");
    println!("{who} • {when}\n  {}", message.text);
}

fn print_outcome(outcome: &ExchangeOutcome) {
    match outcome {
        ExchangeOutcome::Skipped => {}
        ExchangeOutcome::ConversationMissing => println!("That conversation no longer exists."),
        ExchangeOutcome::Completed { reply, source, .. } => {
            print_message(reply);
            if *source == ReplySource::Fallback {
                println!("  (offline reply)");
            }
        }
    }
}
