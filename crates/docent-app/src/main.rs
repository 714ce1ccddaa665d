//! Docent application binary - composition root.
//!
//! Ties together all Docent crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open storage (SQLite with FTS5 passage index)
//! 3. Build the answer pipeline (retrieve -> curate -> prompt -> generate)
//! 4. Run a REPL that streams answers and persists every turn

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use docent_chat::{
    ChatError, ChatPipeline, ConversationLifecycle, GenerationBackend, IndexRetriever,
};
use docent_core::config::DocentConfig;
use docent_llm::OpenAiCompatibleBackend;
use docent_storage::db::Database;
use docent_storage::repository::{ConversationRepository, MessageRepository};
use docent_storage::search::PassageSearch;

mod cli;

use cli::CliArgs;

/// Owner id for the single local user of the CLI.
///
/// Conversations are owner-scoped in storage so a future multi-user
/// surface works against the same schema.
const LOCAL_OWNER: Uuid = Uuid::nil();

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first so the log level override chain can apply.
    let config_file = args.resolve_config_path();
    let mut config = DocentConfig::load_or_default(&config_file);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.general.log_level.clone())
            }),
        )
        .init();

    tracing::info!("Starting Docent v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("docent.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Pipeline collaborators.
    let lifecycle = Arc::new(ConversationLifecycle::new(
        Arc::new(ConversationRepository::new(Arc::clone(&db))),
        Arc::new(MessageRepository::new(Arc::clone(&db))),
        &config.chat,
    ));
    let retriever = Arc::new(IndexRetriever::new(PassageSearch::new(Arc::clone(&db))));
    let backend: Arc<dyn GenerationBackend> =
        Arc::new(OpenAiCompatibleBackend::from_config(&config.llm)?);

    let pipeline = ChatPipeline::new(Arc::clone(&lifecycle), retriever, backend, &config);
    tracing::info!(model = %config.llm.model, "Answer pipeline ready");

    repl(&pipeline, &lifecycle).await
}

/// Interactive loop: questions stream answers, slash commands manage
/// conversations.
async fn repl(
    pipeline: &ChatPipeline,
    lifecycle: &ConversationLifecycle,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Docent documentation assistant. Ask a question, or /help for commands.");

    let mut current: Option<Uuid> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "quit" | "exit" | "/quit" => break,
            "/help" => {
                println!("/new           start a new conversation");
                println!("/list          list recent conversations");
                println!("/open <id>     continue a conversation");
                println!("/delete <id>   delete a conversation");
                println!("/clear         delete all conversations");
                println!("quit           exit");
            }
            "/new" => {
                current = None;
                println!("Started a new conversation.");
            }
            "/list" => match lifecycle.list(LOCAL_OWNER) {
                Ok(conversations) if conversations.is_empty() => {
                    println!("No conversations yet.");
                }
                Ok(conversations) => {
                    for conversation in conversations {
                        println!(
                            "{}  {}  {}",
                            conversation.id,
                            conversation.updated_at.format("%Y-%m-%d %H:%M"),
                            conversation.title
                        );
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            "/clear" => match lifecycle.delete_all(LOCAL_OWNER) {
                Ok(deleted) => {
                    current = None;
                    println!("Deleted {deleted} conversation(s).");
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            _ if line.starts_with("/open ") => {
                match parse_id(line.trim_start_matches("/open ")) {
                    Some(id) => match lifecycle.ensure_conversation(LOCAL_OWNER, Some(id)) {
                        Ok(conversation) => {
                            current = Some(conversation.id);
                            println!("Continuing: {}", conversation.title);
                        }
                        Err(e) => eprintln!("Error: {e}"),
                    },
                    None => eprintln!("Error: not a conversation id"),
                }
            }
            _ if line.starts_with("/delete ") => {
                match parse_id(line.trim_start_matches("/delete ")) {
                    Some(id) => match lifecycle.delete(LOCAL_OWNER, id) {
                        Ok(()) => {
                            if current == Some(id) {
                                current = None;
                            }
                            println!("Deleted.");
                        }
                        Err(e) => eprintln!("Error: {e}"),
                    },
                    None => eprintln!("Error: not a conversation id"),
                }
            }
            _ if line.starts_with('/') => {
                eprintln!("Unknown command: {line} (try /help)");
            }
            question => {
                if let Err(e) = ask(pipeline, &mut current, question).await {
                    eprintln!("Error: {e}");
                }
            }
        }
    }

    println!("Bye.");
    Ok(())
}

/// Stream one answer to stdout, then persist the completed turn.
async fn ask(
    pipeline: &ChatPipeline,
    current: &mut Option<Uuid>,
    question: &str,
) -> Result<(), ChatError> {
    let mut stream = pipeline.ask(LOCAL_OWNER, *current, question).await?;
    *current = Some(stream.conversation().id);

    while let Some(fragment) = stream.next_fragment().await {
        match fragment {
            Ok(text) => {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            Err(e) => {
                println!();
                return Err(e);
            }
        }
    }
    println!();

    stream.finish().await?;
    Ok(())
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}
