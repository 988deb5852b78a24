use ai_helpdesk::commands::{admin, chat, knowledge, settings};
use ai_helpdesk::config::Config;
use ai_helpdesk::AppState;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "helpdesk", version, about = "Retrieval-grounded support chatbot")]
struct Cli {
    /// Path to the TOML config file (defaults to ./helpdesk.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and the default admin account
    InitDb,
    /// Chunk and embed the source document
    InitRag,
    /// Show retrieval index status
    Status,
    /// Send a user message
    Chat {
        message: String,
        /// Conversation to continue; a new one is started when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Print a conversation with admin replies
    History { id: String },
    /// List conversations, most recent first
    Conversations,
    /// Check admin credentials
    Login { username: String, password: String },
    /// Totals for conversations, messages and escalations
    Stats,
    /// Reply to a specific message of an escalated conversation
    Reply {
        id: String,
        message_id: i64,
        text: String,
    },
    /// Append an admin message to an escalated conversation
    Message { id: String, text: String },
    /// Show chatbot settings, updating any that are given
    Settings {
        #[arg(long)]
        welcome: Option<String>,
        #[arg(long)]
        fallback: Option<String>,
        #[arg(long)]
        tone: Option<String>,
    },
    /// Change a chatbot setting
    Set { key: String, value: String },
    /// Print the welcome message
    Welcome,
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("ai_helpdesk=info,warn"),
            2 => EnvFilter::new("ai_helpdesk=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    let state = AppState::new(config).context("failed to open database")?;

    match cli.command {
        Commands::InitDb => {
            let username = state.config.admin.username.clone();
            let password = state.config.admin_password();
            let created = admin::ensure_admin(&state.db, &username, &password)?;
            if created {
                println!("Database initialized. Admin user created: {}", username);
            } else {
                println!("Database initialized. Admin user already exists.");
            }
        }
        Commands::InitRag => {
            let status = knowledge::initialize_knowledge_base(&state.retrieval)
                .await
                .context("failed to initialize retrieval")?;
            print_json(&status)?;
        }
        Commands::Status => print_json(&knowledge::knowledge_status(&state.retrieval))?,
        Commands::Chat { message, id } => {
            let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let reply = chat::send_message(&state, &id, &message).await?;
            print_json(&serde_json::json!({ "conversation_id": id, "reply": reply }))?;
        }
        Commands::History { id } => print_json(&chat::get_conversation(&state.db, &id)?)?,
        Commands::Conversations => print_json(&admin::list_conversations(&state.db)?)?,
        Commands::Stats => print_json(&admin::get_stats(&state.db)?)?,
        Commands::Reply {
            id,
            message_id,
            text,
        } => print_json(&admin::reply_to_message(&state.db, &id, message_id, &text)?)?,
        Commands::Message { id, text } => {
            print_json(&admin::post_admin_message(&state.db, &id, &text)?)?
        }
        Commands::Login { username, password } => {
            print_json(&admin::login(&state.db, &username, &password)?)?
        }
        Commands::Settings {
            welcome,
            fallback,
            tone,
        } => {
            let update = settings::SettingsUpdate {
                welcome_message: welcome,
                fallback_message: fallback,
                tone_instructions: tone,
            };
            print_json(&settings::update_settings(&state.db, update)?)?
        }
        Commands::Set { key, value } => {
            settings::set_setting(&state.db, &key, &value)?;
            print_json(&settings::get_settings(&state.db)?)?;
        }
        Commands::Welcome => println!("{}", chat::get_welcome_message(&state.db)?),
    }

    Ok(())
}
