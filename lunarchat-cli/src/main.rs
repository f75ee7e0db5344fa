//! CLI entry point for lunarchat

use anyhow::Result;
use bytes::Bytes;
use clap::Parser;
use console::style;
use dialoguer::{Input, Password, Select};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use lunarchat_core::auth::UserRole;
use lunarchat_core::config::ConfigLoader;
use lunarchat_core::logging::init_logging;
use lunarchat_core::message::{Message, MessageContent, Role};
use lunarchat_core::report::{AnalysisMode, AnalysisReport};
use lunarchat_providers::{Authenticator, ImageUploader, LunarApiClient, SampleAnalyzer};
use lunarchat_service::{ChatService, LocalImage, UserAction};

#[derive(Parser)]
#[command(name = "lunarchat")]
#[command(about = "Chat with the LunarChat soil and lunar sample analysis service")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration directory
    #[arg(short, long)]
    config_dir: Option<PathBuf>,
}

const HELP: &str = "\
Commands:
  new                 start a new analysis session
  list                list sessions
  select <n>          switch to session n
  delete <n>          delete session n
  say <text>          send a text message
  stage <path>        pick a local image
  upload              upload the staged image
  cancel              abandon a staged or in-flight upload
  analyze soil|lunar  analyze the uploaded image
  log                 show the conversation
  images              list images in this session
  help                show this help
  quit                exit";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;
    let _log_guard = init_logging(&config.logging);
    info!(base_url = %config.remote.base_url, "lunarchat starting");

    let client = Arc::new(LunarApiClient::from_config(&config.remote)?);
    let uploader: Arc<dyn ImageUploader> = client.clone();
    let analyzer: Arc<dyn SampleAnalyzer> = client.clone();
    let authenticator: Arc<dyn Authenticator> = client;
    let service = ChatService::new(uploader, analyzer, authenticator, config.session.clone());

    login(&service).await?;
    service.create_session().await?;

    println!("{}", style("Welcome to LunarChat.").bold());
    println!("{}", HELP);

    loop {
        let line: String = Input::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let outcome = match command {
            "quit" | "exit" => break,
            "help" => {
                println!("{}", HELP);
                Ok(())
            }
            "new" => service.create_session().await.map(|_| ()),
            "list" => list_sessions(&service).await,
            "select" => match session_at(&service, rest).await {
                Ok(id) => service.select_session(id).await,
                Err(e) => Err(e),
            },
            "delete" => match session_at(&service, rest).await {
                Ok(id) => service.delete_session(id).await,
                Err(e) => Err(e),
            },
            "say" => match active_id(&service).await {
                Ok(id) => service.send_text(id, rest).await,
                Err(e) => Err(e),
            },
            "stage" => stage(&service, rest).await,
            "upload" => dispatch_active(&service, UserAction::Upload).await,
            "cancel" => dispatch_active(&service, UserAction::Cancel).await,
            "analyze" => match rest.parse::<AnalysisMode>() {
                Ok(mode) => dispatch_active(&service, UserAction::Analyze(mode)).await,
                Err(e) => Err(e),
            },
            "log" => show_log(&service).await,
            "images" => show_images(&service).await,
            other => {
                notice(&format!("unknown command '{}', try 'help'", other));
                Ok(())
            }
        };

        if let Err(e) = outcome {
            // local rejections surface as transient system-style notices
            notice(&e.to_string());
        }
    }

    Ok(())
}

async fn login(service: &ChatService) -> Result<()> {
    loop {
        let username: String = Input::new().with_prompt("Username").interact_text()?;
        let password: String = Password::new().with_prompt("Password").interact()?;
        let role = match Select::new()
            .with_prompt("Role")
            .items(&["user", "admin"])
            .default(0)
            .interact()?
        {
            1 => UserRole::Admin,
            _ => UserRole::User,
        };

        if service.login(&username, &password, role).await {
            return Ok(());
        }
        println!("{}", style("Login failed, try again.").red());
    }
}

fn notice(text: &str) {
    println!("{}", style(format!("* {}", text)).dim());
}

async fn active_id(service: &ChatService) -> lunarchat_core::Result<Uuid> {
    let store = service.store();
    let store = store.read().await;
    store
        .active_id()
        .ok_or_else(|| lunarchat_core::Error::Internal("no active session".to_string()))
}

/// Resolve a `list` index to a session id
async fn session_at(service: &ChatService, arg: &str) -> lunarchat_core::Result<Uuid> {
    let index: usize = arg.parse().map_err(|_| {
        lunarchat_core::Error::Internal(format!("expected a session number, got '{}'", arg))
    })?;
    let store = service.store();
    let store = store.read().await;
    store
        .sessions()
        .get(index)
        .map(|s| s.id)
        .ok_or_else(|| lunarchat_core::Error::Internal(format!("no session {}", index)))
}

async fn dispatch_active(service: &ChatService, action: UserAction) -> lunarchat_core::Result<()> {
    let id = active_id(service).await?;
    service.dispatch(id, action).await
}

async fn stage(service: &ChatService, path: &str) -> lunarchat_core::Result<()> {
    let path = Path::new(path);
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    let id = active_id(service).await?;
    service
        .dispatch(id, UserAction::Stage(LocalImage::new(filename, Bytes::from(bytes))))
        .await
}

async fn list_sessions(service: &ChatService) -> lunarchat_core::Result<()> {
    let store = service.store();
    let store = store.read().await;
    for (index, session) in store.sessions().iter().enumerate() {
        let marker = if store.active_id() == Some(session.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{} [{}] {} ({} messages)",
            marker,
            index,
            session.title,
            session.log.len()
        );
    }
    Ok(())
}

async fn show_log(service: &ChatService) -> lunarchat_core::Result<()> {
    let id = active_id(service).await?;
    let store = service.store();
    let store = store.read().await;
    let session = store
        .get(id)
        .ok_or(lunarchat_core::Error::SessionNotFound(id))?;

    for message in session.log.snapshot() {
        render_message(message);
    }
    if session.analysis.is_requesting() {
        println!("{}", style("Dr. Terra is analyzing...").italic());
    }
    Ok(())
}

async fn show_images(service: &ChatService) -> lunarchat_core::Result<()> {
    let id = active_id(service).await?;
    let store = service.store();
    let store = store.read().await;
    let session = store
        .get(id)
        .ok_or(lunarchat_core::Error::SessionNotFound(id))?;

    let urls = session.image_urls();
    if urls.is_empty() {
        notice("no images in this session");
    }
    for url in urls {
        println!("  {}", url);
    }
    Ok(())
}

fn render_message(message: &Message) {
    let prefix = match message.role {
        Role::User => style("you".to_string()).blue().bold(),
        Role::Bot => style("Dr. Terra".to_string()).yellow().bold(),
        Role::System => style("*".to_string()).dim(),
    };
    match &message.content {
        MessageContent::Text(text) => println!("{} {}", prefix, text),
        MessageContent::Image(attachment) => {
            println!("{} [image] {}", prefix, attachment.url)
        }
        MessageContent::Report(report) => {
            println!("{}", prefix);
            render_report(report);
        }
    }
}

fn render_report(report: &AnalysisReport) {
    println!("  {}: {}", style("Sample").bold(), report.sample_type);
    for (substance, level) in &report.composition {
        println!("  {}: {}", substance, level);
    }
    println!(
        "  {}: {} ({})",
        style("Habitability").bold(),
        report.habitability.summary,
        report.habitability.details
    );
    for (key, value) in &report.extra {
        println!("  {}: {}", key, value);
    }
}
