use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::BackendId;
use scamsignal_common::{classify_identifier, Config};
use scamsignal_engine::{
    default_factory, CommunityStore, CredentialRegistry, Dispatcher, FileCommunityStore,
    FileCredentialStore, NewReport, RiskAnalyzer,
};

#[derive(Parser)]
#[command(name = "scamsignal", about = "Check identifiers for scam risk")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a phone number, URL, email, or message text
    Search { query: String },
    /// Analyze an image (screenshot, ad, QR code) with the active backend
    ScanImage { path: PathBuf },
    /// Submit a community report for an identifier
    Report {
        query: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: String,
    },
    /// Manage analysis backends
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },
}

#[derive(Subcommand)]
enum BackendAction {
    /// Store a credential for a backend (claude, openai, openrouter)
    Add { backend: String, secret: String },
    /// Remove a backend's credential
    Remove { backend: String },
    /// Make a configured backend the active one
    Use { backend: String },
    /// List configured backends
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let registry = Arc::new(CredentialRegistry::new(
        Arc::new(FileCredentialStore::new(config.credentials_path())),
        default_factory(&config),
    ));
    registry.load_from_store().await?;

    let community = Arc::new(FileCommunityStore::new(config.reports_path()));

    let cli = Cli::parse();
    match cli.command {
        Command::Search { query } => {
            let analyzer = RiskAnalyzer::new(community, Dispatcher::new(registry));
            let result = analyzer.search(&query).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::ScanImage { path } => {
            let bytes = tokio::fs::read(&path).await?;
            let mime_type = mime_for(&path)?;
            let dispatcher = Dispatcher::new(registry);
            let result = dispatcher.analyze_image(&bytes, mime_type).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Report {
            query,
            category,
            description,
        } => {
            let kind = classify_identifier(&query);
            let outcome = community
                .submit_report(NewReport {
                    target_value: query,
                    target_kind: kind,
                    category,
                    description,
                })
                .await?;
            info!(report_id = ?outcome.report_id, "Report submitted");
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Backend { action } => match action {
            BackendAction::Add { backend, secret } => {
                let backend = BackendId::from_str(&backend)?;
                if registry.set_credential(backend, &secret).await? {
                    println!("Configured {backend}");
                } else {
                    return Err(anyhow!("credential rejected: not a valid {backend} secret"));
                }
            }
            BackendAction::Remove { backend } => {
                let backend = BackendId::from_str(&backend)?;
                registry.remove_credential(backend).await?;
                println!("Removed {backend}");
            }
            BackendAction::Use { backend } => {
                let backend = BackendId::from_str(&backend)?;
                if registry.set_active(backend).await? {
                    println!("Active backend: {backend}");
                } else {
                    return Err(anyhow!("{backend} is not configured"));
                }
            }
            BackendAction::List => {
                for configured in registry.list_configured().await {
                    let marker = if configured.is_active { "*" } else { " " };
                    println!("{marker} {} ({})", configured.backend, configured.name);
                }
            }
        },
    }

    Ok(())
}

fn mime_for(path: &Path) -> Result<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => Ok("image/png"),
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("gif") => Ok("image/gif"),
        Some("webp") => Ok("image/webp"),
        other => Err(anyhow!("unsupported image extension: {other:?}")),
    }
}
