//! wnote-server - Main entry point
//!
//! Serves the article API and the `/ws/updates` notification socket.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wnote_common::auth::CredentialAuthority;
use wnote_common::config::{ConfigOverrides, ServiceConfig, TomlConfig};
use wnote_common::db::init_database;
use wnote_server::notify::ConnectionRegistry;
use wnote_server::services::{
    FallbackTagger, GeminiTagger, KeywordTagger, ReferenceLookup, TagSuggester, WikipediaClient,
};
use wnote_server::{build_router, AppState};

/// Command-line arguments for wnote-server
#[derive(Parser, Debug)]
#[command(name = "wnote-server")]
#[command(about = "Article notes service with live save notifications")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/wnote/config.toml)
    #[arg(short, long, env = "WNOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "WNOTE_BIND_ADDR")]
    bind_addr: Option<String>,

    /// SQLite database URL
    #[arg(long, env = "WNOTE_DATABASE_URL")]
    database_url: Option<String>,

    /// HMAC key for session credentials
    #[arg(long, env = "WNOTE_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Per-connection broadcast send timeout in milliseconds
    #[arg(long, env = "WNOTE_SEND_TIMEOUT_MS")]
    send_timeout_ms: Option<u64>,

    /// Outbound queue capacity per notification connection
    #[arg(long, env = "WNOTE_OUTBOUND_QUEUE")]
    outbound_queue: Option<usize>,

    /// Gemini API key for tag suggestions
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Create an account and exit
    #[arg(long, num_args = 2, value_names = ["USERNAME", "PASSWORD"])]
    create_user: Option<Vec<String>>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_addr: self.bind_addr.clone(),
            database_url: self.database_url.clone(),
            secret_key: self.secret_key.clone(),
            send_timeout_ms: self.send_timeout_ms,
            outbound_queue: self.outbound_queue,
            gemini_api_key: self.gemini_api_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wnote_server=debug,wnote_common=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting wnote-server v{}", env!("CARGO_PKG_VERSION"));

    let file = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = ServiceConfig::resolve(args.overrides(), file)
        .context("Invalid configuration")?;

    let db = match init_database(&config.database_url).await {
        Ok(db) => {
            info!("✓ Database ready");
            db
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    if let Some(pair) = args.create_user.as_deref() {
        let [username, password] = pair else {
            anyhow::bail!("--create-user takes USERNAME PASSWORD");
        };
        let user = db
            .create_user(username, password)
            .await
            .context("Failed to create user")?;
        info!("Created user '{}' (id {})", user.username, user.id);
        return Ok(());
    }

    let registry = Arc::new(ConnectionRegistry::new(
        config.send_timeout,
        config.outbound_queue,
    ));

    let reference: Arc<dyn ReferenceLookup> =
        Arc::new(WikipediaClient::new().context("Failed to build Wikipedia client")?);

    let tagger: Arc<dyn TagSuggester> = match &config.gemini_api_key {
        Some(key) => {
            info!("Tag suggestions: Gemini with keyword fallback");
            let gemini = GeminiTagger::new(key.expose()).context("Failed to build Gemini client")?;
            Arc::new(FallbackTagger::new(gemini))
        }
        None => {
            warn!("No Gemini API key configured, using keyword tags");
            Arc::new(KeywordTagger)
        }
    };

    let credentials = CredentialAuthority::new(config.secret_key.expose().as_bytes());
    let state = AppState::new(db, credentials, registry.clone(), reference, tagger);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    info!("wnote-server listening on http://{}", config.bind_addr);
    info!("Notifications: ws://{}/ws/updates", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            registry.shutdown();
        })
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
