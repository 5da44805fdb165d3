use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docchat_server::{AppConfig, AppState, EmbeddingsKind, StoreKind, router};

/// Document question answering over a private corpus
#[derive(Parser, Debug)]
#[command(name = "docchat", version, about, long_about = None)]
struct Cli {
    /// Address to listen on (overrides BIND_ADDR)
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory ingested by POST /api/ingest (overrides DOCUMENTS_PATH)
    #[arg(short, long)]
    documents: Option<PathBuf>,

    /// Vector store backend: qdrant or memory (overrides VECTOR_STORE)
    #[arg(long)]
    store: Option<String>,

    /// Embedding provider: ollama or hash (overrides EMBEDDINGS)
    #[arg(long)]
    embeddings: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(documents) = cli.documents {
        config.documents_path = documents;
    }
    if let Some(store) = cli.store {
        config.vector_store = store.parse::<StoreKind>()?;
    }
    if let Some(embeddings) = cli.embeddings {
        config.embeddings = embeddings.parse::<EmbeddingsKind>()?;
    }

    let state = AppState::from_config(&config)
        .await
        .context("failed to initialize components")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        documents = %config.documents_path.display(),
        "docchat listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
