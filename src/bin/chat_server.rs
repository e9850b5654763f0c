use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use mindmate_chat::app_config::AppConfig;
use mindmate_chat::{build_exchange, chat_server, open_store};

/// -----------------------------
/// MAIN
/// -----------------------------
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load + validate env ONCE
    let config = AppConfig::load()?;

    info!("Starting MindMate chat server");

    let store = open_store(&config.data_dir).await?;
    info!("✓ Conversations loaded from {}", config.data_dir.display());

    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set, every reply will use the fallback responder");
    }
    let exchange = Arc::new(build_exchange(&config, store)?);

    let app = chat_server::router(exchange);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("🚀 Server ready on {}", addr);
    info!("Assistant model: {}", config.groq_model);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
