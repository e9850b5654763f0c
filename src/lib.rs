pub mod models;
pub mod error;
pub mod storage;
pub mod store;
pub mod fallback;
pub mod ai_service;
pub mod backend_sync;
pub mod exchange;
pub mod app_config;
pub mod chat_server;

pub use models::{Conversation, ConversationSummary, Message, MessageRole};
pub use store::ConversationStore;
pub use ai_service::{AIMessage, AIService, ReplyService};
pub use backend_sync::{BackendSync, HttpBackendSync, NoopSync};
pub use exchange::{ExchangeOutcome, MessageExchange, ReplySource};

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use app_config::AppConfig;
use storage::FileStorage;

/// Open the conversation store kept under `data_dir`
pub async fn open_store(data_dir: &Path) -> Result<Arc<ConversationStore>> {
    let storage = FileStorage::open(data_dir)
        .await
        .with_context(|| format!("Failed to open data dir {}", data_dir.display()))?;
    Ok(Arc::new(ConversationStore::load(Arc::new(storage)).await))
}

/// Wire the remote collaborators from config around an opened store
pub fn build_exchange(config: &AppConfig, store: Arc<ConversationStore>) -> Result<MessageExchange> {
    let replies = AIService::new(
        config.groq_model.clone(),
        config.groq_api_key.clone(),
        config.request_timeout,
    )
    .context("Failed to build assistant client")?
    .with_endpoint(config.groq_api_url.clone())
    .with_system_prompt(config.system_prompt.clone());

    // Signed-out sessions never reach the backend
    let sync: Arc<dyn BackendSync> = match &config.backend_auth_token {
        Some(token) => Arc::new(
            HttpBackendSync::new(
                config.backend_sync_url.clone(),
                Some(token.clone()),
                config.backend_receiver_id,
                config.request_timeout,
            )
            .context("Failed to build backend sync client")?,
        ),
        None => Arc::new(NoopSync),
    };

    Ok(MessageExchange::new(store, sync, Arc::new(replies))
        .with_history_window(config.history_window))
}
