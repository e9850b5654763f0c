use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::error::SyncError;
use crate::models::Message;

pub const DEFAULT_SYNC_URL: &str = "http://127.0.0.1:8000/api/chat/";
pub const DEFAULT_RECEIVER_ID: i64 = 1;

/// Best-effort notification of new user messages to the chat backend.
#[async_trait]
pub trait BackendSync: Send + Sync {
    async fn notify(&self, message: &Message) -> Result<(), SyncError>;
}

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    receiver: i64,
    content: &'a str,
}

#[derive(Clone)]
pub struct HttpBackendSync {
    client: Client,
    url: String,
    auth_token: Option<String>,
    receiver: i64,
}

impl HttpBackendSync {
    pub fn new(
        url: String,
        auth_token: Option<String>,
        receiver: i64,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("mindmate-chat/backend-sync")
            .build()?;

        Ok(Self {
            client,
            url,
            auth_token: auth_token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            receiver,
        })
    }
}

#[async_trait]
impl BackendSync for HttpBackendSync {
    /// Without a token (signed-out user) nothing is sent.
    async fn notify(&self, message: &Message) -> Result<(), SyncError> {
        let Some(token) = self.auth_token.as_deref() else {
            debug!("No backend token, skipping sync");
            return Ok(());
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .json(&ChatPayload {
                receiver: self.receiver,
                content: &message.text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status { status, body });
        }

        Ok(())
    }
}

/// Sync target that accepts everything and sends nothing.
pub struct NoopSync;

#[async_trait]
impl BackendSync for NoopSync {
    async fn notify(&self, _message: &Message) -> Result<(), SyncError> {
        Ok(())
    }
}
