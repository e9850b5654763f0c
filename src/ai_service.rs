use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ReplyError;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a psychologist";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AIMessage {
    pub role: String,
    pub content: String,
}

impl AIMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Source of assistant replies for a conversation window.
#[async_trait]
pub trait ReplyService: Send + Sync {
    /// `history` is already trimmed and mapped to `user` / `assistant` roles.
    async fn generate_response(&self, history: &[AIMessage]) -> Result<String, ReplyError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<AIMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AIMessage,
}

/// -----------------------------
/// AI Service (Groq / OpenAI compatible)
/// -----------------------------
pub struct AIService {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    system_prompt: String,
}

impl AIService {
    pub fn new(model: String, api_key: Option<String>, timeout: Duration) -> Result<Self, ReplyError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("mindmate-chat/1.0")
            .build()?;

        Ok(Self {
            client,
            endpoint: DEFAULT_API_URL.to_string(),
            model,
            api_key: api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ReplyService for AIService {
    /// Single attempt; any failure is returned so the caller can fall back.
    async fn generate_response(&self, history: &[AIMessage]) -> Result<String, ReplyError> {
        let api_key = self.api_key.as_deref().ok_or(ReplyError::MissingApiKey)?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(AIMessage::new("system", self.system_prompt.as_str()));
        messages.extend(history.iter().cloned());

        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        debug!(model = %self.model, turns = history.len(), "Requesting assistant reply");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Assistant API error {}: {}", status, body);
            return Err(ReplyError::Status { status, body });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ReplyError::Malformed(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ReplyError::Malformed("no choices in response".to_string()))?;

        if content.trim().is_empty() {
            return Err(ReplyError::Malformed("empty reply content".to_string()));
        }

        Ok(content)
    }
}
