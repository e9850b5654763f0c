use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ai_service::{DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT};
use crate::backend_sync::{DEFAULT_RECEIVER_ID, DEFAULT_SYNC_URL};
use crate::exchange::DEFAULT_HISTORY_WINDOW;

#[derive(Debug, Clone)]
pub struct AppConfig {
    // --- Server ---
    pub port: String,

    // --- Storage ---
    pub data_dir: PathBuf,

    // --- AI ---
    pub groq_api_url: String,
    pub groq_model: String,
    pub groq_api_key: Option<String>,
    pub system_prompt: String,
    pub history_window: usize,
    pub request_timeout: Duration,

    // --- Backend sync ---
    pub backend_sync_url: String,
    pub backend_auth_token: Option<String>,
    pub backend_receiver_id: i64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // dotenv belongs HERE, nowhere else
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env::var("PORT").unwrap_or_else(|_| "3001".into()),

            data_dir: env::var("CHAT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./mindmate-data")),

            groq_api_url: env::var("GROQ_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            groq_api_key: optional("GROQ_API_KEY"),
            system_prompt: env::var("SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.into()),
            history_window: parsed("HISTORY_WINDOW")?.unwrap_or(DEFAULT_HISTORY_WINDOW),
            request_timeout: Duration::from_secs(parsed("REQUEST_TIMEOUT_SECS")?.unwrap_or(30)),

            backend_sync_url: env::var("BACKEND_SYNC_URL")
                .unwrap_or_else(|_| DEFAULT_SYNC_URL.into()),
            backend_auth_token: optional("BACKEND_AUTH_TOKEN"),
            backend_receiver_id: parsed("BACKEND_RECEIVER_ID")?.unwrap_or(DEFAULT_RECEIVER_ID),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(key)
        .map(|v| v.trim().parse::<T>().with_context(|| format!("{key} is not valid")))
        .transpose()
}
