//! Error kinds returned by the persistence and remote collaborators.
//!
//! None of these reach the conversation itself: the store and the exchange
//! log them and fall back.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures from a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures while notifying the chat backend of a new message.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Failures while asking the remote assistant for a reply.
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("no API key configured for the assistant service")]
    MissingApiKey,

    #[error("assistant request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("assistant service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed assistant response: {0}")]
    Malformed(String),
}
