use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::exchange::{ExchangeOutcome, MessageExchange};
use crate::models::{Conversation, ConversationSummary, DEFAULT_TITLE};

#[derive(Clone)]
pub struct AppState {
    exchange: Arc<MessageExchange>,
}

async fn health_check() -> impl IntoResponse {
    "MindMate chat is running"
}

// --- Conversation API Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationList {
    pub active_id: String,
    pub conversations: Vec<ConversationSummary>,
}

async fn list_conversations(State(state): State<AppState>) -> Json<ConversationList> {
    let store = state.exchange.store();
    Json(ConversationList {
        active_id: store.active_id().await,
        conversations: store.summaries().await,
    })
}

#[derive(Deserialize)]
struct CreateConversationReq {
    title: Option<String>,
}
async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationReq>,
) -> (StatusCode, Json<Conversation>) {
    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let conv = state.exchange.store().create(title).await;
    (StatusCode::CREATED, Json(conv))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, StatusCode> {
    state
        .exchange
        .store()
        .get(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn delete_conversation(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.exchange.store().delete(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn clear_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, StatusCode> {
    let store = state.exchange.store();
    if !store.clear_messages(&id).await {
        return Err(StatusCode::NOT_FOUND);
    }
    store.get(&id).await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
struct PostMessageReq {
    text: String,
}
async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PostMessageReq>,
) -> Result<Json<ExchangeOutcome>, StatusCode> {
    match state.exchange.send_user_message(&id, &req.text).await {
        ExchangeOutcome::Skipped => Err(StatusCode::BAD_REQUEST),
        ExchangeOutcome::ConversationMissing => Err(StatusCode::NOT_FOUND),
        outcome => Ok(Json(outcome)),
    }
}

async fn get_active(State(state): State<AppState>) -> Json<Conversation> {
    Json(state.exchange.store().get_active().await)
}

#[derive(Deserialize)]
struct SetActiveReq {
    id: String,
}
async fn set_active(State(state): State<AppState>, Json(req): Json<SetActiveReq>) -> StatusCode {
    if state.exchange.store().set_active(&req.id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub fn router(exchange: Arc<MessageExchange>) -> Router {
    let api = Router::new()
        .route("/conversations", get(list_conversations).post(create_conversation))
        .route("/conversations/{id}", get(get_conversation).delete(delete_conversation))
        .route("/conversations/{id}/clear", post(clear_conversation))
        .route("/conversations/{id}/messages", post(post_message))
        .route("/active", get(get_active).put(set_active));

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { exchange })
}
