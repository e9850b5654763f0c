use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ai_service::{AIMessage, ReplyService};
use crate::backend_sync::BackendSync;
use crate::fallback;
use crate::models::{Conversation, Message, MessageRole};
use crate::store::ConversationStore;

pub const DEFAULT_HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Remote,
    Fallback,
}

/// Stages one exchange walks through, each at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeStage {
    UserMessageAppended,
    RemoteSyncAttempted,
    ReplyPending,
    ReplyResolved(ReplySource),
    AssistantMessageAppended,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExchangeOutcome {
    /// Empty or whitespace-only text; nothing was stored.
    Skipped,
    /// The target conversation does not exist; nothing was stored.
    ConversationMissing,
    /// `delivered` is false when the conversation was deleted while the reply
    /// was pending and the late reply was dropped.
    Completed {
        user: Message,
        reply: Message,
        source: ReplySource,
        delivered: bool,
    },
}

/// Runs the user-message → reply cycle against a [`ConversationStore`].
pub struct MessageExchange {
    store: Arc<ConversationStore>,
    sync: Arc<dyn BackendSync>,
    replies: Arc<dyn ReplyService>,
    history_window: usize,
}

impl MessageExchange {
    pub fn new(
        store: Arc<ConversationStore>,
        sync: Arc<dyn BackendSync>,
        replies: Arc<dyn ReplyService>,
    ) -> Self {
        Self {
            store,
            sync,
            replies,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Stores the user's message and exactly one assistant reply, remote if the
    /// assistant service answers and canned otherwise.
    pub async fn send_user_message(&self, conversation_id: &str, text: &str) -> ExchangeOutcome {
        let text = text.trim();
        if text.is_empty() {
            debug!(conversation_id, "Ignoring empty message");
            return ExchangeOutcome::Skipped;
        }

        let user = Message::user(text);
        if !self.store.append(conversation_id, user.clone()).await {
            return ExchangeOutcome::ConversationMissing;
        }
        trace_stage(conversation_id, ExchangeStage::UserMessageAppended);

        if let Err(e) = self.sync.notify(&user).await {
            warn!(conversation_id, "Backend sync failed: {}", e);
        }
        trace_stage(conversation_id, ExchangeStage::RemoteSyncAttempted);

        trace_stage(conversation_id, ExchangeStage::ReplyPending);
        let (reply_text, source) = self.resolve_reply(conversation_id, &user).await;
        trace_stage(conversation_id, ExchangeStage::ReplyResolved(source));

        let reply = Message::assistant(reply_text);
        let delivered = self.store.append(conversation_id, reply.clone()).await;
        if delivered {
            trace_stage(conversation_id, ExchangeStage::AssistantMessageAppended);
        } else {
            info!(conversation_id, "Conversation removed while reply was pending, discarding reply");
        }

        ExchangeOutcome::Completed {
            user,
            reply,
            source,
            delivered,
        }
    }

    async fn resolve_reply(&self, conversation_id: &str, user: &Message) -> (String, ReplySource) {
        let snapshot = self.store.get(conversation_id).await;
        let history = match &snapshot {
            Some(conv) => history_window(conv, self.history_window),
            None => vec![AIMessage::new("user", user.text.as_str())],
        };

        match self.replies.generate_response(&history).await {
            Ok(text) => (text, ReplySource::Remote),
            Err(e) => {
                warn!(conversation_id, "Assistant reply failed, using fallback: {}", e);
                let text = match &snapshot {
                    Some(conv) => fallback::reply_to_conversation(conv),
                    None => fallback::reply_for(&user.text),
                };
                (text.to_string(), ReplySource::Fallback)
            }
        }
    }
}

/// Trailing `window` messages in the remote role vocabulary, always ending on
/// a user turn.
fn history_window(conv: &Conversation, window: usize) -> Vec<AIMessage> {
    let start = conv.messages.len().saturating_sub(window);
    let mut history: Vec<AIMessage> = conv.messages[start..]
        .iter()
        .map(|m| AIMessage::new(m.role.as_str(), m.text.as_str()))
        .collect();

    let ends_on_user = history
        .last()
        .is_some_and(|m| m.role == MessageRole::User.as_str());
    if !ends_on_user {
        if let Some(last_user) = conv.last_user_message() {
            history.push(AIMessage::new("user", last_user.text.as_str()));
        }
    }

    history
}

fn trace_stage(conversation_id: &str, stage: ExchangeStage) {
    debug!(conversation_id, ?stage, "Exchange stage");
}
