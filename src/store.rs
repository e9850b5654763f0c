use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::models::{
    Conversation, ConversationSummary, Message, CLEARED_TEXT, DEFAULT_TITLE, GREETING_TEXT,
    WELCOME_TITLE,
};
use crate::storage::KeyValueStore;

/// Storage key holding the full conversation set as JSON
pub const CONVERSATIONS_KEY: &str = "mindmate_conversations_v1";
/// Storage key holding the raw id of the active conversation
pub const ACTIVE_KEY: &str = "mindmate_active_conversation_id";

/// Invariant: `conversations` is never empty and `active_id` names one of them.
struct StoreState {
    conversations: Vec<Conversation>,
    active_id: String,
}

impl StoreState {
    fn position(&self, id: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn active_index(&self) -> usize {
        self.position(&self.active_id).unwrap_or(0)
    }
}

/// Owns the conversation set and the active pointer.
///
/// Every mutation rewrites the whole set through the [`KeyValueStore`]; two
/// writers racing on the same storage resolve as last write wins.
pub struct ConversationStore {
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<StoreState>,
}

impl ConversationStore {
    /// Loads the persisted set. Absent, empty or malformed data is replaced by a
    /// single welcome conversation, which becomes active.
    pub async fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let mut conversations = read_conversations(storage.as_ref()).await;
        let mut dirty = false;

        for conv in conversations.iter_mut().filter(|c| c.messages.is_empty()) {
            warn!(conversation_id = %conv.id, "Stored conversation had no messages, reseeding");
            conv.messages.push(Message::assistant(GREETING_TEXT));
            dirty = true;
        }

        if conversations.is_empty() {
            info!("No stored conversations, creating welcome conversation");
            conversations.push(Conversation::new(WELCOME_TITLE));
            dirty = true;
        }

        let stored_active = match storage.get(ACTIVE_KEY).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read active conversation id: {}", e);
                None
            }
        };

        let active_id = match stored_active {
            Some(id) if conversations.iter().any(|c| c.id == id) => id,
            stale => {
                if let Some(id) = stale {
                    debug!(stale_id = %id, "Active conversation id is stale, using first");
                }
                dirty = true;
                conversations[0].id.clone()
            }
        };

        let store = Self {
            storage,
            state: Mutex::new(StoreState {
                conversations,
                active_id,
            }),
        };

        if dirty {
            let state = store.state.lock().await;
            store.persist(&state).await;
        }

        store
    }

    /// All conversations, newest created first
    pub async fn list(&self) -> Vec<Conversation> {
        self.state.lock().await.conversations.clone()
    }

    pub async fn summaries(&self) -> Vec<ConversationSummary> {
        self.state
            .lock()
            .await
            .conversations
            .iter()
            .map(ConversationSummary::from)
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<Conversation> {
        let state = self.state.lock().await;
        state.position(id).map(|i| state.conversations[i].clone())
    }

    /// Creates a greeting-seeded conversation at the front of the set and makes it active.
    pub async fn create(&self, title: impl Into<String>) -> Conversation {
        let conv = Conversation::new(title);
        let mut state = self.state.lock().await;

        state.conversations.insert(0, conv.clone());
        state.active_id = conv.id.clone();
        self.persist(&state).await;

        info!(conversation_id = %conv.id, "Created conversation");
        conv
    }

    /// Appends to the named conversation. Returns `false` (and stores nothing)
    /// when the conversation no longer exists.
    pub async fn append(&self, conversation_id: &str, message: Message) -> bool {
        let mut state = self.state.lock().await;

        let Some(conv) = state.find_mut(conversation_id) else {
            debug!(conversation_id, "Append to unknown conversation ignored");
            return false;
        };

        conv.messages.push(message);
        self.persist(&state).await;
        true
    }

    /// Replaces the history with a single "cleared" assistant message.
    pub async fn clear_messages(&self, conversation_id: &str) -> bool {
        let mut state = self.state.lock().await;

        let Some(conv) = state.find_mut(conversation_id) else {
            debug!(conversation_id, "Clear on unknown conversation ignored");
            return false;
        };

        conv.messages = vec![Message::assistant(CLEARED_TEXT)];
        self.persist(&state).await;
        true
    }

    /// Removes a conversation. The set is reseeded when it becomes empty, and a
    /// deleted active conversation hands the pointer to the new first entry.
    pub async fn delete(&self, conversation_id: &str) -> bool {
        let mut state = self.state.lock().await;

        let Some(index) = state.position(conversation_id) else {
            debug!(conversation_id, "Delete of unknown conversation ignored");
            return false;
        };

        state.conversations.remove(index);
        if state.conversations.is_empty() {
            state.conversations.push(Conversation::new(DEFAULT_TITLE));
        }
        if state.active_id == conversation_id || state.position(&state.active_id).is_none() {
            state.active_id = state.conversations[0].id.clone();
        }
        self.persist(&state).await;

        info!(conversation_id, "Deleted conversation");
        true
    }

    /// Points the store at an existing conversation. Unknown ids are ignored.
    pub async fn set_active(&self, conversation_id: &str) -> bool {
        let mut state = self.state.lock().await;

        if state.position(conversation_id).is_none() {
            debug!(conversation_id, "Cannot activate unknown conversation");
            return false;
        }

        state.active_id = conversation_id.to_string();
        self.persist_active(&state).await;
        true
    }

    pub async fn get_active(&self) -> Conversation {
        let state = self.state.lock().await;
        state.conversations[state.active_index()].clone()
    }

    pub async fn active_id(&self) -> String {
        let state = self.state.lock().await;
        state.conversations[state.active_index()].id.clone()
    }

    async fn persist(&self, state: &StoreState) {
        match serde_json::to_string(&state.conversations) {
            Ok(payload) => {
                if let Err(e) = self.storage.set(CONVERSATIONS_KEY, &payload).await {
                    error!("Failed to persist conversations: {}", e);
                }
            }
            Err(e) => error!("Failed to serialize conversations: {}", e),
        }
        self.persist_active(state).await;
    }

    async fn persist_active(&self, state: &StoreState) {
        if let Err(e) = self.storage.set(ACTIVE_KEY, &state.active_id).await {
            error!("Failed to persist active conversation id: {}", e);
        }
    }
}

async fn read_conversations(storage: &dyn KeyValueStore) -> Vec<Conversation> {
    let raw = match storage.get(CONVERSATIONS_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Failed to read stored conversations: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Conversation>>(&raw) {
        Ok(conversations) => conversations,
        Err(e) => {
            warn!("Stored conversations are corrupt, starting fresh: {}", e);
            Vec::new()
        }
    }
}
