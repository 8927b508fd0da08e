//! The chat controller: single coordination point between UI intents and
//! the store.
//!
//! Every mutating operation ends with a synchronous pass over the
//! listener registry, including the asynchronous completion of a send, so
//! the UI can redraw from a fresh store snapshot. The controller itself
//! carries no session state beyond the current model.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::api::{ChatBackend, ModelEntry};
use crate::core::constants::{
    DEFAULT_CONVERSATION_TITLE, FALLBACK_MODEL, INITIAL_CONVERSATION_TITLE,
};
use crate::core::message::{Conversation, Message};
use crate::core::store::{BackendStatus, ChatStore};

pub type Listener = Box<dyn Fn() + Send + Sync>;

/// Token returned by [`ChatController::add_listener`]; pass it back to
/// [`ChatController::remove_listener`] to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

pub struct ChatController {
    store: Arc<Mutex<ChatStore>>,
    backend: Arc<dyn ChatBackend>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    current_model: Mutex<Option<String>>,
}

impl ChatController {
    pub fn new(store: Arc<Mutex<ChatStore>>, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            store,
            backend,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            current_model: Mutex::new(None),
        }
    }

    /// Initializes the store, adopts its selected model, and guarantees at
    /// least one conversation exists before the first render.
    pub async fn initialize(&self) {
        {
            let mut store = self.store.lock().await;
            store.initialize().await;
            *self.current_model.lock().await = store.selected_model().map(str::to_string);
            if store.all_conversations().is_empty() {
                store.create_conversation(INITIAL_CONVERSATION_TITLE, None);
            }
        }
        self.notify_listeners().await;
    }

    pub async fn add_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().await.push((id, Box::new(listener)));
        ListenerId(id)
    }

    pub async fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().await.retain(|(lid, _)| *lid != id.0);
    }

    async fn notify_listeners(&self) {
        let listeners = self.listeners.lock().await;
        for (_, listener) in listeners.iter() {
            listener();
        }
    }

    /// Sends `text` as the user's next turn in the active conversation.
    ///
    /// The user message is appended and published before the network call
    /// starts; the reply (or a visible error bubble) lands in the
    /// conversation the send was issued against, even if the user has
    /// switched away in the meantime. Whitespace-only input and a missing
    /// active conversation are logged no-ops.
    pub async fn send_message(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring empty message");
            return;
        }

        let (conversation_id, model, reply_future) = {
            let mut store = self.store.lock().await;
            let Some(conversation_id) = store.active_conversation().map(|c| c.id.clone()) else {
                error!("no active conversation, dropping message");
                return;
            };

            let current_model = self.current_model.lock().await.clone();
            let model = current_model
                .clone()
                .or_else(|| {
                    store
                        .conversation_by_id(&conversation_id)
                        .and_then(|c| c.model_id.clone())
                })
                .or_else(|| store.available_models().first().map(|m| m.name.clone()))
                .unwrap_or_else(|| FALLBACK_MODEL.to_string());

            if let Some(conversation) = store.conversation_by_id_mut(&conversation_id) {
                conversation.add_message(Message::user(text, current_model));
            }

            // The future owns its backend handle; the store lock is
            // released before it is awaited.
            let reply_future = store.send_message_to_backend(text, &model);
            (conversation_id, model, reply_future)
        };
        self.notify_listeners().await;

        let reply = reply_future.await;

        {
            let mut store = self.store.lock().await;
            match store.conversation_by_id_mut(&conversation_id) {
                Some(conversation) => {
                    conversation.add_message(Message::assistant(reply, Some(model)));
                }
                // Conversation deleted while the request was in flight.
                None => debug!(conversation = %conversation_id, "dropping reply for deleted conversation"),
            }
        }
        self.notify_listeners().await;
    }

    /// Attempts to select `model_id`. On store rejection the controller
    /// falls back to whatever the store resolved and logs a warning;
    /// listeners are notified either way so the UI reflects the outcome.
    pub async fn set_model(&self, model_id: &str) {
        {
            let mut store = self.store.lock().await;
            if store.set_selected_model(model_id) {
                *self.current_model.lock().await = Some(model_id.to_string());
                let active_id = store.active_conversation().map(|c| c.id.clone());
                if let Some(conversation) =
                    active_id.and_then(|id| store.conversation_by_id_mut(&id))
                {
                    conversation.model_id = Some(model_id.to_string());
                }
            } else {
                warn!(model = model_id, "model rejected, keeping store selection");
                *self.current_model.lock().await = store.selected_model().map(str::to_string);
            }
        }
        self.notify_listeners().await;
    }

    /// One liveness probe against the backend; used by the poller task and
    /// by the UI's manual retry.
    pub async fn refresh_models(&self) {
        match self.backend.list_models().await {
            Ok(models) => {
                self.store.lock().await.apply_poll_success(models);
            }
            Err(err) => {
                debug!(error = %err, "model poll failed");
                self.store.lock().await.apply_poll_failure(
                    "Could not reach the Ollama server. Start it with `ollama serve`, \
                     then retry."
                        .to_string(),
                );
            }
        }
        self.notify_listeners().await;
    }

    pub async fn create_new_conversation(
        &self,
        title: Option<&str>,
        model_id: Option<String>,
    ) -> String {
        let id = {
            let mut store = self.store.lock().await;
            store.create_conversation(title.unwrap_or(DEFAULT_CONVERSATION_TITLE), model_id)
        };
        self.notify_listeners().await;
        id
    }

    pub async fn set_active_conversation(&self, id: &str) {
        self.store.lock().await.set_active_conversation(id);
        self.notify_listeners().await;
    }

    pub async fn delete_conversation(&self, id: &str) -> bool {
        let removed = self.store.lock().await.delete_conversation(id);
        self.notify_listeners().await;
        removed
    }

    pub async fn all_conversations(&self) -> Vec<Conversation> {
        self.store.lock().await.all_conversations().to_vec()
    }

    pub async fn active_conversation(&self) -> Option<Conversation> {
        self.store.lock().await.active_conversation().cloned()
    }

    /// Messages of the given conversation, defaulting to the active one.
    pub async fn conversation_messages(&self, id: Option<&str>) -> Vec<Message> {
        let store = self.store.lock().await;
        let conversation = match id {
            Some(id) => store.conversation_by_id(id),
            None => store.active_conversation(),
        };
        conversation.map(|c| c.messages().to_vec()).unwrap_or_default()
    }

    pub async fn available_models(&self) -> Vec<ModelEntry> {
        self.store.lock().await.available_models().to_vec()
    }

    pub async fn backend_status(&self) -> BackendStatus {
        self.store.lock().await.backend_status().clone()
    }

    pub async fn current_model(&self) -> Option<String> {
        self.current_model.lock().await.clone()
    }
}
