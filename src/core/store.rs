//! The conversation store: authoritative holder of conversations, the
//! active selection, known models, and backend liveness.
//!
//! The store performs no I/O of its own beyond the injected
//! [`ChatBackend`] handle; sends return a detached future so callers
//! never hold the store lock across the network await.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{ChatBackend, ModelEntry};
use crate::core::ids;
use crate::core::message::Conversation;

/// Liveness of the model backend as last observed by the poller.
#[derive(Debug, Clone)]
pub struct BackendStatus {
    pub running: bool,
    pub error: Option<String>,
}

pub struct ChatStore {
    backend: Arc<dyn ChatBackend>,
    conversations: Vec<Conversation>,
    active_conversation_id: Option<String>,
    available_models: Vec<ModelEntry>,
    selected_model: Option<String>,
    initialized: bool,
    status: BackendStatus,
}

impl ChatStore {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            conversations: Vec::new(),
            active_conversation_id: None,
            available_models: Vec::new(),
            selected_model: None,
            initialized: false,
            // Optimistic until the first probe reports.
            status: BackendStatus {
                running: true,
                error: None,
            },
        }
    }

    /// Fetches the model list and seeds the selected model. Idempotent: a
    /// second call returns the cached list without touching the backend.
    ///
    /// A fetch failure is absorbed into a built-in fallback list so that
    /// startup never blocks on the backend; the poller replaces the list
    /// with reality on its next successful probe.
    pub async fn initialize(&mut self) -> &[ModelEntry] {
        if self.initialized {
            return &self.available_models;
        }
        self.available_models = match self.backend.list_models().await {
            Ok(models) => models,
            Err(err) => {
                warn!(error = %err, "model listing failed during initialization, using fallback list");
                Self::fallback_models()
            }
        };
        if self.selected_model.is_none() {
            self.selected_model = self.available_models.first().map(|m| m.name.clone());
        }
        self.initialized = true;
        &self.available_models
    }

    fn fallback_models() -> Vec<ModelEntry> {
        ["llama2", "mistral", "gemma"]
            .into_iter()
            .map(ModelEntry::named)
            .collect()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Appends an empty conversation, makes it active, and returns its id.
    pub fn create_conversation(&mut self, title: &str, model_id: Option<String>) -> String {
        let id = ids::next_id();
        self.conversations
            .push(Conversation::new(id.clone(), title, model_id));
        self.active_conversation_id = Some(id.clone());
        debug!(conversation = %id, title, "created conversation");
        id
    }

    pub fn conversation_by_id(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn conversation_by_id_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active_conversation_id
            .as_deref()
            .and_then(|id| self.conversation_by_id(id))
    }

    pub fn active_conversation_id(&self) -> Option<&str> {
        self.active_conversation_id.as_deref()
    }

    /// Unconditional assignment; callers are expected to pass a known id.
    pub fn set_active_conversation(&mut self, id: &str) {
        self.active_conversation_id = Some(id.to_string());
    }

    /// Removes the conversation and, when it was active, re-assigns the
    /// active pointer to the first remaining conversation (or clears it).
    /// Returns whether anything was removed.
    pub fn delete_conversation(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return false;
        }
        if self.active_conversation_id.as_deref() == Some(id) {
            self.active_conversation_id = self.conversations.first().map(|c| c.id.clone());
        }
        true
    }

    pub fn all_conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn available_models(&self) -> &[ModelEntry] {
        &self.available_models
    }

    /// Validates and records the selected model. Empty names fail; any
    /// name is accepted while no models are known (the backend may not
    /// have reported yet); once models are known, unknown names leave the
    /// selection unchanged and report failure.
    pub fn set_selected_model(&mut self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if self.available_models.is_empty() {
            warn!(model = name, "no models known yet, accepting requested model");
            self.selected_model = Some(name.to_string());
            return true;
        }
        if !self.available_models.iter().any(|m| m.name == name) {
            warn!(model = name, "model not present in available models");
            if self.selected_model.is_none() {
                self.selected_model = self.available_models.first().map(|m| m.name.clone());
            }
            return false;
        }
        self.selected_model = Some(name.to_string());
        true
    }

    /// The selection in effect: the explicitly chosen model, else the
    /// first available one.
    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model
            .as_deref()
            .or_else(|| self.available_models.first().map(|m| m.name.as_str()))
    }

    pub fn backend_status(&self) -> &BackendStatus {
        &self.status
    }

    /// Poller result: backend reachable. Replaces the model list, clears
    /// any stored error, and seeds the selection if none was made yet.
    pub fn apply_poll_success(&mut self, models: Vec<ModelEntry>) {
        self.available_models = models;
        self.status.running = true;
        self.status.error = None;
        if self.selected_model.is_none() {
            self.selected_model = self.available_models.first().map(|m| m.name.clone());
        }
    }

    /// Poller result: backend unreachable. Clears the model list and
    /// records a human-readable remediation message.
    pub fn apply_poll_failure(&mut self, error: String) {
        self.available_models.clear();
        self.status.running = false;
        self.status.error = Some(error);
    }

    /// Builds the outbound chat call as a detached future. The future
    /// captures its own backend handle, so the store lock can be dropped
    /// before awaiting it. It always resolves to a displayable string:
    /// transport, status, and parse failures become a user-facing apology
    /// naming the model.
    pub fn send_message_to_backend(
        &self,
        text: &str,
        model: &str,
    ) -> impl Future<Output = String> + Send + 'static {
        let backend = Arc::clone(&self.backend);
        let prompt = text.to_string();
        let model = model.to_string();
        async move {
            match backend.generate(&model, &prompt).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(error = %err, model, "generate request failed");
                    format!(
                        "Sorry, I couldn't reach the Ollama service. Please make sure \
                         Ollama is running with the {model} model pulled."
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{entries, StubBackend};
    use std::collections::HashSet;

    fn store_with(backend: StubBackend) -> ChatStore {
        ChatStore::new(Arc::new(backend))
    }

    #[test]
    fn created_conversations_have_unique_ids_and_become_active() {
        let mut store = store_with(StubBackend::new());
        let mut seen = HashSet::new();
        for i in 0..50 {
            let id = store.create_conversation(&format!("Chat {i}"), None);
            assert!(seen.insert(id.clone()), "duplicate conversation id");
            assert_eq!(store.active_conversation_id(), Some(id.as_str()));
        }
    }

    #[test]
    fn model_id_round_trips_through_lookup() {
        let mut store = store_with(StubBackend::new());
        let id = store.create_conversation("Chat", Some("phi".into()));
        let conversation = store.conversation_by_id(&id).unwrap();
        assert_eq!(conversation.model_id.as_deref(), Some("phi"));
    }

    #[test]
    fn lookup_of_unknown_id_is_none() {
        let store = store_with(StubBackend::new());
        assert!(store.conversation_by_id("nope").is_none());
    }

    #[test]
    fn deleting_active_reassigns_to_first_remaining() {
        let mut store = store_with(StubBackend::new());
        let first = store.create_conversation("One", None);
        let second = store.create_conversation("Two", None);
        assert!(store.delete_conversation(&second));
        assert_eq!(store.active_conversation_id(), Some(first.as_str()));
    }

    #[test]
    fn deleting_last_conversation_clears_active() {
        let mut store = store_with(StubBackend::new());
        let only = store.create_conversation("One", None);
        assert!(store.delete_conversation(&only));
        assert_eq!(store.active_conversation_id(), None);
        assert!(!store.delete_conversation(&only));
    }

    #[test]
    fn selected_model_rejects_empty_and_unknown_names() {
        let mut store = store_with(StubBackend::new());
        store.apply_poll_success(entries(&["alpha", "beta"]));
        assert_eq!(store.selected_model(), Some("alpha"));

        assert!(!store.set_selected_model(""));
        assert!(!store.set_selected_model("gamma"));
        assert_eq!(store.selected_model(), Some("alpha"));

        assert!(store.set_selected_model("beta"));
        assert_eq!(store.selected_model(), Some("beta"));
    }

    #[test]
    fn selected_model_accepts_anything_before_models_are_known() {
        let mut store = store_with(StubBackend::new());
        assert!(store.set_selected_model("not-pulled-yet"));
        assert_eq!(store.selected_model(), Some("not-pulled-yet"));
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let backend = StubBackend::new().with_models(entries(&["alpha"]));
        let list_calls = backend.list_calls_handle();
        let mut store = ChatStore::new(Arc::new(backend));

        let first: Vec<String> = store.initialize().await.iter().map(|m| m.name.clone()).collect();
        let second: Vec<String> = store.initialize().await.iter().map(|m| m.name.clone()).collect();

        assert_eq!(first, ["alpha"]);
        assert_eq!(second, first);
        assert_eq!(list_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(store.selected_model(), Some("alpha"));
    }

    #[tokio::test]
    async fn initialize_falls_back_when_listing_fails() {
        let mut store = store_with(StubBackend::new().failing_list());
        let names: Vec<String> = store.initialize().await.iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, ["llama2", "mistral", "gemma"]);
        assert!(store.is_initialized());
    }

    #[test]
    fn poll_failure_clears_models_and_records_error() {
        let mut store = store_with(StubBackend::new());
        store.apply_poll_success(entries(&["alpha"]));
        assert!(store.backend_status().running);

        store.apply_poll_failure("start the Ollama service".into());
        assert!(!store.backend_status().running);
        assert!(store.available_models().is_empty());
        assert!(store
            .backend_status()
            .error
            .as_deref()
            .unwrap()
            .contains("Ollama"));

        store.apply_poll_success(entries(&["alpha"]));
        assert!(store.backend_status().running);
        assert!(store.backend_status().error.is_none());
    }

    #[tokio::test]
    async fn failed_send_resolves_to_apology_naming_the_model() {
        let store = store_with(StubBackend::new().failing_generate());
        let reply = store.send_message_to_backend("hi", "phi").await;
        assert!(reply.contains("phi"));
        assert!(reply.contains("Sorry"));
    }

    #[tokio::test]
    async fn successful_send_resolves_to_reply() {
        let store = store_with(StubBackend::new().with_reply("pong"));
        let reply = store.send_message_to_backend("ping", "phi").await;
        assert_eq!(reply, "pong");
    }
}
