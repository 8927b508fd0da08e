//! Shared test doubles for exercising the store and controller without a
//! running Ollama server.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::{Mutex, Notify};

use crate::api::{BackendError, ChatBackend, ModelEntry};
use crate::core::controller::ChatController;
use crate::core::store::ChatStore;

pub fn entries(names: &[&str]) -> Vec<ModelEntry> {
    names.iter().map(|n| ModelEntry::named(*n)).collect()
}

pub fn controller_with(backend: StubBackend) -> Arc<ChatController> {
    let backend: Arc<dyn ChatBackend> = Arc::new(backend);
    let store = Arc::new(Mutex::new(ChatStore::new(Arc::clone(&backend))));
    Arc::new(ChatController::new(store, backend))
}

/// Scriptable in-memory backend. Builders configure the responses; atomic
/// counters record what the code under test actually asked for.
#[derive(Default)]
pub struct StubBackend {
    models: StdMutex<Vec<ModelEntry>>,
    reply: StdMutex<Option<String>>,
    list_failing: AtomicBool,
    generate_failing: AtomicBool,
    list_calls: Arc<AtomicUsize>,
    generate_calls: Arc<AtomicUsize>,
    last_model: StdMutex<Option<String>>,
    gate: StdMutex<Option<Arc<Notify>>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(self, models: Vec<ModelEntry>) -> Self {
        *self.models.lock().unwrap() = models;
        self
    }

    pub fn with_reply(self, reply: &str) -> Self {
        *self.reply.lock().unwrap() = Some(reply.to_string());
        self
    }

    pub fn failing_list(self) -> Self {
        self.list_failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_generate(self) -> Self {
        self.generate_failing.store(true, Ordering::SeqCst);
        self
    }

    /// Makes `generate` park on `gate` after recording the call, so tests
    /// can observe the in-flight state before releasing the reply.
    pub fn gated(self, gate: Arc<Notify>) -> Self {
        *self.gate.lock().unwrap() = Some(gate);
        self
    }

    pub fn set_list_failing(&self, failing: bool) {
        self.list_failing.store(failing, Ordering::SeqCst);
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.list_calls)
    }

    pub fn last_model(&self) -> Option<String> {
        self.last_model.lock().unwrap().clone()
    }

    fn stub_error() -> BackendError {
        BackendError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "stub failure".to_string(),
        }
    }
}

#[async_trait]
impl ChatBackend for StubBackend {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_failing.load(Ordering::SeqCst) {
            return Err(Self::stub_error());
        }
        Ok(self.models.lock().unwrap().clone())
    }

    async fn generate(&self, model: &str, _prompt: &str) -> Result<String, BackendError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_model.lock().unwrap() = Some(model.to_string());
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.generate_failing.load(Ordering::SeqCst) {
            return Err(Self::stub_error());
        }
        let reply = self.reply.lock().unwrap().clone();
        Ok(reply.unwrap_or_else(|| "stub reply".to_string()))
    }
}
