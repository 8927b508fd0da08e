//! Periodic backend liveness probe.
//!
//! Ollama is an independently started process; this task keeps the model
//! list fresh and flips the store's liveness flag so the UI can show a
//! remediation notice instead of silently failing sends. The probe loop
//! is independent of the send path: a send issued while the backend is
//! down still produces its own per-message error bubble.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::controller::ChatController;

/// Probes immediately on spawn and then once per `period`. Abort the
/// returned handle to stop polling.
pub fn spawn(controller: Arc<ChatController>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            controller.refresh_models().await;
        }
    })
}
