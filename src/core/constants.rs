//! Shared constants used across the application

/// Default base URL for the local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model used for a send when neither the controller, the conversation,
/// nor the model list can name one.
pub const FALLBACK_MODEL: &str = "llama2";

/// Title of the conversation created automatically at startup.
pub const INITIAL_CONVERSATION_TITLE: &str = "New Chat";

/// Title used when a conversation is created without an explicit one.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Seconds between backend liveness probes.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Seconds before an in-flight backend request is abandoned and reported
/// as a failed turn.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
