//! Unique id generation for conversations and messages.
//!
//! Ids combine a millisecond timestamp with a process-wide atomic counter,
//! so they stay unique even when several conversations or messages are
//! created within the same millisecond.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh id, unique for the lifetime of the process.
pub fn next_id() -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", Utc::now().timestamp_millis(), seq)
}
