//! Ollachat is a terminal chat client for a locally running Ollama server.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: the conversation store, the chat
//!   controller with its listener registry, model-availability polling,
//!   and configuration.
//! - [`api`] defines the Ollama wire payloads and the HTTP client, behind
//!   the `ChatBackend` trait so the core can be exercised without a
//!   running server.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that forwards user intents to the controller.
//! - [`cli`] parses command-line arguments and dispatches into the chat
//!   loop or the one-shot model listing.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
