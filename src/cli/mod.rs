//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the
//! appropriate commands.

pub mod model_list;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::info;

use crate::api::{ChatBackend, OllamaClient};
use crate::cli::model_list::list_models;
use crate::core::config::Config;
use crate::core::controller::ChatController;
use crate::core::poller;
use crate::core::store::ChatStore;
use crate::ui::run_chat;

#[derive(Parser)]
#[command(name = "ollachat")]
#[command(about = "A terminal chat client for a locally running Ollama server")]
#[command(
    long_about = "Ollachat is a full-screen terminal chat client for a locally running \
Ollama server. It manages multiple named conversations, switches between the models \
the server reports, and keeps probing the server so you can see at a glance whether \
it is up.\n\n\
Environment Variables:\n\
  OLLAMA_HOST       Ollama server address (optional, defaults to http://localhost:11434)\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Tab / Shift+Tab   Switch between conversations\n\
  Ctrl+N            New conversation\n\
  Ctrl+D            Delete the current conversation\n\
  Ctrl+L            Cycle through available models\n\
  Up/Down           Scroll through chat history\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to select at startup
    #[arg(short, long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Ollama base URL (overrides config file and OLLAMA_HOST)
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Seconds between backend liveness probes
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Write diagnostics to the given file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List the models the server reports, then exit
    Models,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    crate::logging::init(args.log.as_deref())?;

    let mut config = Config::load()?;
    config.apply_env();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(secs) = args.poll_interval {
        config.poll_interval_secs = secs;
    }
    info!(base_url = %config.base_url, "starting");

    let backend: Arc<dyn ChatBackend> =
        Arc::new(OllamaClient::new(&config.base_url, config.request_timeout())?);

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Models => list_models(backend.as_ref()).await,
        Commands::Chat => {
            let store = Arc::new(Mutex::new(ChatStore::new(Arc::clone(&backend))));
            let controller = Arc::new(ChatController::new(store, backend));
            controller.initialize().await;

            if let Some(model) = args.model.or_else(|| config.default_model.clone()) {
                controller.set_model(&model).await;
            }

            let poller = poller::spawn(Arc::clone(&controller), config.poll_interval());
            let result = run_chat(controller).await;
            poller.abort();
            result
        }
    }
}
