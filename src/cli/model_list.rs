//! Model listing functionality
//!
//! One-shot `ollachat models`: print what the server reports and exit.

use std::error::Error;

use crate::api::ChatBackend;

pub async fn list_models(backend: &dyn ChatBackend) -> Result<(), Box<dyn Error>> {
    let models = backend.list_models().await?;

    if models.is_empty() {
        println!("The server reported no models. Pull one with `ollama pull <name>`.");
        return Ok(());
    }

    println!("Available models:");
    for model in models {
        match model.modified_at {
            Some(modified) => println!("  {} (modified {})", model.name, modified.format("%Y-%m-%d")),
            None => println!("  {}", model.name),
        }
    }
    Ok(())
}
