//! Environment and model status command.

use anyhow::Context;
use console::style;

use crate::cli::icons::{error, success, warn};
use crate::config::Settings;
use crate::llm::prompts::SMOKE_PROMPT;
use crate::llm::{ChatModel, ChatRequest, GeminiClient};

/// Show model configuration, check external tools and send a smoke prompt.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let llm = &settings.llm;

    println!("\n{}", style("Model Configuration").bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Provider:", llm.provider_name());
    println!("{:<20} {}", "Endpoint:", llm.endpoint);
    println!(
        "{:<20} {}",
        "API Key:",
        if llm.api_key().is_some() {
            "Set"
        } else {
            "Not set"
        }
    );
    println!("{:<20} {}", "Chat Model:", llm.model);
    println!("{:<20} {}", "Embedding Model:", llm.embedding_model);
    println!("{:<20} {:.2}", "Temperature:", llm.temperature);
    println!("{:<20} {}", "Documents:", settings.docs_dir.display());

    println!("\n{}", style("Tools").bold());
    println!("{}", "-".repeat(40));
    match which::which("pdftotext") {
        Ok(path) => println!("{} pdftotext: {}", success(), path.display()),
        Err(_) => println!(
            "{} pdftotext not found. Install with: apt install poppler-utils",
            error()
        ),
    }

    println!("\n{}", style("Smoke Test").bold());
    println!("{}", "-".repeat(40));
    if llm.api_key().is_none() {
        println!("{} {}", warn(), llm.availability_hint());
        return Ok(());
    }

    let client = GeminiClient::new(llm.clone())?;
    println!("{:<20} {}", "Prompt:", SMOKE_PROMPT);
    let reply = client
        .complete(&ChatRequest::new(SMOKE_PROMPT))
        .await
        .with_context(|| llm.availability_hint())?;
    println!("{:<20} {}", "Reply:", reply.trim());
    println!("\n{} Model is reachable", success());

    Ok(())
}
