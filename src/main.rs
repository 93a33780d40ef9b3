//! policydesk - internal policy service-desk assistants.
//!
//! Triage incoming requests and answer policy questions from PDF documents
//! using Google Gemini.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if policydesk::cli::is_verbose() {
        "policydesk=info"
    } else {
        "policydesk=warn"
    };

    // Logs go to stderr; stdout carries the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    policydesk::cli::run().await
}
