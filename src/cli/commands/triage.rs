//! Request triage command.

use async_trait::async_trait;
use console::style;

use crate::cli::session::{run_loop, TurnHandler, EXIT_SENTINELS};
use crate::config::Settings;
use crate::llm::{ChatModel, GeminiClient};
use crate::triage::Triager;

#[async_trait]
impl<'a, M: ChatModel + ?Sized> TurnHandler for Triager<'a, M> {
    async fn handle(&mut self, line: &str) -> anyhow::Result<String> {
        let result = self.classify(line).await?;
        Ok(result.to_json_pretty())
    }
}

/// Classify messages read from stdin until the session ends.
pub async fn cmd_triage(settings: &Settings) -> anyhow::Result<()> {
    let client = GeminiClient::new(settings.llm.clone())?;
    let mut triager = Triager::new(&client);

    println!(
        "{} (model {})",
        style("Service-desk triage").bold(),
        settings.llm.model
    );
    println!(
        "Type a request, or '{}' to leave.\n",
        EXIT_SENTINELS[0]
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let turns = run_loop(stdin, &mut stdout, "> ", &mut triager).await?;
    tracing::info!("Triage session ended after {} message(s)", turns);

    Ok(())
}
