//! Policy question-answering command.

use std::time::Duration;

use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::icons::{dim_arrow, success, warn};
use crate::cli::session::{run_loop, TurnHandler, EXIT_SENTINELS};
use crate::config::Settings;
use crate::llm::{ChatModel, Embedder, GeminiClient};
use crate::rag::{
    load_pdf_directory, load_summary, Answer, PopplerExtractor, QaAgent, TextSplitter,
    VectorIndex,
};

#[async_trait]
impl<'a, C, E> TurnHandler for QaAgent<'a, C, E>
where
    C: ChatModel + ?Sized,
    E: Embedder + ?Sized,
{
    async fn handle(&mut self, line: &str) -> anyhow::Result<String> {
        let answer = self.answer(line).await?;
        Ok(render_answer(&answer))
    }
}

/// Answer text followed by its sources.
pub(crate) fn render_answer(answer: &Answer) -> String {
    let mut out = answer.text.trim().to_string();
    if answer.citations.is_empty() {
        return out;
    }

    out.push_str(&format!("\n\n{}", style("Sources:").bold()));
    for citation in &answer.citations {
        out.push_str(&format!(
            "\n  {} {}, page {}: {}",
            dim_arrow(),
            citation.source,
            citation.page,
            style(&citation.excerpt).dim()
        ));
    }
    out
}

/// Index the policy PDFs and answer questions until the session ends.
pub async fn cmd_ask(settings: &Settings) -> anyhow::Result<()> {
    let client = GeminiClient::new(settings.llm.clone())?;

    let docs_dir = settings.docs_dir.clone();
    let report = tokio::task::spawn_blocking(move || {
        load_pdf_directory(&docs_dir, &PopplerExtractor::new())
    })
    .await??;

    let splitter = TextSplitter::new(
        settings.retrieval.chunk_size,
        settings.retrieval.chunk_overlap,
    );
    let chunks = splitter.split_documents(&report.pages);
    let chunk_count = chunks.len();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Embedding {} chunk(s) with {}...",
        chunk_count, settings.llm.embedding_model
    ));
    let index = VectorIndex::build(chunks, &client).await;
    pb.finish_and_clear();
    let index = index?;

    println!("{} {}", success(), load_summary(&report, chunk_count));
    if index.is_empty() {
        println!(
            "{} No policy text indexed from {}; every question will be answered \"I don't know\".",
            warn(),
            settings.docs_dir.display()
        );
    }

    println!(
        "\n{} (model {})",
        style("Internal policies assistant").bold(),
        settings.llm.model
    );
    println!(
        "Ask a question, or '{}' to leave.\n",
        EXIT_SENTINELS[0]
    );

    let mut agent = QaAgent::new(&client, &client, index, settings.retrieval.clone());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let turns = run_loop(stdin, &mut stdout, "> ", &mut agent).await?;
    tracing::info!("Question session ended after {} question(s)", turns);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::Citation;

    #[test]
    fn test_render_answer_without_sources() {
        console::set_colors_enabled(false);
        assert_eq!(render_answer(&Answer::unknown()), "I don't know");
    }

    #[test]
    fn test_render_answer_lists_sources() {
        console::set_colors_enabled(false);
        let answer = Answer {
            text: "Internet is reimbursed up to R$ 100 per month.\n".to_string(),
            citations: vec![Citation {
                source: "home_office.pdf".to_string(),
                page: 2,
                excerpt: "Internet expenses are reimbursed...".to_string(),
            }],
            context: vec!["Internet expenses are reimbursed up to R$ 100.".to_string()],
        };
        let rendered = render_answer(&answer);
        assert!(rendered.starts_with("Internet is reimbursed up to R$ 100 per month.\n\nSources:"));
        assert!(rendered.contains("→ home_office.pdf, page 2: Internet expenses are reimbursed..."));
    }
}
