//! Question answering strictly from retrieved policy passages.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::RetrievalConfig;
use crate::llm::prompts::{ANSWER_PROMPT, DONT_KNOW};
use crate::llm::{ChatModel, ChatRequest, Embedder, LlmError};

use super::index::{ScoredChunk, VectorIndex};

/// Maximum characters of chunk text shown in a citation.
const EXCERPT_CHARS: usize = 160;

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    /// File name of the source PDF.
    pub source: String,
    /// 1-based page number.
    pub page: u32,
    /// Start of the cited chunk.
    pub excerpt: String,
}

/// Answer to one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// One entry per distinct (source, page) used.
    pub citations: Vec<Citation>,
    /// Chunk texts handed to the model; empty when nothing was retrieved.
    pub context: Vec<String>,
}

impl Answer {
    /// The answer given when the policies do not cover the question.
    pub fn unknown() -> Self {
        Self {
            text: DONT_KNOW.to_string(),
            citations: Vec::new(),
            context: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.text == DONT_KNOW
    }
}

/// Answers questions over an indexed set of policy chunks.
pub struct QaAgent<'a, C: ChatModel + ?Sized, E: Embedder + ?Sized> {
    chat: &'a C,
    embedder: &'a E,
    index: VectorIndex,
    config: RetrievalConfig,
}

impl<'a, C: ChatModel + ?Sized, E: Embedder + ?Sized> QaAgent<'a, C, E> {
    pub fn new(chat: &'a C, embedder: &'a E, index: VectorIndex, config: RetrievalConfig) -> Self {
        Self {
            chat,
            embedder,
            index,
            config,
        }
    }

    /// Answer one question.
    ///
    /// When no chunk passes the similarity threshold the answer is
    /// "I don't know" and the chat model is not called.
    pub async fn answer(&self, question: &str) -> Result<Answer, LlmError> {
        if self.index.is_empty() {
            debug!("Index is empty; nothing to retrieve");
            return Ok(Answer::unknown());
        }

        let query = self.embedder.embed_query(question).await?;
        let hits = self
            .index
            .search(&query, self.config.top_k, self.config.score_threshold);
        if hits.is_empty() {
            info!("No chunk above threshold {:.2}", self.config.score_threshold);
            return Ok(Answer::unknown());
        }

        let prompt = build_prompt(question, &hits);
        let request = ChatRequest::new(&prompt).with_system(ANSWER_PROMPT);
        let reply = self.chat.complete(&request).await?;
        let text = reply.trim();

        if is_dont_know(text) {
            return Ok(Answer::unknown());
        }

        Ok(Answer {
            text: text.to_string(),
            citations: citations(&hits),
            context: hits.iter().map(|h| h.chunk.text.clone()).collect(),
        })
    }
}

/// Render the user turn: question followed by numbered context passages.
fn build_prompt(question: &str, hits: &[ScoredChunk<'_>]) -> String {
    let mut prompt = String::new();
    prompt.push_str("Question:\n");
    prompt.push_str(question.trim());
    prompt.push_str("\n\nContext:\n");
    for (i, hit) in hits.iter().enumerate() {
        prompt.push_str(&format!(
            "[{}] {} (page {})\n{}\n\n",
            i + 1,
            hit.chunk.source_name(),
            hit.chunk.page,
            hit.chunk.text.trim()
        ));
    }
    prompt
}

/// Deduplicate hits by (source, page), keeping retrieval order.
fn citations(hits: &[ScoredChunk<'_>]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    hits.iter()
        .filter(|hit| seen.insert((hit.chunk.source.clone(), hit.chunk.page)))
        .map(|hit| Citation {
            source: hit.chunk.source_name(),
            page: hit.chunk.page,
            excerpt: excerpt(&hit.chunk.text, EXCERPT_CHARS),
        })
        .collect()
}

/// Collapse whitespace and cut at a character boundary.
fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", collapsed[..idx].trim_end()),
        None => collapsed,
    }
}

/// Whether the model declined to answer.
fn is_dont_know(text: &str) -> bool {
    let normalized = text
        .trim()
        .trim_end_matches(['.', '!'])
        .replace('\u{2019}', "'")
        .to_lowercase();
    matches!(
        normalized.as_str(),
        "i don't know" | "i do not know" | "não sei" | "nao sei"
    )
}
