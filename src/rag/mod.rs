//! Retrieval-augmented answering over PDF policy documents.
//!
//! Pipeline: load PDFs page by page, split pages into overlapping chunks,
//! embed the chunks into an in-memory index, then answer each question from
//! the top-scoring chunks only.

mod agent;
mod chunker;
mod index;
mod loader;

pub use agent::{Answer, Citation, QaAgent};
pub use chunker::TextSplitter;
pub use index::{cosine_similarity, ScoredChunk, VectorIndex};
pub use loader::{
    load_pdf_directory, LoadError, LoadReport, PageDocument, PdfExtractor, PopplerExtractor,
};

use std::path::PathBuf;

/// A slice of one page's text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Chunk text submitted to the embedding model.
    pub text: String,
    /// PDF the chunk came from.
    pub source: PathBuf,
    /// 1-based page number within the PDF.
    pub page: u32,
    /// Position of the chunk within its page.
    pub chunk_index: usize,
}

impl Chunk {
    /// File name of the source PDF, for display.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// One-line summary printed after the documents are indexed.
pub fn load_summary(report: &LoadReport, chunk_count: usize) -> String {
    format!(
        "Loaded {} PDF file(s), {} page(s), skipped {}, {} chunk(s) indexed",
        report.loaded.len(),
        report.pages.len(),
        report.skipped.len(),
        chunk_count
    )
}
