//! PDF loading using Poppler's pdftotext.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info, warn};

/// Form feed emitted by pdftotext after every page.
const PAGE_BREAK: char = '\u{c}';

/// Errors that can occur while loading documents.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("External tool not found: {0}. Install with: apt install poppler-utils")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text of one PDF page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDocument {
    pub text: String,
    pub source: PathBuf,
    /// 1-based page number.
    pub page: u32,
}

/// Outcome of loading a directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Pages from every file that loaded.
    pub pages: Vec<PageDocument>,
    /// Files that loaded.
    pub loaded: Vec<PathBuf>,
    /// Files that failed, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Extracts per-page text from a PDF.
pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, LoadError>;
}

/// Extractor backed by the `pdftotext` binary.
#[derive(Debug, Clone, Default)]
pub struct PopplerExtractor;

impl PopplerExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PdfExtractor for PopplerExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, LoadError> {
        let output = Command::new("pdftotext")
            .args(["-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .output();

        let text = match output {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).into_owned()
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(LoadError::ExtractionFailed(format!(
                    "pdftotext failed: {}",
                    stderr.trim()
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::ToolNotFound("pdftotext".to_string()));
            }
            Err(e) => return Err(LoadError::Io(e)),
        };

        Ok(split_pages(&text))
    }
}

/// Split pdftotext output into pages on form feeds.
pub(crate) fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();
    // Output ends with a form feed, leaving an empty tail
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Load every PDF in `dir` (non-recursive).
///
/// A file that fails to load is logged and skipped; only a missing or
/// unreadable directory is an error.
pub fn load_pdf_directory<E: PdfExtractor + ?Sized>(
    dir: &Path,
    extractor: &E,
) -> Result<LoadReport, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_pdf(path))
        .collect();
    files.sort();
    debug!("Found {} PDF file(s) in {}", files.len(), dir.display());

    let mut report = LoadReport::default();
    for path in files {
        match extractor.extract_pages(&path) {
            Ok(pages) => {
                debug!("Loaded {} ({} pages)", path.display(), pages.len());
                report
                    .pages
                    .extend(pages.into_iter().enumerate().map(|(i, text)| PageDocument {
                        text,
                        source: path.clone(),
                        page: i as u32 + 1,
                    }));
                report.loaded.push(path);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.skipped.push((path, e.to_string()));
            }
        }
    }

    info!(
        "Loaded {} PDF(s), {} page(s), skipped {}",
        report.loaded.len(),
        report.pages.len(),
        report.skipped.len()
    );
    Ok(report)
}
