//! Recursive character text splitting.
//!
//! Text is split on the coarsest separator present (paragraphs, then lines,
//! then words, then characters), and the pieces are merged back into windows
//! of at most `chunk_size` characters. Consecutive windows share up to
//! `chunk_overlap` characters of trailing pieces. Separators stay attached to
//! the start of the piece that follows them.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::loader::PageDocument;
use super::Chunk;

/// Separators tried in order, coarsest first. The empty separator splits
/// into single characters.
const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into fixed-size overlapping windows.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Create a splitter; `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunk_overlap = if chunk_overlap >= chunk_size {
            warn!(
                "chunk_overlap {} must be smaller than chunk_size {}; using {}",
                chunk_overlap,
                chunk_size,
                chunk_size - 1
            );
            chunk_size - 1
        } else {
            chunk_overlap
        };

        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split pages into chunks carrying the page metadata.
    pub fn split_documents(&self, pages: &[PageDocument]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = pages
            .iter()
            .flat_map(|page| {
                self.split_text(&page.text)
                    .into_iter()
                    .enumerate()
                    .map(|(chunk_index, text)| Chunk {
                        text,
                        source: page.source.clone(),
                        page: page.page,
                        chunk_index,
                    })
            })
            .collect();
        debug!("Split {} page(s) into {} chunk(s)", pages.len(), chunks.len());
        chunks
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // Pick the first separator present in the text
        let mut separator = "";
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small_pieces: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small_pieces.push(piece);
                continue;
            }

            if !small_pieces.is_empty() {
                chunks.extend(self.merge_pieces(&small_pieces));
                small_pieces.clear();
            }
            if remaining.is_empty() {
                if let Some(trimmed) = non_empty_trimmed(&piece) {
                    chunks.push(trimmed);
                }
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !small_pieces.is_empty() {
            chunks.extend(self.merge_pieces(&small_pieces));
        }
        chunks
    }

    /// Greedily pack pieces into windows, carrying trailing pieces forward as
    /// overlap.
    fn merge_pieces(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(chunk) = join_window(&window) {
                    chunks.push(chunk);
                }
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        if let Some(chunk) = join_window(&window) {
            chunks.push(chunk);
        }
        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(300, 30)
    }
}

/// Split on `separator`, attaching each separator to the following piece.
/// The empty separator splits into characters. Empty pieces are dropped.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(text[start..idx].to_string());
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }
    // A leading separator would otherwise produce a piece that is only the separator
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join_window(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    non_empty_trimmed(&joined)
}

fn non_empty_trimmed(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::default();
        assert_eq!(
            splitter.split_text("  Home office internet is reimbursed.  "),
            vec!["Home office internet is reimbursed."]
        );
    }

    #[test]
    fn test_empty_text() {
        let splitter = TextSplitter::default();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_word_windows_without_overlap() {
        let splitter = TextSplitter::new(10, 3);
        assert_eq!(
            splitter.split_text("aaaa bbbb cccc dddd"),
            vec!["aaaa bbbb", "cccc dddd"]
        );
    }

    #[test]
    fn test_word_windows_with_overlap() {
        let splitter = TextSplitter::new(10, 5);
        assert_eq!(
            splitter.split_text("aaaa bbbb cccc dddd"),
            vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]
        );
    }

    #[test]
    fn test_paragraphs_preferred() {
        let splitter = TextSplitter::new(20, 0);
        let chunks = splitter.split_text("first paragraph\n\nsecond paragraph");
        assert_eq!(chunks, vec!["first paragraph", "second paragraph"]);
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 0);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let splitter = TextSplitter::default();
        let text = (0..400)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 5);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 300, "chunk too long: {}", char_len(chunk));
        }
        // Each chunk opens with words carried over from the previous one
        for pair in chunks.windows(2) {
            let first_word = pair[1].split(' ').next().unwrap();
            assert!(pair[0].split(' ').any(|w| w == first_word));
        }
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let splitter = TextSplitter::new(10, 0);
        let chunks = splitter.split_text("ação ação ação");
        assert_eq!(chunks, vec!["ação ação", "ação"]);
    }

    #[test]
    fn test_overlap_clamped() {
        let splitter = TextSplitter::new(10, 10);
        assert_eq!(splitter.chunk_overlap, 9);
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a b  c", " "),
            vec!["a", " b", " ", " c"]
        );
        assert_eq!(split_keeping_separator("\n\nx", "\n\n"), vec!["\n\nx"]);
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
    }

    #[test]
    fn test_split_documents_carries_metadata() {
        let splitter = TextSplitter::new(10, 0);
        let pages = vec![
            PageDocument {
                text: "aaaa bbbb cccc".to_string(),
                source: PathBuf::from("docs/travel.pdf"),
                page: 2,
            },
            PageDocument {
                text: String::new(),
                source: PathBuf::from("docs/travel.pdf"),
                page: 3,
            },
        ];
        let chunks = splitter.split_documents(&pages);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.page == 2));
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[0].source_name(), "travel.pdf");
    }
}
