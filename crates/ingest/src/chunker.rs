use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::chunk::TextChunk;
use crate::error::IngestError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next
    pub chunk_overlap: usize,
    /// Split points, coarsest first. An empty string splits between characters.
    pub separators: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            chunk_overlap: 2_000,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                ". ".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

/// Recursive boundary-aware splitter.
///
/// Each pass picks the coarsest separator that occurs in the text, merges the
/// resulting pieces greedily up to `chunk_size`, and re-splits any piece that
/// is too large on its own with the remaining finer separators.
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, IngestError> {
        if config.chunk_size == 0 {
            return Err(IngestError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(IngestError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split text and number the resulting chunks
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        TextChunk::sequence(self.split_text(text))
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.config.separators.iter().map(String::as_str).collect();
        let mut chunks = Vec::new();
        self.split_recursive(text, &separators, &mut chunks);

        debug!(
            input_chars = text.chars().count(),
            chunks = chunks.len(),
            "Split text into chunks"
        );
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str], out: &mut Vec<String>) {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];

        for (i, candidate) in separators.iter().copied().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut small: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                self.merge_pieces(&small, out);
                small.clear();
            }

            if finer.is_empty() {
                push_trimmed(piece, out);
            } else {
                self.split_recursive(piece, finer, out);
            }
        }

        if !small.is_empty() {
            self.merge_pieces(&small, out);
        }
    }

    /// Greedy merge with a sliding overlap window
    fn merge_pieces(&self, pieces: &[&str], out: &mut Vec<String>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > size {
                if total > size {
                    warn!(chunk_chars = total, chunk_size = size, "Created a chunk larger than the configured size");
                }

                if !window.is_empty() {
                    push_joined(&window, out);

                    // Keep at most `overlap` characters as the head of the next chunk
                    while total > overlap || (total + len > size && total > 0) {
                        match window.pop_front() {
                            Some((_, dropped)) => total -= dropped,
                            None => break,
                        }
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        push_joined(&window, out);
    }
}

/// Rough token estimate: a fixed number of characters per token
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    text.chars().count() / chars_per_token.max(1)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split on every occurrence of `separator`, keeping each separator attached
/// to the start of the piece that follows it. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn push_joined(window: &VecDeque<(&str, usize)>, out: &mut Vec<String>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    push_trimmed(&joined, out);
}

fn push_trimmed(text: &str, out: &mut Vec<String>) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
