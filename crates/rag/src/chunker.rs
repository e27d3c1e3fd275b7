//! Sentence-aware text chunking
//!
//! Splits section text into passages of bounded character length on
//! sentence boundaries, carrying a short overlap from the previous passage
//! so that a fact spanning a boundary is retrievable from either side.
//!
//! ```ignore
//! use agri_faq_rag::chunker::{Chunker, ChunkConfig};
//!
//! let chunker = Chunker::new(ChunkConfig::default());
//! let passages = chunker.chunk("Long section text...");
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use agri_faq_config::constants::rag;
use agri_faq_config::RagConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Upper bound on chunk length in characters
    pub max_chars: usize,
    /// Characters carried over from the previous chunk
    pub overlap_chars: usize,
    /// A trailing chunk with less new text than this is appended to its
    /// predecessor, so a chunk can reach `max_chars + min_chars`
    pub min_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: rag::CHUNK_MAX_CHARS,
            overlap_chars: rag::CHUNK_OVERLAP_CHARS,
            min_chars: rag::CHUNK_MIN_CHARS,
        }
    }
}

impl From<&RagConfig> for ChunkConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            max_chars: config.chunk_max_chars,
            overlap_chars: config.chunk_overlap_chars,
            min_chars: config.chunk_min_chars,
        }
    }
}

pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    pub fn new(config: ChunkConfig) -> Self {
        let max_chars = config.max_chars.max(1);
        Self {
            config: ChunkConfig {
                max_chars,
                overlap_chars: config.overlap_chars.min(max_chars - 1),
                min_chars: config.min_chars.min(max_chars),
            },
        }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunk text; whitespace is collapsed first. Empty input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(&text) <= self.config.max_chars {
            return vec![text];
        }

        let max = self.config.max_chars;
        let pieces: Vec<String> = text
            .unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .flat_map(|s| self.split_long(s))
            .collect();

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        // text added to `current` since the last flush, excluding overlap
        let mut fresh = String::new();

        for piece in pieces {
            if !current.is_empty() && char_len(&current) + 1 + char_len(&piece) > max {
                chunks.push(std::mem::take(&mut current));
                fresh.clear();

                let previous = chunks.last().map(String::as_str).unwrap_or("");
                let carried = overlap_tail(previous, self.config.overlap_chars);
                if !carried.is_empty() && char_len(carried) + 1 + char_len(&piece) <= max {
                    current.push_str(carried);
                }
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&piece);

            if !fresh.is_empty() {
                fresh.push(' ');
            }
            fresh.push_str(&piece);
        }

        if !fresh.is_empty() {
            match chunks.last_mut() {
                Some(last) if char_len(&fresh) < self.config.min_chars => {
                    last.push(' ');
                    last.push_str(&fresh);
                }
                _ => chunks.push(current),
            }
        }

        chunks
    }

    /// Break a sentence longer than `max_chars` on word boundaries
    fn split_long(&self, sentence: &str) -> Vec<String> {
        let max = self.config.max_chars;
        if char_len(sentence) <= max {
            return vec![sentence.to_string()];
        }

        let mut out = Vec::new();
        let mut current = String::new();
        for word in sentence.split_whitespace() {
            let mut word = word.to_string();
            // a single word longer than a chunk is hard-split
            while char_len(&word) > max {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                let split_at = word
                    .char_indices()
                    .nth(max)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                out.push(word[..split_at].to_string());
                word = word[split_at..].to_string();
            }
            if word.is_empty() {
                continue;
            }
            if !current.is_empty() && char_len(&current) + 1 + char_len(&word) > max {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `overlap` characters of `text`, starting at a word boundary
fn overlap_tail(text: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    let len = char_len(text);
    if len <= overlap {
        return text;
    }
    let start = text
        .char_indices()
        .nth(len - overlap)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let tail = &text[start..];
    // drop a partial leading word
    let at_boundary = start == 0 || text[..start].ends_with(' ');
    if at_boundary {
        tail
    } else {
        match tail.find(' ') {
            Some(i) => tail[i + 1..].trim_start(),
            None => "",
        }
    }
}
