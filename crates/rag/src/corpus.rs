//! Corpus loading
//!
//! The corpus is an ordered list of `(section, text)` pairs. It can be
//! written as YAML or JSON:
//!
//! ```yaml
//! - section: Dormulin Vegetative
//!   text: Dormulin Vegetative is a ...
//! ```
//!
//! or as a Markdown document whose headings become section labels.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use agri_faq_core::Passage;

use crate::chunker::Chunker;
use crate::RagError;

/// Section label used for Markdown text before the first heading
const PREAMBLE_SECTION: &str = "General";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSection {
    pub section: String,
    pub text: String,
}

impl CorpusSection {
    pub fn new(section: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    List(Vec<CorpusSection>),
    Wrapped { sections: Vec<CorpusSection> },
}

impl From<CorpusFile> for Vec<CorpusSection> {
    fn from(file: CorpusFile) -> Self {
        match file {
            CorpusFile::List(sections) | CorpusFile::Wrapped { sections } => sections,
        }
    }
}

pub struct CorpusLoader;

impl CorpusLoader {
    /// Load one corpus file; format is chosen by extension
    pub fn load(path: &Path) -> Result<Vec<CorpusSection>, RagError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RagError::Corpus(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let sections = match extension.as_str() {
            "md" | "markdown" => Self::parse_markdown(&content),
            "json" => serde_json::from_str::<CorpusFile>(&content)
                .map_err(|e| RagError::Corpus(format!("{}: {}", path.display(), e)))?
                .into(),
            "yaml" | "yml" => serde_yaml::from_str::<CorpusFile>(&content)
                .map_err(|e| RagError::Corpus(format!("{}: {}", path.display(), e)))?
                .into(),
            other => {
                return Err(RagError::Corpus(format!(
                    "Unsupported corpus format '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };

        tracing::info!(
            file = %path.display(),
            sections = sections.len(),
            "Loaded corpus file"
        );

        Ok(sections)
    }

    /// Load every supported file in a directory, in file-name order
    pub fn load_directory(dir: &Path) -> Result<Vec<CorpusSection>, RagError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| RagError::Corpus(format!("Failed to read directory {}: {}", dir.display(), e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("md" | "markdown" | "json" | "yaml" | "yml")
                )
            })
            .collect();
        paths.sort();

        let mut sections = Vec::new();
        for path in paths {
            sections.extend(Self::load(&path)?);
        }
        Ok(sections)
    }

    /// Load a file or a directory of files
    pub fn load_path(path: &Path) -> Result<Vec<CorpusSection>, RagError> {
        if path.is_dir() {
            Self::load_directory(path)
        } else {
            Self::load(path)
        }
    }

    /// Split Markdown on headings; each heading labels the text under it
    pub fn parse_markdown(content: &str) -> Vec<CorpusSection> {
        let mut sections = Vec::new();
        let mut label = PREAMBLE_SECTION.to_string();
        let mut body: Vec<&str> = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim_start();
            let level = trimmed.chars().take_while(|c| *c == '#').count();
            let is_heading = (1..=6).contains(&level)
                && trimmed[level..].starts_with(|c: char| c.is_whitespace());

            if is_heading {
                flush(&label, &mut body, &mut sections);
                label = trimmed[level..].trim().trim_end_matches('#').trim().to_string();
            } else {
                body.push(line);
            }
        }
        flush(&label, &mut body, &mut sections);

        sections
    }

    /// Chunk sections into passages with ids `{section-slug}-{ordinal}`
    ///
    /// Ordinals continue across sections that share a slug, so ids stay unique.
    pub fn into_passages(sections: &[CorpusSection], chunker: &Chunker) -> Vec<Passage> {
        let mut ordinals: HashMap<String, usize> = HashMap::new();
        let mut passages = Vec::new();

        for section in sections {
            let slug = slugify(&section.section);
            for text in chunker.chunk(&section.text) {
                let ordinal = ordinals.entry(slug.clone()).or_insert(0);
                passages.push(Passage::new(
                    format!("{}-{}", slug, ordinal),
                    section.section.clone(),
                    text,
                ));
                *ordinal += 1;
            }
        }

        tracing::debug!(
            sections = sections.len(),
            passages = passages.len(),
            "Corpus chunked"
        );

        passages
    }
}

fn flush(label: &str, body: &mut Vec<&str>, sections: &mut Vec<CorpusSection>) {
    let text = body.join("\n").trim().to_string();
    if !text.is_empty() {
        sections.push(CorpusSection::new(label, text));
    }
    body.clear();
}

/// Content hash of the chunked corpus and the embedder that indexes it
///
/// An index snapshot or persisted response recorded under a different
/// fingerprint is stale.
pub fn corpus_fingerprint(passages: &[Passage], embedder: &str, dimension: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(embedder.as_bytes());
    hasher.update(&(dimension as u64).to_le_bytes());
    for passage in passages {
        // length-prefixed so field boundaries cannot shift
        for field in [&passage.id, &passage.section, &passage.text] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Lowercase ASCII alphanumerics joined by single dashes
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}
