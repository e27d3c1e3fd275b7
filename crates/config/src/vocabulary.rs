//! Term-correction vocabulary
//!
//! Grouped by category, each canonical term lists the misspellings and
//! mis-transcriptions that should be rewritten to it:
//!
//! ```yaml
//! products:
//!   Dormulin: [dormolin, dormalin]
//! pests:
//!   thrips: [trips]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::ConfigError;

/// Canonical term -> known variations, grouped by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VocabularyConfig {
    pub categories: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl VocabularyConfig {
    /// Load from a YAML, JSON or TOML file (picked by extension, YAML otherwise)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let vocabulary: Self = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
            _ => serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
        };

        tracing::info!(
            path = %path.display(),
            categories = vocabulary.categories.len(),
            terms = vocabulary.term_count(),
            "Loaded vocabulary"
        );

        Ok(vocabulary)
    }

    /// Product names and common crop/pest misspellings
    pub fn builtin() -> Self {
        let table: &[(&str, &[(&str, &[&str])])] = &[
            (
                "products",
                &[
                    ("Dormulin", &["dormolin", "dormalin", "dormuline", "dor mulin"]),
                    ("Zetol Select", &["zetal select", "zeetol select", "zetole select"]),
                    ("Tracs Sure", &["tracks sure", "tracs shure", "trax sure"]),
                    ("Akre Shield", &["acre shield", "aker shield", "acreshield"]),
                    ("Trail Blaze", &["trailblaze", "trail blase", "trial blaze"]),
                    ("Actin Granules", &["acting granules", "action granules", "actin granule"]),
                ],
            ),
            (
                "crops",
                &[
                    ("chilli", &["chilly", "chili", "chillie"]),
                    ("tomato", &["tometo", "tomatto", "tamato"]),
                ],
            ),
            (
                "pests_and_diseases",
                &[
                    ("thrips", &["trips", "thrip"]),
                    ("powdery mildew", &["powder mildew", "powdery mildue"]),
                    ("bacterial wilt", &["bacterial wilth", "bacteria wilt"]),
                ],
            ),
        ];

        let categories = table
            .iter()
            .map(|(category, terms)| {
                let terms = terms
                    .iter()
                    .map(|(canonical, variations)| {
                        (
                            canonical.to_string(),
                            variations.iter().map(|v| v.to_string()).collect(),
                        )
                    })
                    .collect();
                (category.to_string(), terms)
            })
            .collect();

        Self { categories }
    }

    /// Number of canonical terms across all categories
    pub fn term_count(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    /// Iterate `(canonical, variations)` across all categories
    pub fn terms(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .values()
            .flat_map(|terms| terms.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
    }

    /// Flat `(surface form, canonical)` pairs; every canonical term maps to itself
    pub fn correction_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (canonical, variations) in self.terms() {
            pairs.push((canonical.to_string(), canonical.to_string()));
            for variation in variations {
                pairs.push((variation.clone(), canonical.to_string()));
            }
        }
        pairs
    }

    /// Merge another vocabulary on top of this one; variations are unioned
    pub fn merge(&mut self, other: VocabularyConfig) {
        for (category, terms) in other.categories {
            let target = self.categories.entry(category).or_default();
            for (canonical, variations) in terms {
                let existing = target.entry(canonical).or_default();
                for variation in variations {
                    if !existing.iter().any(|v| v.eq_ignore_ascii_case(&variation)) {
                        existing.push(variation);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_products() {
        let vocab = VocabularyConfig::builtin();
        let pairs = vocab.correction_pairs();

        assert!(pairs.contains(&("dormolin".to_string(), "Dormulin".to_string())));
        assert!(pairs.contains(&("Dormulin".to_string(), "Dormulin".to_string())));
        assert!(pairs.contains(&("trips".to_string(), "thrips".to_string())));
        assert_eq!(vocab.term_count(), 11);
    }

    #[test]
    fn test_yaml_deserialization() {
        let yaml = r#"
products:
  Dormulin: [dormolin]
pests:
  thrips: [trips, thrip]
"#;
        let vocab: VocabularyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(vocab.categories.len(), 2);
        assert_eq!(vocab.term_count(), 2);
        assert_eq!(vocab.correction_pairs().len(), 5);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("vocabulary.json");
        std::fs::write(&json_path, r#"{"crops": {"tomato": ["tometo"]}}"#).unwrap();
        let from_json = VocabularyConfig::load(&json_path).unwrap();

        let toml_path = dir.path().join("vocabulary.toml");
        std::fs::write(&toml_path, "[crops]\ntomato = [\"tometo\"]\n").unwrap();
        let from_toml = VocabularyConfig::load(&toml_path).unwrap();

        assert_eq!(from_json, from_toml);
    }

    #[test]
    fn test_load_missing_file() {
        let err = VocabularyConfig::load("/nonexistent/vocabulary.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_merge_unions_variations() {
        let mut base = VocabularyConfig::builtin();
        let extra: VocabularyConfig =
            serde_yaml::from_str("crops:\n  tomato: [TOMETO, tomatoe]\n  brinjal: [brinjle]\n")
                .unwrap();
        base.merge(extra);

        let tomato = &base.categories["crops"]["tomato"];
        assert_eq!(tomato.iter().filter(|v| v.eq_ignore_ascii_case("tometo")).count(), 1);
        assert!(tomato.contains(&"tomatoe".to_string()));
        assert!(base.categories["crops"].contains_key("brinjal"));
    }
}
