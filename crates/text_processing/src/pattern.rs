//! Whole-word term alternation shared by the normalizer and the lexicon

use regex::{Regex, RegexBuilder};

/// Lowercase and collapse internal whitespace
pub(crate) fn lookup_key(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a case-insensitive, word-bounded alternation over `terms`.
///
/// Terms are tried longest first so that a multi-word term wins over any
/// of its own words at the same position. Words inside a term match any
/// run of whitespace. Returns `None` for an empty term list.
pub(crate) fn build_term_pattern<'a, I>(terms: I) -> Result<Option<Regex>, regex::Error>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut keys: Vec<String> = terms
        .into_iter()
        .map(lookup_key)
        .filter(|k| !k.is_empty())
        .collect();

    if keys.is_empty() {
        return Ok(None);
    }

    keys.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    keys.dedup();

    let alternation = keys
        .iter()
        .map(|key| {
            key.split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");

    let regex = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
        .case_insensitive(true)
        .build()?;

    Ok(Some(regex))
}
