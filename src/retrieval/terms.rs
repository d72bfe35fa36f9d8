//! Term extraction shared by ranking and keyword output.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Words that carry no retrieval signal in questions about a novel:
/// function words plus question boilerplate ("how many times did the author…").
const LITERARY_STOPWORDS: &[&str] = &[
    "the", "is", "am", "are", "was", "were", "be", "been", "being", "he", "she", "it", "they",
    "a", "an", "to", "of", "for", "in", "on", "with", "at", "by", "and", "but", "or", "so", "if",
    "that", "this", "those", "these", "i", "you", "me", "we", "us", "them", "there", "then",
    "what", "which", "as", "from", "up", "down", "out", "over", "under", "again", "further",
    "about", "above", "below", "between", "into", "through", "during", "before", "after",
    "right", "left", "just", "their", "did", "doing", "do", "never", "yes", "how", "many",
    "times", "author", "mentioned", "implication", "metaphor", "described", "have", "symbol",
    "has", "happened", "novel", "plot", "my", "past", "its", "had", "once", "now", "emun",
    "his", "him", "her", "someone", "who", "said", "few", "three", "no", "himself", "where",
    "not", "all", "hundred", "would", "when",
];

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| LITERARY_STOPWORDS.iter().copied().collect());

pub fn is_stopword(term: &str) -> bool {
    STOPWORDS.contains(term)
}

/// Lowercased alphanumeric runs, without stop-words, single characters or
/// bare numbers. Order of first appearance is kept; repeats are kept too.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > 1)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !is_stopword(t))
        .collect()
}

/// Distinct terms of `text` in order of first appearance.
pub fn key_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stopwords_and_punctuation() {
        assert_eq!(
            tokenize("How many times did the author mention Victor's laboratory?"),
            vec!["mention", "victor", "laboratory"]
        );
    }

    #[test]
    fn drops_numbers_and_single_chars() {
        assert_eq!(tokenize("Chapter 12: a x-ray"), vec!["chapter", "ray"]);
    }

    #[test]
    fn key_terms_dedup_in_order() {
        assert_eq!(
            key_terms(r#"["Alice", "rabbit", "alice", "Hole"]"#),
            vec!["alice", "rabbit", "hole"]
        );
    }

    #[test]
    fn unicode_words_survive() {
        assert_eq!(tokenize("Café Müller"), vec!["café", "müller"]);
    }

    #[test]
    fn empty_text_has_no_terms() {
        assert!(key_terms("").is_empty());
        assert!(key_terms("the and of").is_empty());
    }
}
