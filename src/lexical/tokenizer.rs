//! Text tokenization shared by indexing, querying and heuristic reranking.

/// Lowercase and split on every non-alphanumeric character.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Tokens of `text` with duplicates removed, first occurrence order kept.
pub fn unique_terms(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits_punctuation() {
        assert_eq!(
            tokenize("AI-policy: requires, Transparency!"),
            vec!["ai", "policy", "requires", "transparency"]
        );
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize("Política de IA"), vec!["política", "de", "ia"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("  ,.;  ").is_empty());
    }

    #[test]
    fn test_unique_terms() {
        assert_eq!(unique_terms("ai AI policy ai"), vec!["ai", "policy"]);
    }
}
