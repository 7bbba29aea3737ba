use crate::tokenizer::Tokenizer;

/// Most frequent normalized terms of a free-standing text, for documents that
/// are not in the index. Ties are ordered alphabetically.
pub fn keywords_by_frequency(text: &str, tokenizer: &Tokenizer, k: usize) -> Vec<(String, u32)> {
    let mut counts: Vec<(String, u32)> = tokenizer.term_counts(text).into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(k);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_stemmed_terms() {
        let tok = Tokenizer::default();
        let top = keywords_by_frequency("Pemanasan makin panas. Suhu panas dan laut hangat.", &tok, 2);
        assert_eq!(top[0], ("panas".to_string(), 3));
        assert_eq!(top[1].1, 1);
    }
}
