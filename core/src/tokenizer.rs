use crate::config::EngineConfig;
use crate::stemmer::{StemmerKind, WordStemmer};
use crate::stopwords::StopwordSet;
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\p{L}+").expect("valid regex");
    static ref DEFAULT: Tokenizer = Tokenizer::default();
}

/// Text normalizer shared by indexing and querying. Stateless apart from its
/// configuration, so the same input always yields the same terms.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: StopwordSet,
    stemmer: WordStemmer,
    min_token_len: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(StopwordSet::new(), StemmerKind::Indonesian, 2)
    }
}

impl Tokenizer {
    pub fn new(stopwords: StopwordSet, stemmer: StemmerKind, min_token_len: usize) -> Self {
        Self { stopwords, stemmer: WordStemmer::new(stemmer), min_token_len }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut stopwords = StopwordSet::new();
        if let Some(path) = &config.stopwords_file {
            stopwords = stopwords.with_file(path)?;
        }
        let mut tokenizer = Self::new(stopwords, config.stemmer, config.min_token_len);
        if let Some(path) = &config.roots_file {
            tokenizer.stemmer = tokenizer.stemmer.with_roots_file(path)?;
        }
        Ok(tokenizer)
    }

    pub fn with_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stemmer = self.stemmer.with_roots(roots);
        self
    }

    pub fn extra_roots(&self) -> Vec<String> {
        self.stemmer.extra_roots()
    }

    pub fn stopwords(&self) -> &StopwordSet {
        &self.stopwords
    }

    pub fn stemmer_kind(&self) -> StemmerKind {
        self.stemmer.kind()
    }

    /// Case-fold, drop digits and punctuation, split, remove short tokens and
    /// stopwords, then stem. Empty input yields no terms.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let folded: String = text
            .nfkd()
            .filter(|c| !is_combining_mark(*c) && !c.is_numeric())
            .collect::<String>()
            .to_lowercase();
        WORD.find_iter(&folded)
            .map(|m| m.as_str())
            .filter(|t| t.chars().count() >= self.min_token_len)
            .filter(|t| !self.stopwords.contains(t))
            .map(|t| self.stemmer.stem(t))
            .collect()
    }

    pub fn term_counts(&self, text: &str) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for term in self.normalize(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }
}

/// Normalize with the default Indonesian configuration.
pub fn tokenize(text: &str) -> Vec<String> {
    DEFAULT.normalize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Pemanasan global, dan perubahan iklim!");
        assert_eq!(t, vec!["panas", "global", "ubah", "iklim"]);
    }

    #[test]
    fn digits_are_deleted_in_place() {
        let t = Tokenizer::new(StopwordSet::new(), StemmerKind::None, 2).normalize("CO2 naik 30% sejak 1990");
        assert_eq!(t, vec!["co", "naik", "sejak"]);
    }

    #[test]
    fn configured_roots_reach_the_stemmer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.txt");
        std::fs::write(&path, "simpan\n").unwrap();
        let config = EngineConfig { roots_file: Some(path), ..EngineConfig::default() };
        let tokenizer = Tokenizer::from_config(&config).unwrap();
        assert_eq!(tokenizer.normalize("disimpan"), vec!["simpan"]);
        assert_eq!(tokenizer.extra_roots(), vec!["simpan".to_string()]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ... 123 !").is_empty());
    }
}
