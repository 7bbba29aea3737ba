//! Engine configuration. Defaults match the reference corpus setup; binaries
//! load an optional JSON file and then apply command-line overrides.

use crate::stemmer::StemmerKind;
use crate::weighting::TfVariant;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Terms found in fewer documents than this are pruned after indexing.
    pub min_df: u32,
    /// Terms found in more than this fraction of documents are pruned. 1.0 disables it.
    pub max_df_ratio: f64,
    /// How many times the title tokens are repeated ahead of the content tokens.
    pub title_weight: u32,
    pub tf_variant: TfVariant,
    pub stemmer: StemmerKind,
    pub min_token_len: usize,
    /// Extra stopwords, one per line.
    pub stopwords_file: Option<PathBuf>,
    /// Extra Indonesian root words, one per line, consulted by the stemmer.
    pub roots_file: Option<PathBuf>,
    pub default_top_k: usize,
    /// Number of top TF-IDF keywords used to score summary sentences.
    pub summary_keywords: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_df_ratio: 1.0,
            title_weight: 2,
            tf_variant: TfVariant::Normalized,
            stemmer: StemmerKind::Indonesian,
            min_token_len: 2,
            stopwords_file: None,
            roots_file: None,
            default_top_k: 10,
            summary_keywords: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_df_ratio > 0.0 && self.max_df_ratio <= 1.0) {
            return Err(Error::Configuration(format!(
                "max_df_ratio must be in (0, 1], got {}",
                self.max_df_ratio
            )));
        }
        if self.min_token_len == 0 {
            return Err(Error::Configuration("min_token_len must be at least 1".into()));
        }
        Ok(())
    }

    /// Applies a caller-supplied `min_df`, which arrives signed from outer surfaces.
    pub fn with_min_df(mut self, min_df: i64) -> Result<Self> {
        if min_df < 0 {
            return Err(Error::Configuration(format!("min_df must be >= 0, got {min_df}")));
        }
        self.min_df = u32::try_from(min_df)
            .map_err(|_| Error::Configuration(format!("min_df {min_df} is out of range")))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_min_df() {
        let err = EngineConfig::default().with_min_df(-1).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let config = EngineConfig { max_df_ratio: 0.0, ..EngineConfig::default() };
        assert!(config.validate().is_err());
        let config = EngineConfig { max_df_ratio: 1.5, ..EngineConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "min_df": 3, "stemmer": "english" }"#).unwrap();
        assert_eq!(config.min_df, 3);
        assert_eq!(config.stemmer, StemmerKind::English);
        assert_eq!(config.title_weight, 2);
    }
}
