//! Retrieval core: tokenization, inverted index, TF-IDF weighting, cosine and
//! boolean ranking, extractive summaries, topic mentions and ranking evaluation over a small,
//! static document collection.

pub mod config;
pub mod document;
pub mod engine;
pub mod entities;
pub mod error;
pub mod evaluate;
pub mod index;
pub mod keywords;
pub mod persist;
pub mod ranker;
pub mod stemmer;
pub mod stopwords;
pub mod summarizer;
pub mod tokenizer;
pub mod weighting;

pub use config::EngineConfig;
pub use document::{DocId, Document, DocumentSource};
pub use engine::{Engine, RebuildReport, SharedEngine};
pub use entities::{Entities, EntityKind, Measurement};
pub use error::{Error, Result};
pub use index::{IndexStats, InvertedIndex, Posting, PruneOptions, PruneReport};
pub use ranker::{SearchHit, SearchMode};
pub use tokenizer::Tokenizer;
pub use weighting::{SparseVector, TfIdfModel, TfVariant};
