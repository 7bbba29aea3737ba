//! One built index over one document collection, and the holder that lets a
//! server swap it atomically while queries are in flight.

use crate::config::EngineConfig;
use crate::entities::{self, Entities};
use crate::index::{IndexStats, InvertedIndex, PruneOptions};
use crate::ranker::{self, SearchHit, SearchMode};
use crate::summarizer;
use crate::tokenizer::Tokenizer;
use crate::weighting::TfIdfModel;
use crate::{persist, DocId, Document, Error, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    pub terms_before: usize,
    pub terms_after: usize,
}

/// Immutable once built. Rebuilding produces a new engine.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    documents: BTreeMap<DocId, Document>,
    index: InvertedIndex,
    model: TfIdfModel,
}

impl Engine {
    /// Tokenize, index, prune and weight `documents`. A repeated id keeps the
    /// last record seen.
    pub fn build<I>(documents: I, config: EngineConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Document>,
    {
        config.validate()?;
        let tokenizer = Tokenizer::from_config(&config)?;
        let mut by_id = BTreeMap::new();
        for doc in documents {
            if by_id.insert(doc.id, doc).is_some() {
                tracing::debug!("duplicate document id replaced");
            }
        }
        Ok(Self::assemble(config, tokenizer, by_id))
    }

    fn assemble(config: EngineConfig, tokenizer: Tokenizer, documents: BTreeMap<DocId, Document>) -> Self {
        let mut index = InvertedIndex::new();
        for doc in documents.values() {
            index.add_document(doc.id, &document_terms(&tokenizer, doc, config.title_weight));
        }
        let report = index.prune_with(PruneOptions { min_df: config.min_df, max_df_ratio: config.max_df_ratio });
        let model = TfIdfModel::build(&index, config.tf_variant);
        tracing::info!(
            documents = documents.len(),
            indexed = index.num_docs(),
            terms = report.terms_after,
            "engine built"
        );
        Self { config, tokenizer, documents, index, model }
    }

    /// Reassembles persisted parts; only the weighting model is recomputed.
    pub(crate) fn from_parts(
        config: EngineConfig,
        tokenizer: Tokenizer,
        documents: BTreeMap<DocId, Document>,
        index: InvertedIndex,
    ) -> Self {
        let model = TfIdfModel::build(&index, config.tf_variant);
        Self { config, tokenizer, documents, index, model }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn model(&self) -> &TfIdfModel {
        &self.model
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> + '_ {
        self.documents.values()
    }

    pub fn document(&self, doc_id: DocId) -> Result<&Document> {
        self.documents.get(&doc_id).ok_or(Error::UnknownDocument(doc_id))
    }

    /// A query that normalizes to nothing matches nothing.
    pub fn search(&self, query: &str, mode: SearchMode, top_k: usize) -> Vec<SearchHit> {
        let terms = self.tokenizer.normalize(query);
        if terms.is_empty() {
            tracing::debug!(query, "query has no searchable terms");
            return Vec::new();
        }
        ranker::rank(&self.index, &self.model, &terms, mode, top_k)
    }

    /// Build a replacement engine from the stored documents with a new
    /// `min_df`. `self` is left untouched, so a failure publishes nothing.
    pub fn rebuild_index(&self, min_df: i64) -> Result<(Engine, RebuildReport)> {
        let config = self.config.clone().with_min_df(min_df)?;
        let rebuilt = Self::assemble(config, self.tokenizer.clone(), self.documents.clone());
        let report = RebuildReport { terms_before: self.index.term_count(), terms_after: rebuilt.index.term_count() };
        Ok((rebuilt, report))
    }

    pub fn summarize(&self, doc_id: DocId, sentences: usize) -> Result<Vec<String>> {
        let doc = self.document(doc_id)?;
        let keywords = self.model.top_keywords(doc_id, self.config.summary_keywords);
        Ok(summarizer::summarize(&doc.content, &keywords, &self.tokenizer, sentences))
    }

    /// Highest TF-IDF terms of a document.
    pub fn keywords(&self, doc_id: DocId, k: usize) -> Result<Vec<(String, f64)>> {
        self.document(doc_id)?;
        Ok(self.model.top_keywords(doc_id, k))
    }

    /// Topic mentions and quoted figures in the document's content.
    pub fn entities(&self, doc_id: DocId) -> Result<Entities> {
        Ok(entities::extract(&self.document(doc_id)?.content))
    }

    pub fn related(&self, doc_id: DocId, top_k: usize) -> Result<Vec<SearchHit>> {
        self.document(doc_id)?;
        Ok(ranker::related(&self.index, &self.model, doc_id, top_k))
    }

    pub fn index_stats(&self) -> IndexStats {
        self.index.stats()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        persist::serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Engine> {
        persist::deserialize(bytes)
    }

    pub(crate) fn stored_documents(&self) -> &BTreeMap<DocId, Document> {
        &self.documents
    }
}

/// Title tokens `title_weight` times, then content tokens.
fn document_terms(tokenizer: &Tokenizer, doc: &Document, title_weight: u32) -> Vec<String> {
    let title = tokenizer.normalize(&doc.title);
    let content = tokenizer.normalize(&doc.content);
    let mut terms = Vec::with_capacity(title.len() * title_weight as usize + content.len());
    for _ in 0..title_weight {
        terms.extend(title.iter().cloned());
    }
    terms.extend(content);
    terms
}

/// The currently published engine. Readers take an `Arc` snapshot and never
/// block a rebuild for longer than the pointer swap.
#[derive(Debug)]
pub struct SharedEngine {
    current: RwLock<Arc<Engine>>,
    rebuilding: Mutex<()>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self { current: RwLock::new(Arc::new(engine)), rebuilding: Mutex::new(()) }
    }

    pub fn snapshot(&self) -> Arc<Engine> {
        self.current.read().clone()
    }

    /// Replace the published engine, returning the previous one.
    pub fn publish(&self, engine: Engine) -> Arc<Engine> {
        std::mem::replace(&mut *self.current.write(), Arc::new(engine))
    }

    pub fn rebuild(&self, min_df: i64) -> Result<RebuildReport> {
        self.rebuild_with(min_df, |_| Ok(()))
    }

    /// Rebuild from the current snapshot and run `before_publish` (typically
    /// persisting) on the result. The swap happens only if both succeed.
    /// Concurrent rebuilds are serialized.
    pub fn rebuild_with<F>(&self, min_df: i64, before_publish: F) -> Result<RebuildReport>
    where
        F: FnOnce(&Engine) -> Result<()>,
    {
        let _guard = self.rebuilding.lock();
        let current = self.snapshot();
        let (next, report) = current.rebuild_index(min_df)?;
        before_publish(&next)?;
        self.publish(next);
        tracing::info!(min_df, terms_before = report.terms_before, terms_after = report.terms_after, "published rebuilt index");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stemmer::StemmerKind;

    fn config(min_df: u32) -> EngineConfig {
        EngineConfig { min_df, stemmer: StemmerKind::None, ..EngineConfig::default() }
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::new(1, "Surya", "Panel surya menghasilkan listrik bersih."),
            Document::new(2, "Angin", "Turbin angin menghasilkan listrik."),
            Document::new(3, "Hutan", "Hutan menyerap karbon."),
        ]
    }

    #[test]
    fn title_is_weighted() {
        let engine = Engine::build(docs(), config(1)).unwrap();
        // "surya" twice from the title, once from the content
        let plist = engine.index().postings("surya");
        assert_eq!(plist.len(), 1);
        assert_eq!(plist[0].frequency, 3);
    }

    #[test]
    fn last_duplicate_wins() {
        let mut d = docs();
        d.push(Document::new(3, "Laut", "Laut menghangat."));
        let engine = Engine::build(d, config(1)).unwrap();
        assert_eq!(engine.document(3).unwrap().title, "Laut");
        assert!(engine.index().postings("hutan").is_empty());
    }

    #[test]
    fn unknown_document_is_reported() {
        let engine = Engine::build(docs(), config(1)).unwrap();
        assert!(matches!(engine.summarize(42, 3), Err(Error::UnknownDocument(42))));
        assert!(matches!(engine.related(42, 3), Err(Error::UnknownDocument(42))));
        assert!(matches!(engine.keywords(42, 3), Err(Error::UnknownDocument(42))));
        assert!(matches!(engine.entities(42), Err(Error::UnknownDocument(42))));
    }

    #[test]
    fn entities_come_from_content() {
        let docs = vec![Document::new(1, "Banjir", "Hutan tropis menyerap 2 miliar ton karbon dioksida.")];
        let engine = Engine::build(docs, config(1)).unwrap();
        let found = engine.entities(1).unwrap();
        assert_eq!(found.mentions[&crate::EntityKind::Location], vec!["hutan tropis"]);
        assert_eq!(found.mentions[&crate::EntityKind::GreenhouseGas], vec!["karbon dioksida"]);
        assert!(!found.mentions.contains_key(&crate::EntityKind::Impact));
        assert_eq!(found.statistics.len(), 1);
        assert_eq!(found.statistics[0].unit, "miliar");
    }

    #[test]
    fn empty_query_matches_nothing() {
        let engine = Engine::build(docs(), config(1)).unwrap();
        assert!(engine.search("", SearchMode::VectorSpace, 10).is_empty());
        assert!(engine.search("dan yang 2024", SearchMode::BooleanOr, 10).is_empty());
    }

    #[test]
    fn negative_min_df_publishes_nothing() {
        let shared = SharedEngine::new(Engine::build(docs(), config(1)).unwrap());
        let before = shared.snapshot();
        assert!(matches!(shared.rebuild(-1), Err(Error::Configuration(_))));
        assert!(Arc::ptr_eq(&before, &shared.snapshot()));
    }

    #[test]
    fn failed_hook_publishes_nothing() {
        let shared = SharedEngine::new(Engine::build(docs(), config(1)).unwrap());
        let before = shared.snapshot();
        let err = shared.rebuild_with(2, |_| Err(Error::InvalidInput("disk full".into())));
        assert!(err.is_err());
        assert!(Arc::ptr_eq(&before, &shared.snapshot()));
    }

    #[test]
    fn rebuild_swaps_and_reports() {
        let shared = SharedEngine::new(Engine::build(docs(), config(1)).unwrap());
        let old = shared.snapshot();
        let report = shared.rebuild(2).unwrap();
        assert_eq!(report.terms_before, old.index_stats().term_count);
        assert_eq!(report.terms_after, shared.snapshot().index_stats().term_count);
        assert!(report.terms_after < report.terms_before);
        // the held snapshot still answers from the old index
        assert!(!old.search("hutan", SearchMode::BooleanOr, 10).is_empty());
        assert!(shared.snapshot().search("hutan", SearchMode::BooleanOr, 10).is_empty());
    }
}
