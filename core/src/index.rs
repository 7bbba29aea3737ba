use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Raw occurrence count of the term in the document, always > 0.
    pub frequency: u32,
}

/// term -> postings in insertion order. Document frequency is always read off
/// the posting list length, never tracked separately.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>,
    /// Normalized token count per indexed document, recorded at insertion.
    doc_lengths: BTreeMap<DocId, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruneOptions {
    pub min_df: u32,
    pub max_df_ratio: f64,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self { min_df: 1, max_df_ratio: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    pub removed: usize,
    pub terms_before: usize,
    pub terms_after: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub term_count: usize,
    pub avg_doc_length: f64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one document's token stream. Re-adding an id replaces its previous
    /// postings; an empty stream is ignored.
    pub fn add_document<S: AsRef<str>>(&mut self, doc_id: DocId, tokens: &[S]) {
        if tokens.is_empty() {
            return;
        }
        if self.doc_lengths.contains_key(&doc_id) {
            self.remove_document(doc_id);
        }

        let mut counts: HashMap<&str, u32> = HashMap::new();
        for token in tokens {
            *counts.entry(token.as_ref()).or_insert(0) += 1;
        }
        for (term, frequency) in counts {
            self.postings
                .entry(term.to_string())
                .or_default()
                .push(Posting { doc_id, frequency });
        }
        self.doc_lengths.insert(doc_id, tokens.len() as u32);
    }

    /// Drops every posting of `doc_id`; terms left without postings are removed.
    pub fn remove_document(&mut self, doc_id: DocId) -> bool {
        if self.doc_lengths.remove(&doc_id).is_none() {
            return false;
        }
        self.postings.retain(|_, plist| {
            plist.retain(|p| p.doc_id != doc_id);
            !plist.is_empty()
        });
        true
    }

    /// Remove terms found in fewer than `min_df` documents. `min_df <= 1` removes nothing.
    pub fn prune(&mut self, min_df: u32) -> PruneReport {
        self.prune_with(PruneOptions { min_df, ..PruneOptions::default() })
    }

    /// Like [`prune`](Self::prune), additionally removing terms whose share of
    /// documents exceeds `max_df_ratio`.
    pub fn prune_with(&mut self, options: PruneOptions) -> PruneReport {
        let terms_before = self.postings.len();
        let num_docs = self.num_docs();
        self.postings.retain(|_, plist| {
            let df = plist.len();
            if df < options.min_df as usize {
                return false;
            }
            !(num_docs > 0 && options.max_df_ratio < 1.0 && df as f64 / num_docs as f64 > options.max_df_ratio)
        });
        let terms_after = self.postings.len();
        let report = PruneReport { removed: terms_before - terms_after, terms_before, terms_after };
        tracing::info!(
            min_df = options.min_df,
            max_df_ratio = options.max_df_ratio,
            removed = report.removed,
            terms_after,
            "pruned index"
        );
        report
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &[Posting])> + '_ {
        self.postings.iter().map(|(t, p)| (t.as_str(), p.as_slice()))
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// N: documents that contributed at least one token.
    pub fn num_docs(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn doc_length(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(&doc_id).copied().unwrap_or(0)
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.doc_lengths.keys().copied()
    }

    /// Structural check used when loading persisted state.
    pub(crate) fn check_integrity(&self, known: impl Fn(DocId) -> bool) -> Result<(), String> {
        if let Some(id) = self.doc_lengths.keys().find(|&&id| !known(id)) {
            return Err(format!("document length recorded for unknown document {id}"));
        }
        for (term, plist) in &self.postings {
            if plist.is_empty() {
                return Err(format!("term {term:?} has an empty posting list"));
            }
            for p in plist {
                if p.frequency == 0 {
                    return Err(format!("term {term:?} has a zero frequency for document {}", p.doc_id));
                }
                if !self.doc_lengths.contains_key(&p.doc_id) {
                    return Err(format!("term {term:?} references unindexed document {}", p.doc_id));
                }
            }
        }
        Ok(())
    }

    pub fn avg_doc_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        let total: u64 = self.doc_lengths.values().map(|&l| u64::from(l)).sum();
        total as f64 / self.doc_lengths.len() as f64
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            document_count: self.num_docs(),
            term_count: self.term_count(),
            avg_doc_length: self.avg_doc_length(),
        }
    }
}
