//! TF-IDF weighting. Document vectors are computed once from an index and
//! cached; building a new model is the only way to refresh them.

use crate::index::InvertedIndex;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TfVariant {
    /// count / total tokens of the document
    #[default]
    Normalized,
    /// 1 + log10(count)
    Log,
    Raw,
}

impl TfVariant {
    /// Zero when the term is absent or the document has no tokens.
    pub fn apply(self, count: u32, total_tokens: u32) -> f64 {
        if count == 0 || total_tokens == 0 {
            return 0.0;
        }
        match self {
            TfVariant::Normalized => f64::from(count) / f64::from(total_tokens),
            TfVariant::Log => 1.0 + f64::from(count).log10(),
            TfVariant::Raw => f64::from(count),
        }
    }
}

/// `ln(N / df)`; zero for terms the index does not know.
pub fn inverse_document_frequency(num_docs: usize, doc_frequency: usize) -> f64 {
    if doc_frequency == 0 || num_docs == 0 {
        return 0.0;
    }
    (num_docs as f64 / doc_frequency as f64).ln()
}

/// Sparse term -> weight map; absent terms weigh 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: HashMap<String, f64>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only positive weights are stored.
    pub fn insert(&mut self, term: impl Into<String>, weight: f64) {
        if weight > 0.0 {
            self.weights.insert(term.into(), weight);
        }
    }

    pub fn get(&self, term: &str) -> f64 {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.weights.iter().map(|(t, w)| (t.as_str(), *w))
    }

    pub fn magnitude(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.iter().map(|(t, w)| w * large.get(t)).sum()
    }

    /// Highest weights first; equal weights ordered by term.
    pub fn top_terms(&self, k: usize) -> Vec<(String, f64)> {
        let mut terms: Vec<(String, f64)> = self.weights.iter().map(|(t, w)| (t.clone(), *w)).collect();
        terms.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(k);
        terms
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut v = SparseVector::new();
        for (t, w) in iter {
            v.insert(t, w);
        }
        v
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentVector {
    pub weights: SparseVector,
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TfIdfModel {
    tf_variant: TfVariant,
    num_docs: usize,
    idf: HashMap<String, f64>,
    vectors: HashMap<DocId, DocumentVector>,
}

impl TfIdfModel {
    pub fn build(index: &InvertedIndex, tf_variant: TfVariant) -> Self {
        let num_docs = index.num_docs();
        let mut idf = HashMap::with_capacity(index.term_count());
        let mut vectors: HashMap<DocId, DocumentVector> = HashMap::new();

        for (term, plist) in index.terms() {
            let term_idf = inverse_document_frequency(num_docs, plist.len());
            idf.insert(term.to_string(), term_idf);
            for p in plist {
                let tf = tf_variant.apply(p.frequency, index.doc_length(p.doc_id));
                let weight = tf * term_idf;
                if weight > 0.0 {
                    vectors.entry(p.doc_id).or_default().weights.insert(term, weight);
                }
            }
        }
        for v in vectors.values_mut() {
            v.magnitude = v.weights.magnitude();
        }

        tracing::debug!(num_docs, terms = idf.len(), vectors = vectors.len(), "built tf-idf model");
        Self { tf_variant, num_docs, idf, vectors }
    }

    pub fn tf_variant(&self) -> TfVariant {
        self.tf_variant
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn idf(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or(0.0)
    }

    /// Cached weight of `term` in `doc_id`.
    pub fn weight(&self, term: &str, doc_id: DocId) -> f64 {
        self.vectors.get(&doc_id).map_or(0.0, |v| v.weights.get(term))
    }

    pub fn document_vector(&self, doc_id: DocId) -> Option<&DocumentVector> {
        self.vectors.get(&doc_id)
    }

    /// Weights a normalized query with the index-time IDF. The TF denominator
    /// counts every query term, including ones the index has never seen.
    pub fn query_vector<S: AsRef<str>>(&self, terms: &[S]) -> SparseVector {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for t in terms {
            *counts.entry(t.as_ref()).or_insert(0) += 1;
        }
        let total = terms.len() as u32;
        let mut vector = SparseVector::new();
        for (term, count) in counts {
            if let Some(&idf) = self.idf.get(term) {
                vector.insert(term, self.tf_variant.apply(count, total) * idf);
            }
        }
        vector
    }

    pub fn top_keywords(&self, doc_id: DocId, k: usize) -> Vec<(String, f64)> {
        self.vectors.get(&doc_id).map(|v| v.weights.top_terms(k)).unwrap_or_default()
    }
}
