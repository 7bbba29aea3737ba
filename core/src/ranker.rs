use crate::index::InvertedIndex;
use crate::weighting::{SparseVector, TfIdfModel};
use crate::{DocId, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    VectorSpace,
    BooleanAnd,
    BooleanOr,
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" | "vector_space" | "vsm" => Ok(SearchMode::VectorSpace),
            "and" | "boolean_and" => Ok(SearchMode::BooleanAnd),
            "or" | "boolean_or" => Ok(SearchMode::BooleanOr),
            other => Err(Error::InvalidInput(format!("unknown search mode {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
}

/// `(a . b) / (|a| |b|)`, defined as 0 when either side has zero magnitude.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let denom = a.magnitude() * b.magnitude();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(0.0, 1.0)
}

pub fn rank<S: AsRef<str>>(
    index: &InvertedIndex,
    model: &TfIdfModel,
    terms: &[S],
    mode: SearchMode,
    top_k: usize,
) -> Vec<SearchHit> {
    if terms.is_empty() || top_k == 0 {
        return Vec::new();
    }
    match mode {
        SearchMode::VectorSpace => vector_space(index, model, terms, top_k),
        SearchMode::BooleanAnd => boolean_and(index, terms, top_k),
        SearchMode::BooleanOr => boolean_or(index, terms, top_k),
    }
}

/// Cosine ranking over documents sharing at least one term with the query.
pub fn vector_space<S: AsRef<str>>(
    index: &InvertedIndex,
    model: &TfIdfModel,
    terms: &[S],
    top_k: usize,
) -> Vec<SearchHit> {
    let query = model.query_vector(terms);
    let q_norm = query.magnitude();
    if q_norm == 0.0 {
        return Vec::new();
    }

    let candidates: BTreeSet<DocId> = terms
        .iter()
        .flat_map(|t| index.postings(t.as_ref()))
        .map(|p| p.doc_id)
        .collect();
    tracing::debug!(candidates = candidates.len(), "scoring vector-space candidates");

    let hits = candidates.into_iter().filter_map(|doc_id| {
        let doc = model.document_vector(doc_id)?;
        if doc.magnitude == 0.0 {
            return None;
        }
        let score = (query.dot(&doc.weights) / (q_norm * doc.magnitude)).clamp(0.0, 1.0);
        (score > 0.0).then_some(SearchHit { doc_id, score })
    });
    top_k_by_score(hits, top_k)
}

pub fn boolean_and<S: AsRef<str>>(index: &InvertedIndex, terms: &[S], top_k: usize) -> Vec<SearchHit> {
    let mut sets = terms.iter().map(|t| doc_set(index, t.as_ref()));
    let Some(first) = sets.next() else { return Vec::new() };
    let matched = sets.fold(first, |acc, s| acc.intersection(&s).copied().collect());
    boolean_hits(matched, top_k)
}

pub fn boolean_or<S: AsRef<str>>(index: &InvertedIndex, terms: &[S], top_k: usize) -> Vec<SearchHit> {
    let matched: BTreeSet<DocId> = terms.iter().flat_map(|t| doc_set(index, t.as_ref())).collect();
    boolean_hits(matched, top_k)
}

/// Documents most similar to `doc_id`, excluding itself.
pub fn related(index: &InvertedIndex, model: &TfIdfModel, doc_id: DocId, top_k: usize) -> Vec<SearchHit> {
    let Some(source) = model.document_vector(doc_id) else { return Vec::new() };
    let candidates: BTreeSet<DocId> = source
        .weights
        .iter()
        .flat_map(|(t, _)| index.postings(t))
        .map(|p| p.doc_id)
        .filter(|&id| id != doc_id)
        .collect();
    let hits = candidates.into_iter().filter_map(|other| {
        let doc = model.document_vector(other)?;
        let score = cosine_similarity(&source.weights, &doc.weights);
        (score > 0.0).then_some(SearchHit { doc_id: other, score })
    });
    top_k_by_score(hits, top_k)
}

fn doc_set(index: &InvertedIndex, term: &str) -> BTreeSet<DocId> {
    index.postings(term).iter().map(|p| p.doc_id).collect()
}

/// Boolean matches carry no graded score; they are listed by ascending id.
fn boolean_hits(matched: BTreeSet<DocId>, top_k: usize) -> Vec<SearchHit> {
    matched.into_iter().take(top_k).map(|doc_id| SearchHit { doc_id, score: 1.0 }).collect()
}

/// Descending score, ties by ascending document id.
fn top_k_by_score(hits: impl Iterator<Item = SearchHit>, top_k: usize) -> Vec<SearchHit> {
    let mut scored: Vec<SearchHit> = hits.collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id)));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::TfVariant;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn corpus() -> (InvertedIndex, TfIdfModel) {
        let mut idx = InvertedIndex::new();
        idx.add_document(1, &toks("energi surya baru energi"));
        idx.add_document(2, &toks("energi fosil batu bara"));
        idx.add_document(3, &toks("hutan tropis hujan"));
        idx.add_document(4, &toks("surya angin"));
        let model = TfIdfModel::build(&idx, TfVariant::Normalized);
        (idx, model)
    }

    #[test]
    fn parses_modes() {
        assert_eq!("vector".parse::<SearchMode>().unwrap(), SearchMode::VectorSpace);
        assert_eq!("Boolean_AND".parse::<SearchMode>().unwrap(), SearchMode::BooleanAnd);
        assert!(matches!("xor".parse::<SearchMode>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn vector_space_orders_by_similarity() {
        let (idx, model) = corpus();
        let hits = vector_space(&idx, &model, &toks("energi surya"), 10);
        assert_eq!(hits[0].doc_id, 1);
        assert!(hits.iter().all(|h| h.score > 0.0 && h.score <= 1.0));
        assert!(!hits.iter().any(|h| h.doc_id == 3));
    }

    #[test]
    fn ties_break_on_doc_id() {
        let mut idx = InvertedIndex::new();
        idx.add_document(9, &toks("surya"));
        idx.add_document(5, &toks("surya"));
        idx.add_document(7, &toks("angin"));
        let model = TfIdfModel::build(&idx, TfVariant::Normalized);
        let hits = vector_space(&idx, &model, &toks("surya"), 10);
        assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![5, 9]);
    }

    #[test]
    fn top_k_truncates() {
        let (idx, model) = corpus();
        assert_eq!(vector_space(&idx, &model, &toks("energi surya"), 1).len(), 1);
        assert!(rank(&idx, &model, &toks("energi"), SearchMode::VectorSpace, 0).is_empty());
    }

    #[test]
    fn boolean_modes() {
        let (idx, model) = corpus();
        let and = rank(&idx, &model, &toks("energi surya"), SearchMode::BooleanAnd, 10);
        let or = rank(&idx, &model, &toks("energi surya"), SearchMode::BooleanOr, 10);
        assert_eq!(and.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(or.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![1, 2, 4]);
        assert!(or.iter().all(|h| h.score == 1.0));
        assert!(rank(&idx, &model, &toks("energi nuklir"), SearchMode::BooleanAnd, 10).is_empty());
    }

    #[test]
    fn empty_terms_return_nothing() {
        let (idx, model) = corpus();
        let none: Vec<String> = Vec::new();
        for mode in [SearchMode::VectorSpace, SearchMode::BooleanAnd, SearchMode::BooleanOr] {
            assert!(rank(&idx, &model, &none, mode, 10).is_empty());
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v: SparseVector = [("panas", 0.3), ("bumi", 0.7)].into_iter().collect();
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&v, &SparseVector::new()), 0.0);
    }

    #[test]
    fn related_excludes_self() {
        let (idx, model) = corpus();
        let hits = related(&idx, &model, 1, 5);
        assert!(hits.iter().all(|h| h.doc_id != 1));
        assert!(hits.iter().any(|h| h.doc_id == 2 || h.doc_id == 4));
    }
}
