use super::bm25::{self, Bm25Params};
use crate::error::QueryError;
use crate::index::InvertedIndex;
use crate::types::{DocId, TermId};
use std::collections::HashMap;

/// RM3 pseudo-relevance feedback wrapped around BM25.
#[derive(Debug, Clone, Copy)]
pub struct Rm3Params {
    pub bm25: Bm25Params,
    /// Number of top-ranked feedback documents (F).
    pub fb_docs: usize,
    /// Number of expansion terms kept (E).
    pub fb_terms: usize,
    /// Interpolation weight of the original query, in [0, 1].
    pub alpha: f32,
}

impl Default for Rm3Params {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            fb_docs: 10,
            fb_terms: 10,
            alpha: 0.5,
        }
    }
}

impl Rm3Params {
    pub fn validate(&self) -> Result<(), QueryError> {
        self.bm25.validate()?;
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(QueryError::invalid("alpha", self.alpha as f64, "must be in [0, 1]"));
        }
        if self.fb_docs == 0 {
            return Err(QueryError::invalid("fb_docs", 0.0, "must be >= 1"));
        }
        if self.fb_terms == 0 {
            return Err(QueryError::invalid("fb_terms", 0.0, "must be >= 1"));
        }
        Ok(())
    }
}

/// Two-stage scoring: a plain BM25 pass seeds the feedback set, the
/// expanded weighted query is then rescored with BM25. The stage-1 ordering
/// uses the same deterministic tie-break as every other model, since it
/// decides which documents seed the expansion.
pub(crate) fn score(
    index: &InvertedIndex,
    terms: &[String],
    params: &Rm3Params,
) -> Result<Vec<(DocId, f32)>, QueryError> {
    let mut initial = bm25::score(index, terms, &params.bm25);
    super::sort_ranked(&mut initial);
    initial.truncate(params.fb_docs);
    if initial.is_empty() {
        return Ok(Vec::new());
    }

    let expanded = expand_query(index, terms, &initial, params);
    Ok(bm25::score_weighted(index, &expanded, &params.bm25))
}

/// Interpolate the original query distribution with the feedback-document
/// language model: w(t) = α·qtf(t)/|q| + (1-α)·Σ_d P(t|d)/F, keeping the
/// top `fb_terms` terms. Every candidate term comes from the original query
/// or a feedback document; nothing else can gain weight.
pub(crate) fn expand_query(
    index: &InvertedIndex,
    terms: &[String],
    feedback: &[(DocId, f32)],
    params: &Rm3Params,
) -> Vec<(TermId, f32)> {
    let f = feedback.len() as f32;
    let inv_doc_len: HashMap<DocId, f32> = feedback
        .iter()
        .map(|&(doc_id, _)| {
            let dl = index.document_length(doc_id);
            (doc_id, if dl > 0 { 1.0 / dl as f32 } else { 0.0 })
        })
        .collect();

    // Feedback term distribution, gathered by one sweep over the posting
    // lists (the index keeps no forward document vectors).
    let mut weights: HashMap<TermId, f32> = HashMap::new();
    let vocab = index.stats().vocabulary_size as TermId;
    let fb_scale = (1.0 - params.alpha) / f;
    for tid in 0..vocab {
        for p in index.postings_by_id(tid) {
            if let Some(&inv_dl) = inv_doc_len.get(&p.doc_id) {
                *weights.entry(tid).or_insert(0.0) += fb_scale * p.tf as f32 * inv_dl;
            }
        }
    }

    let query_len = terms.len() as f32;
    let mut query_tf: HashMap<TermId, f32> = HashMap::new();
    for term in terms {
        if let Some(tid) = index.term_id(term) {
            *query_tf.entry(tid).or_insert(0.0) += 1.0;
        }
    }
    for (tid, qtf) in query_tf {
        *weights.entry(tid).or_insert(0.0) += params.alpha * qtf / query_len;
    }

    let mut expanded: Vec<(TermId, f32)> = weights.into_iter().collect();
    expanded.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    expanded.truncate(params.fb_terms);
    tracing::debug!(
        feedback_docs = feedback.len(),
        expansion_terms = expanded.len(),
        "rm3 expansion"
    );
    expanded
}
