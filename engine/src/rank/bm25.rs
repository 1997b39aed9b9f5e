use crate::error::QueryError;
use crate::index::InvertedIndex;
use crate::types::{DocId, TermId};
use std::collections::{BTreeMap, HashMap};

/// BM25 tunables. The defaults match the reference recipe evaluation
/// (k1 = 0.9, b = 0.4) rather than the textbook 1.2/0.75.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Document-length normalization, in [0, 1].
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 0.9, b: 0.4 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<(), QueryError> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(QueryError::invalid("k1", self.k1 as f64, "must be >= 0"));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(QueryError::invalid("b", self.b as f64, "must be in [0, 1]"));
        }
        Ok(())
    }
}

/// IDF with the "+1" smoothing variant: ln((N - df + 0.5)/(df + 0.5) + 1).
/// Stays positive even for terms appearing in every document.
pub(crate) fn idf(n: f32, df: f32) -> f32 {
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// BM25 over an unweighted term sequence; query weights are raw query term
/// frequencies.
pub(crate) fn score(index: &InvertedIndex, terms: &[String], params: &Bm25Params) -> Vec<(DocId, f32)> {
    // BTreeMap keeps term order (and so float accumulation) stable.
    let mut weighted: BTreeMap<TermId, f32> = BTreeMap::new();
    for term in terms {
        if let Some(tid) = index.term_id(term) {
            *weighted.entry(tid).or_insert(0.0) += 1.0;
        }
    }
    let weighted: Vec<(TermId, f32)> = weighted.into_iter().collect();
    score_weighted(index, &weighted, params)
}

/// BM25 over an explicitly weighted query, the form RM3 re-scoring uses.
/// Each term's contribution is scaled by its query weight.
pub(crate) fn score_weighted(
    index: &InvertedIndex,
    weighted: &[(TermId, f32)],
    params: &Bm25Params,
) -> Vec<(DocId, f32)> {
    let n = index.num_docs() as f32;
    let avgdl = index.avg_doc_length();
    let mut scores: HashMap<DocId, f32> = HashMap::new();

    for &(tid, weight) in weighted {
        if weight <= 0.0 {
            continue;
        }
        let term_idf = idf(n, index.doc_frequency(tid) as f32);
        for p in index.postings_by_id(tid) {
            let tf = p.tf as f32;
            let dl = index.document_length(p.doc_id) as f32;
            let norm = tf + params.k1 * (1.0 - params.b + params.b * dl / avgdl);
            let contrib = weight * term_idf * (tf * (params.k1 + 1.0)) / norm;
            *scores.entry(p.doc_id).or_insert(0.0) += contrib;
        }
    }
    scores.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::types::{FieldPolicy, RecipeDoc};

    fn doc(id: &str, text: &str) -> RecipeDoc {
        RecipeDoc {
            id: id.to_string(),
            title: text.to_string(),
            ingredients: String::new(),
            directions: String::new(),
            tags: None,
        }
    }

    fn index(texts: &[&str]) -> InvertedIndex {
        let docs: Vec<RecipeDoc> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| doc(&format!("doc{}", i + 1), t))
            .collect();
        InvertedIndex::build(&docs, &Analyzer::default(), FieldPolicy::default()).unwrap()
    }

    #[test]
    fn params_are_validated() {
        assert!(Bm25Params { k1: -0.1, b: 0.4 }.validate().is_err());
        assert!(Bm25Params { k1: 0.9, b: 1.5 }.validate().is_err());
        assert!(Bm25Params { k1: 0.9, b: -0.1 }.validate().is_err());
        assert!(Bm25Params::default().validate().is_ok());
    }

    #[test]
    fn idf_is_positive_for_universal_terms() {
        assert!(idf(10.0, 10.0) > 0.0);
    }

    #[test]
    fn scores_are_positive_for_matches() {
        let ix = index(&["chocolate chip cookies", "vegan chocolate cake"]);
        let terms = Analyzer::default().analyze("chocolate");
        let scored = score(&ix, &terms, &Bm25Params::default());
        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|&(_, s)| s > 0.0));
    }

    #[test]
    fn more_matching_terms_rank_higher() {
        let ix = index(&[
            "chocolate chip cookies",
            "vegan chocolate cake",
            "grilled chicken salad",
        ]);
        let terms = Analyzer::default().analyze("chocolate cookies");
        let mut scored = score(&ix, &terms, &Bm25Params::default());
        crate::rank::sort_ranked(&mut scored);
        // doc1 matches both query terms, doc2 one, doc3 none.
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].0, 0);
        assert_eq!(scored[1].0, 1);
        assert!(scored[0].1 > scored[1].1);
    }

    #[test]
    fn weighted_scoring_scales_linearly() {
        let ix = index(&["chocolate tart", "lemon tart"]);
        let tid = ix.term_id("chocol").expect("term indexed");
        let half = score_weighted(&ix, &[(tid, 0.5)], &Bm25Params::default());
        let full = score_weighted(&ix, &[(tid, 1.0)], &Bm25Params::default());
        assert_eq!(half.len(), 1);
        assert!((full[0].1 - 2.0 * half[0].1).abs() < 1e-6);
    }
}
