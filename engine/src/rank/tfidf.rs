use crate::index::InvertedIndex;
use crate::types::DocId;
use std::collections::{BTreeMap, HashMap};

/// TF-IDF: score(d, q) = Σ_t qtf(t) · tf(t, d) · ln(N / df(t)).
///
/// Terms absent from the corpus (df = 0) contribute nothing, which also
/// guards the log against a zero denominator.
pub(crate) fn score(index: &InvertedIndex, terms: &[String]) -> Vec<(DocId, f32)> {
    let n = index.num_docs() as f32;
    // BTreeMap keeps term iteration (and so float accumulation) order
    // stable across runs.
    let mut query_tf: BTreeMap<&str, u32> = BTreeMap::new();
    for term in terms {
        *query_tf.entry(term.as_str()).or_insert(0) += 1;
    }

    let mut scores: HashMap<DocId, f32> = HashMap::new();
    for (term, qtf) in query_tf {
        let Some(tid) = index.term_id(term) else { continue };
        let df = index.doc_frequency(tid) as f32;
        let idf = (n / df).ln();
        for p in index.postings_by_id(tid) {
            *scores.entry(p.doc_id).or_insert(0.0) += qtf as f32 * p.tf as f32 * idf;
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

    #[test]
    fn term_in_every_document_scores_zero() {
        let docs = vec![doc("a", "chocolate tart"), doc("b", "chocolate mousse")];
        let ix = InvertedIndex::build(&docs, &Analyzer::default(), FieldPolicy::default())
            .unwrap();
        // df("chocolate") == N, so ln(N/df) == 0 for both matches.
        let scored = score(&ix, &Analyzer::default().analyze("chocolate"));
        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|&(_, s)| s == 0.0));
    }

    #[test]
    fn repeated_query_term_scales_contribution() {
        let docs = vec![doc("a", "chocolate tart"), doc("b", "lemon mousse")];
        let ix = InvertedIndex::build(&docs, &Analyzer::default(), FieldPolicy::default())
            .unwrap();
        let q = Analyzer::default().analyze("chocolate");
        let once = score(&ix, &q);
        let twice = score(&ix, &Analyzer::default().analyze("chocolate chocolate"));
        assert_eq!(once.len(), 1);
        assert!((twice[0].1 - 2.0 * once[0].1).abs() < 1e-6);
    }

    #[test]
    fn unseen_term_contributes_nothing() {
        let docs = vec![doc("a", "chocolate tart")];
        let ix = InvertedIndex::build(&docs, &Analyzer::default(), FieldPolicy::default())
            .unwrap();
        assert!(score(&ix, &["durian".to_string()]).is_empty());
    }
}
