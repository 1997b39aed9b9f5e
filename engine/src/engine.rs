use crate::error::QueryError;
use crate::index::InvertedIndex;
use crate::rank::{self, Model};
use crate::types::SearchHit;

/// Query engine over a built index.
///
/// Holds the index by value; all operations take `&self` and are
/// side-effect-free, so one engine can serve any number of concurrent
/// queries.
pub struct SearchEngine {
    index: InvertedIndex,
}

impl SearchEngine {
    pub fn new(index: InvertedIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Rank documents for a raw query under `model`, truncated to `top_k`
    /// entries (`top_k == 0` returns the full list).
    ///
    /// The query is analyzed through the index's own analyzer, so query and
    /// document terms always normalize identically. A query with no terms
    /// left after analysis, or no matching documents, yields an empty list.
    pub fn search(
        &self,
        raw_query: &str,
        model: &Model,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, QueryError> {
        let terms = self.index.analyzer().analyze(raw_query);
        let mut ranked = rank::rank(&self.index, model, &terms)?;
        if top_k > 0 {
            ranked.truncate(top_k);
        }

        let hits = ranked
            .into_iter()
            .map(|(doc_id, score)| {
                let meta = self.index.meta(doc_id);
                SearchHit {
                    doc_id: meta.external_id.clone(),
                    score,
                    title: meta.title.clone(),
                    tags: meta.tags.clone(),
                }
            })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::rank::Bm25Params;
    use crate::types::{FieldPolicy, RecipeDoc};

    fn engine() -> SearchEngine {
        let docs: Vec<RecipeDoc> = [
            ("doc1", "chocolate chip cookies"),
            ("doc2", "vegan chocolate cake"),
            ("doc3", "grilled chicken salad"),
        ]
        .iter()
        .map(|(id, title)| RecipeDoc {
            id: id.to_string(),
            title: title.to_string(),
            ingredients: String::new(),
            directions: String::new(),
            tags: None,
        })
        .collect();
        let index =
            InvertedIndex::build(&docs, &Analyzer::default(), FieldPolicy::default()).unwrap();
        SearchEngine::new(index)
    }

    #[test]
    fn returns_external_ids_in_rank_order() {
        let e = engine();
        let hits = e
            .search("chocolate cookies", &Model::Bm25(Bm25Params::default()), 10)
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["doc1", "doc2"]);
    }

    #[test]
    fn top_k_zero_returns_full_list() {
        let e = engine();
        let all = e.search("chocolate", &Model::Tfidf, 0).unwrap();
        let one = e.search("chocolate", &Model::Tfidf, 1).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn stopword_only_query_is_a_valid_empty_result() {
        let e = engine();
        let hits = e.search("the and of", &Model::Bm25(Bm25Params::default()), 10);
        assert!(hits.unwrap().is_empty());
    }
}
