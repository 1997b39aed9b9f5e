//! Ranking models over the inverted index.
//!
//! All models score only documents that share at least one term with the
//! query (the union of the touched posting lists); documents with zero
//! overlap are excluded rather than ranked at the bottom. Output ordering
//! is deterministic: score descending, then doc id ascending.

mod bm25;
mod qlm;
mod rm3;
mod tfidf;

pub use bm25::Bm25Params;
pub use qlm::{QlmParams, Smoothing};
pub use rm3::Rm3Params;

use crate::error::QueryError;
use crate::index::InvertedIndex;
use crate::types::DocId;

/// Closed set of ranking models. Selected by explicit configuration; the
/// uniform entry point is [`rank`].
#[derive(Debug, Clone)]
pub enum Model {
    Tfidf,
    Bm25(Bm25Params),
    Bm25Rm3(Rm3Params),
    Qlm(QlmParams),
}

impl Model {
    /// Resolve a model selector string to a model with default parameters.
    pub fn from_selector(name: &str) -> Result<Self, QueryError> {
        match name {
            "tfidf" => Ok(Self::Tfidf),
            "bm25" => Ok(Self::Bm25(Bm25Params::default())),
            "bm25_rm3" => Ok(Self::Bm25Rm3(Rm3Params::default())),
            "qlm" => Ok(Self::Qlm(QlmParams::default())),
            other => Err(QueryError::UnknownModel(other.to_string())),
        }
    }

    pub fn selector(&self) -> &'static str {
        match self {
            Self::Tfidf => "tfidf",
            Self::Bm25(_) => "bm25",
            Self::Bm25Rm3(_) => "bm25_rm3",
            Self::Qlm(_) => "qlm",
        }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        match self {
            Self::Tfidf => Ok(()),
            Self::Bm25(p) => p.validate(),
            Self::Bm25Rm3(p) => p.validate(),
            Self::Qlm(p) => p.validate(),
        }
    }
}

/// Score analyzed query terms against the index under `model`.
///
/// An empty term sequence yields an empty result, not an error; that case
/// is distinct from a valid query matching nothing.
pub fn rank(
    index: &InvertedIndex,
    model: &Model,
    terms: &[String],
) -> Result<Vec<(DocId, f32)>, QueryError> {
    model.validate()?;
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let mut scored = match model {
        Model::Tfidf => tfidf::score(index, terms),
        Model::Bm25(p) => bm25::score(index, terms, p),
        Model::Bm25Rm3(p) => rm3::score(index, terms, p)?,
        Model::Qlm(p) => qlm::score(index, terms, p),
    };

    for &(doc_id, score) in scored.iter() {
        if !score.is_finite() {
            return Err(QueryError::NonFiniteScore { doc_id });
        }
    }

    sort_ranked(&mut scored);
    Ok(scored)
}

/// Deterministic ordering: score desc, then doc id asc.
pub(crate) fn sort_ranked(scored: &mut [(DocId, f32)]) {
    scored.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::types::{FieldPolicy, RecipeDoc};

    fn corpus() -> Vec<RecipeDoc> {
        ["chocolate chip cookies", "vegan chocolate cake", "grilled chicken salad"]
            .iter()
            .enumerate()
            .map(|(i, title)| RecipeDoc {
                id: format!("doc{}", i + 1),
                title: title.to_string(),
                ingredients: String::new(),
                directions: String::new(),
                tags: None,
            })
            .collect()
    }

    fn index() -> InvertedIndex {
        InvertedIndex::build(&corpus(), &Analyzer::default(), FieldPolicy::default()).unwrap()
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let err = Model::from_selector("colbert").unwrap_err();
        assert!(matches!(err, QueryError::UnknownModel(name) if name == "colbert"));
    }

    #[test]
    fn empty_query_yields_empty_result() {
        let ix = index();
        for model in [
            Model::Tfidf,
            Model::Bm25(Bm25Params::default()),
            Model::Bm25Rm3(Rm3Params::default()),
            Model::Qlm(QlmParams::default()),
        ] {
            assert!(rank(&ix, &model, &[]).unwrap().is_empty());
        }
    }

    #[test]
    fn zero_overlap_documents_are_excluded() {
        let ix = index();
        let a = ix.analyzer();
        let hits = rank(&ix, &Model::Bm25(Bm25Params::default()), &a.analyze("chocolate cookies"))
            .unwrap();
        // doc3 shares no term with the query and must not appear at all.
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|&(d, _)| d != 2));
    }

    #[test]
    fn ordering_is_strictly_descending_with_id_tiebreak() {
        let ix = index();
        let a = ix.analyzer();
        for model in [
            Model::Tfidf,
            Model::Bm25(Bm25Params::default()),
            Model::Qlm(QlmParams::default()),
        ] {
            let hits = rank(&ix, &model, &a.analyze("chocolate chicken salad")).unwrap();
            for pair in hits.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert!(a.1 > b.1 || (a.1 == b.1 && a.0 < b.0));
            }
        }
    }

    #[test]
    fn ranking_is_idempotent() {
        let ix1 = index();
        let ix2 = index();
        let terms = ix1.analyzer().analyze("chocolate cookies");
        let model = Model::Bm25(Bm25Params::default());
        assert_eq!(rank(&ix1, &model, &terms).unwrap(), rank(&ix2, &model, &terms).unwrap());
    }
}
