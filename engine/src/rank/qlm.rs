use crate::error::QueryError;
use crate::index::InvertedIndex;
use crate::types::DocId;
use std::collections::HashSet;

/// Floor for the collection probability of a term entirely absent from the
/// corpus, keeping ln() finite.
const P_COLLECTION_FLOOR: f32 = 1e-10;

/// Smoothing for the query-likelihood language model.
#[derive(Debug, Clone, Copy)]
pub enum Smoothing {
    /// Interpolates the document and collection models:
    /// λ·P(t|d) + (1-λ)·P(t|C).
    JelinekMercer { lambda: f32 },
    /// Bayesian prior on the document model:
    /// P(t|d) = (tf + μ·P(t|C)) / (|d| + μ).
    Dirichlet { mu: f32 },
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::Dirichlet { mu: 1000.0 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QlmParams {
    pub smoothing: Smoothing,
}

impl QlmParams {
    pub fn jelinek_mercer(lambda: f32) -> Self {
        Self {
            smoothing: Smoothing::JelinekMercer { lambda },
        }
    }

    pub fn dirichlet(mu: f32) -> Self {
        Self {
            smoothing: Smoothing::Dirichlet { mu },
        }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        match self.smoothing {
            Smoothing::JelinekMercer { lambda } => {
                if !lambda.is_finite() || !(0.0..=1.0).contains(&lambda) {
                    return Err(QueryError::invalid("lambda", lambda as f64, "must be in [0, 1]"));
                }
            }
            Smoothing::Dirichlet { mu } => {
                if !mu.is_finite() || mu < 0.0 {
                    return Err(QueryError::invalid("mu", mu as f64, "must be >= 0"));
                }
            }
        }
        Ok(())
    }
}

fn p_collection(index: &InvertedIndex, term: &str) -> f32 {
    let ctf = match index.term_id(term) {
        Some(tid) => index.collection_tf(tid),
        None => 0,
    };
    if ctf == 0 {
        P_COLLECTION_FLOOR
    } else {
        ctf as f32 / index.collection_length() as f32
    }
}

/// Query likelihood: score(d, q) = Σ_t ln(P_smoothed(t|d)).
///
/// Candidates are the union of posting lists for the query terms; smoothing
/// then covers query terms a candidate lacks, so every candidate is scored
/// against the full query.
pub(crate) fn score(index: &InvertedIndex, terms: &[String], params: &QlmParams) -> Vec<(DocId, f32)> {
    let mut candidates: HashSet<DocId> = HashSet::new();
    for term in terms {
        for p in index.postings(term) {
            candidates.insert(p.doc_id);
        }
    }

    let term_stats: Vec<(Option<crate::types::TermId>, f32)> = terms
        .iter()
        .map(|t| (index.term_id(t), p_collection(index, t)))
        .collect();

    let mut scored = Vec::with_capacity(candidates.len());
    for doc_id in candidates {
        let dl = index.document_length(doc_id) as f32;
        let mut log_score = 0.0f32;
        for &(tid, p_c) in &term_stats {
            let tf = tid.map_or(0, |tid| index.term_frequency(tid, doc_id)) as f32;
            let p = match params.smoothing {
                Smoothing::JelinekMercer { lambda } => {
                    let p_doc = if dl > 0.0 { tf / dl } else { 0.0 };
                    lambda * p_doc + (1.0 - lambda) * p_c
                }
                Smoothing::Dirichlet { mu } => (tf + mu * p_c) / (dl + mu),
            };
            log_score += p.max(P_COLLECTION_FLOOR).ln();
        }
        scored.push((doc_id, log_score));
    }
    scored
}
