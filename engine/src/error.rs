use thiserror::Error;

/// Errors that abort index construction. No partial index is ever exposed.
#[derive(Debug, Error)]
pub enum IndexBuildError {
    #[error("duplicate document id: {0}")]
    DuplicateDocId(String),
    #[error("corpus contains no documents")]
    EmptyCorpus,
}

/// Errors raised while scoring a single query. Fatal to that query only;
/// a batch keeps going for the remaining queries.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("invalid parameter {name}: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("unknown ranking model: {0}")]
    UnknownModel(String),
    #[error("non-finite score for document {doc_id}")]
    NonFiniteScore { doc_id: u32 },
}

impl QueryError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter { name, value, reason }
    }
}

/// Errors reading or decoding a persisted index or a qrels file.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] bincode::Error),
    #[error("meta decode error: {0}")]
    Meta(#[from] serde_json::Error),
}
