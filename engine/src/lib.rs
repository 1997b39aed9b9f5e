//! Recipe retrieval engine: analyzer, inverted index, ranking models,
//! query engine and evaluation metrics.
//!
//! The index is built once from a corpus and is immutable afterwards, so it
//! can be shared by reference across any number of concurrent readers.
//! Scoring and evaluation are pure functions over the index and a read-only
//! judgment set.

pub mod analyzer;
pub mod engine;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod rank;
pub mod types;

pub use analyzer::{Analyzer, AnalyzerConfig};
pub use engine::SearchEngine;
pub use error::{IndexBuildError, QueryError};
pub use index::{IndexStats, InvertedIndex};
pub use rank::Model;
pub use types::{DocId, DocMeta, DocTags, FieldPolicy, Posting, RecipeDoc, SearchHit, TermId};
