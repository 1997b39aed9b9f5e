use serde::{Deserialize, Serialize};

pub type TermId = u32;
pub type DocId = u32;

/// Precomputed per-recipe attributes produced by external classifiers
/// (cuisine/dietary tagging, sentiment polarity). The engine stores and
/// returns these untouched; ranking never reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocTags {
    pub cuisine: Option<String>,
    #[serde(default)]
    pub dietary: Vec<String>,
    pub sentiment: Option<f32>,
}

/// A recipe record as supplied by the corpus.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecipeDoc {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub directions: String,
    #[serde(default)]
    pub tags: Option<DocTags>,
}

/// How document fields are concatenated into indexable text.
///
/// Title first (repeated `title_boost` times), then ingredients, then
/// directions. The same policy is stored in the index so rebuilds are
/// reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPolicy {
    pub title_boost: usize,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self { title_boost: 1 }
    }
}

impl FieldPolicy {
    pub fn indexable_text(&self, doc: &RecipeDoc) -> String {
        let mut text = String::new();
        for _ in 0..self.title_boost.max(1) {
            text.push_str(&doc.title);
            text.push(' ');
        }
        text.push_str(&doc.ingredients);
        text.push(' ');
        text.push_str(&doc.directions);
        text
    }
}

/// Per-document metadata kept alongside the postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
    pub title: String,
    pub tags: Option<DocTags>,
}

/// One entry of a term's posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// One ranked search result, keyed by the external document id.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f32,
    pub title: String,
    pub tags: Option<DocTags>,
}
