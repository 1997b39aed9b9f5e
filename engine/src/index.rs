use crate::analyzer::{Analyzer, AnalyzerConfig};
use crate::error::IndexBuildError;
use crate::types::{DocId, DocMeta, FieldPolicy, Posting, RecipeDoc, TermId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Global corpus statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub document_count: u32,
    pub avg_doc_length: f32,
    pub vocabulary_size: usize,
}

/// Immutable inverted index over a recipe corpus.
///
/// Built in a single pass over the documents; after `build` returns the
/// index never changes, so it is safe to share by reference across threads
/// with no locking. The analyzer config and field policy used at build time
/// are embedded so queries are analyzed identically to documents.
#[derive(Serialize, Deserialize)]
pub struct InvertedIndex {
    analyzer_config: AnalyzerConfig,
    field_policy: FieldPolicy,
    dictionary: HashMap<String, TermId>,
    /// Posting lists indexed by term id, each sorted by doc id.
    postings: Vec<Vec<Posting>>,
    df: Vec<u32>,
    collection_tf: Vec<u64>,
    doc_len: Vec<u32>,
    total_len: u64,
    docs: Vec<DocMeta>,
    doc_id_map: HashMap<String, DocId>,
}

impl InvertedIndex {
    /// Build an index from a finite corpus. Fails on a repeated external id
    /// or an empty corpus; no partial index is exposed on failure.
    pub fn build(
        docs: &[RecipeDoc],
        analyzer: &Analyzer,
        field_policy: FieldPolicy,
    ) -> Result<Self, IndexBuildError> {
        if docs.is_empty() {
            return Err(IndexBuildError::EmptyCorpus);
        }

        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut postings: Vec<Vec<Posting>> = Vec::new();
        let mut df: Vec<u32> = Vec::new();
        let mut collection_tf: Vec<u64> = Vec::new();
        let mut doc_len: Vec<u32> = Vec::new();
        let mut total_len: u64 = 0;
        let mut metas: Vec<DocMeta> = Vec::with_capacity(docs.len());
        let mut doc_id_map: HashMap<String, DocId> = HashMap::with_capacity(docs.len());

        for (i, doc) in docs.iter().enumerate() {
            let doc_id = i as DocId;
            if doc_id_map.insert(doc.id.clone(), doc_id).is_some() {
                return Err(IndexBuildError::DuplicateDocId(doc.id.clone()));
            }

            let terms = analyzer.analyze(&field_policy.indexable_text(doc));
            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for term in terms.iter() {
                let tid = match dictionary.get(term) {
                    Some(&tid) => tid,
                    None => {
                        let tid = postings.len() as TermId;
                        dictionary.insert(term.clone(), tid);
                        postings.push(Vec::new());
                        df.push(0);
                        collection_tf.push(0);
                        tid
                    }
                };
                *tf_counts.entry(tid).or_insert(0) += 1;
            }

            // Documents are ingested in doc-id order, so pushing here keeps
            // every posting list sorted by doc id.
            for (tid, tf) in tf_counts {
                postings[tid as usize].push(Posting { doc_id, tf });
                df[tid as usize] += 1;
                collection_tf[tid as usize] += u64::from(tf);
            }

            let len = terms.len() as u32;
            doc_len.push(len);
            total_len += u64::from(len);
            metas.push(DocMeta {
                external_id: doc.id.clone(),
                title: doc.title.clone(),
                tags: doc.tags.clone(),
            });
        }

        for plist in postings.iter_mut() {
            plist.sort_by_key(|p| p.doc_id);
        }

        tracing::info!(
            num_docs = metas.len(),
            num_terms = dictionary.len(),
            total_tokens = total_len,
            "index built"
        );

        Ok(Self {
            analyzer_config: analyzer.config().clone(),
            field_policy,
            dictionary,
            postings,
            df,
            collection_tf,
            doc_len,
            total_len,
            docs: metas,
            doc_id_map,
        })
    }

    /// The analyzer this index was built with. Queries must go through it.
    pub fn analyzer(&self) -> Analyzer {
        Analyzer::new(self.analyzer_config.clone())
    }

    pub fn field_policy(&self) -> &FieldPolicy {
        &self.field_policy
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    /// Posting list for a term; empty for unseen terms.
    pub fn postings(&self, term: &str) -> &[Posting] {
        match self.term_id(term) {
            Some(tid) => &self.postings[tid as usize],
            None => &[],
        }
    }

    pub fn postings_by_id(&self, tid: TermId) -> &[Posting] {
        &self.postings[tid as usize]
    }

    /// Document frequency of a term (0 for unseen terms).
    pub fn doc_frequency(&self, tid: TermId) -> u32 {
        self.df[tid as usize]
    }

    /// Total occurrences of a term across the corpus.
    pub fn collection_tf(&self, tid: TermId) -> u64 {
        self.collection_tf[tid as usize]
    }

    /// Term frequency of `tid` in `doc_id`; 0 if the document lacks it.
    pub fn term_frequency(&self, tid: TermId, doc_id: DocId) -> u32 {
        let plist = &self.postings[tid as usize];
        match plist.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(i) => plist[i].tf,
            Err(_) => 0,
        }
    }

    pub fn document_length(&self, doc_id: DocId) -> u32 {
        self.doc_len[doc_id as usize]
    }

    /// Total token count over the corpus.
    pub fn collection_length(&self) -> u64 {
        self.total_len
    }

    pub fn num_docs(&self) -> u32 {
        self.docs.len() as u32
    }

    pub fn avg_doc_length(&self) -> f32 {
        self.total_len as f32 / self.docs.len() as f32
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            document_count: self.num_docs(),
            avg_doc_length: self.avg_doc_length(),
            vocabulary_size: self.dictionary.len(),
        }
    }

    pub fn meta(&self, doc_id: DocId) -> &DocMeta {
        &self.docs[doc_id as usize]
    }

    pub fn internal_id(&self, external_id: &str) -> Option<DocId> {
        self.doc_id_map.get(external_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocTags;

    fn doc(id: &str, title: &str, body: &str) -> RecipeDoc {
        RecipeDoc {
            id: id.to_string(),
            title: title.to_string(),
            ingredients: body.to_string(),
            directions: String::new(),
            tags: None,
        }
    }

    fn tiny_index() -> InvertedIndex {
        let docs = vec![
            doc("r1", "chocolate chip cookies", "flour sugar chocolate"),
            doc("r2", "vegan chocolate cake", "flour cocoa"),
            doc("r3", "grilled chicken salad", "chicken lettuce"),
        ];
        InvertedIndex::build(&docs, &Analyzer::default(), FieldPolicy::default()).unwrap()
    }

    #[test]
    fn duplicate_id_fails_build() {
        let docs = vec![doc("r1", "a", "b"), doc("r1", "c", "d")];
        let err = InvertedIndex::build(&docs, &Analyzer::default(), FieldPolicy::default());
        assert!(matches!(err, Err(IndexBuildError::DuplicateDocId(id)) if id == "r1"));
    }

    #[test]
    fn empty_corpus_fails_build() {
        let err = InvertedIndex::build(&[], &Analyzer::default(), FieldPolicy::default());
        assert!(matches!(err, Err(IndexBuildError::EmptyCorpus)));
    }

    #[test]
    fn df_matches_posting_list_length() {
        let ix = tiny_index();
        for (_, &tid) in ix.dictionary.iter() {
            assert_eq!(ix.doc_frequency(tid) as usize, ix.postings_by_id(tid).len());
        }
    }

    #[test]
    fn collection_tf_matches_posting_sum() {
        let ix = tiny_index();
        for (_, &tid) in ix.dictionary.iter() {
            let sum: u64 = ix.postings_by_id(tid).iter().map(|p| u64::from(p.tf)).sum();
            assert_eq!(ix.collection_tf(tid), sum);
        }
    }

    #[test]
    fn unseen_term_has_empty_postings() {
        let ix = tiny_index();
        assert!(ix.postings("quinoa").is_empty());
    }

    #[test]
    fn stats_are_consistent() {
        let ix = tiny_index();
        let stats = ix.stats();
        assert_eq!(stats.document_count, 3);
        assert_eq!(stats.vocabulary_size, ix.dictionary.len());
        let expected = ix.collection_length() as f32 / 3.0;
        assert!((stats.avg_doc_length - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn tags_pass_through_unchanged() {
        let mut d = doc("r1", "pad thai", "noodles");
        d.tags = Some(DocTags {
            cuisine: Some("Asian".into()),
            dietary: vec!["vegetarian".into()],
            sentiment: Some(0.4),
        });
        let ix = InvertedIndex::build(&[d.clone()], &Analyzer::default(), FieldPolicy::default())
            .unwrap();
        assert_eq!(ix.meta(0).tags, d.tags);
    }
}
