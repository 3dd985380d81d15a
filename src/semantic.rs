// Copyright 2026 Glimpse Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Embedding-backed ranking blended with lexical field matches.

use rayon::prelude::*;
use tracing::debug;

use crate::embed::Embedder;
use crate::embed::cosine_similarity;
use crate::model::IndexedDocument;
use crate::model::MatchType;
use crate::model::SearchResult;
use crate::model::Signals;
use crate::search::BACKEND_SEMANTIC;
use crate::search::SearchBackend;
use crate::search::sort_by_score_desc;
use crate::search::unit;
use crate::store::IndexStore;

const SEMANTIC_WEIGHT: f32 = 0.5;
const TEXT_WEIGHT: f32 = 0.25;
const VISUAL_WEIGHT: f32 = 0.25;
const MIN_COMBINED_SCORE: f32 = 0.1;

const VISUAL_INTENT_KEYWORDS: &[&str] = &[
    "button",
    "color",
    "blue",
    "red",
    "green",
    "icon",
    "image",
    "screenshot",
    "window",
    "dialog",
    "menu",
    "toolbar",
    "sidebar",
];

pub struct SemanticBackend {
    store: IndexStore,
    embedder: Box<dyn Embedder>,
}

impl SemanticBackend {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            store: IndexStore::new(),
            embedder,
        }
    }

    fn embed_document(embedder: &dyn Embedder, mut doc: IndexedDocument) -> IndexedDocument {
        doc.embedding = Some(embedder.embed(&doc.combined_text()));
        doc
    }
}

/// 1.0 when the whole query occurs in the field, else the fraction of query
/// words that occur in it. Both inputs are expected lower-cased.
pub fn field_match_score(query: &str, field: &str) -> f32 {
    if field.contains(query) {
        return 1.0;
    }
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let matches = words.iter().filter(|word| field.contains(*word)).count();
    matches as f32 / words.len() as f32
}

pub fn has_visual_intent(query: &str) -> bool {
    let lower = query.to_lowercase();
    VISUAL_INTENT_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

struct Candidate<'a> {
    doc: &'a IndexedDocument,
    combined: f32,
    signals: Signals,
}

impl SearchBackend for SemanticBackend {
    fn name(&self) -> &'static str {
        BACKEND_SEMANTIC
    }

    fn index(&mut self, doc: IndexedDocument) -> bool {
        let doc = Self::embed_document(self.embedder.as_ref(), doc);
        self.store.upsert(doc)
    }

    fn index_all(&mut self, docs: Vec<IndexedDocument>) -> Vec<bool> {
        let embedder = self.embedder.as_ref();
        let embedded: Vec<IndexedDocument> = docs
            .into_par_iter()
            .map(|doc| Self::embed_document(embedder, doc))
            .collect();
        embedded
            .into_iter()
            .map(|doc| self.store.upsert(doc))
            .collect()
    }

    fn query(&self, text: &str, top_k: usize) -> Vec<SearchResult> {
        if self.store.is_empty() {
            return Vec::new();
        }

        let query_vec = self.embedder.embed(text);
        let query_lower = text.to_lowercase();
        let visual_intent = has_visual_intent(text);

        let mut candidates: Vec<Candidate<'_>> = self
            .store
            .iter()
            .map(|doc| {
                let semantic = doc
                    .embedding
                    .as_deref()
                    .map(|vec| cosine_similarity(&query_vec, vec))
                    .unwrap_or(0.0);
                let text_score =
                    unit(field_match_score(&query_lower, &doc.ocr_text.to_lowercase()));
                let visual_score = if visual_intent {
                    unit(field_match_score(
                        &query_lower,
                        &doc.visual_description.to_lowercase(),
                    ))
                } else {
                    0.0
                };
                let combined = SEMANTIC_WEIGHT * semantic
                    + TEXT_WEIGHT * text_score
                    + VISUAL_WEIGHT * visual_score;
                Candidate {
                    doc,
                    combined: if combined.is_nan() { 0.0 } else { combined },
                    signals: Signals {
                        semantic: Some(semantic),
                        exact: None,
                        text: text_score,
                        visual: visual_score,
                        fuzzy: None,
                    },
                }
            })
            .collect();

        sort_by_score_desc(&mut candidates, |c| c.combined);
        candidates.truncate(top_k);

        let results: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|c| c.combined > MIN_COMBINED_SCORE)
            .map(|c| {
                let match_type = MatchType::classify(c.signals.text, c.signals.visual);
                SearchResult::from_document(c.doc, c.combined, match_type, Some(c.signals))
            })
            .collect();
        debug!(
            query = text,
            visual_intent,
            hits = results.len(),
            "semantic query"
        );
        results
    }

    fn clear(&mut self) {
        self.store.clear();
    }

    fn count(&self) -> usize {
        self.store.count()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::OffsetDateTime;

    use super::*;
    use crate::embed::HashEmbedder;
    use crate::model::QualityEvaluation;

    fn backend() -> SemanticBackend {
        SemanticBackend::new(Box::new(HashEmbedder::new(256)))
    }

    fn doc(hash: &str, ocr: &str, visual: &str) -> IndexedDocument {
        IndexedDocument::new(hash, format!("{hash}.png"), ocr, visual, OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn empty_store_returns_nothing() {
        assert!(backend().query("anything", 5).is_empty());
    }

    #[test]
    fn field_match_prefers_full_substring() {
        assert_eq!(field_match_score("login button", "the login button here"), 1.0);
        assert_eq!(field_match_score("login page", "login button"), 0.5);
        assert_eq!(field_match_score("", "anything"), 1.0);
        assert_eq!(field_match_score("   ", "text"), 0.0);
    }

    #[test]
    fn visual_intent_needs_keyword() {
        assert!(has_visual_intent("Blue BUTTON"));
        assert!(!has_visual_intent("invoice total"));
    }

    #[test]
    fn text_query_ranks_matching_ocr_first() {
        let mut backend = backend();
        backend.index(doc("a", "Quarterly invoice total due", "a table of numbers"));
        backend.index(doc("b", "Login button click here", "a form with a blue button"));
        backend.index(doc("c", "Weather forecast for today", "a sunny icon"));

        let results = backend.query("invoice total", 5);
        assert_eq!(results[0].hash, "a");
        assert_eq!(results[0].match_type, MatchType::Text);
        assert!(results.iter().all(|r| r.score > MIN_COMBINED_SCORE));
    }

    #[test]
    fn visual_query_can_match_description() {
        let mut backend = backend();
        backend.index(doc("a", "Welcome", "a large blue button in the center"));
        backend.index(doc("b", "Welcome", "plain text page"));

        let results = backend.query("blue button", 5);
        assert_eq!(results[0].hash, "a");
        assert_eq!(results[0].match_type, MatchType::Visual);
    }

    #[test]
    fn top_k_limits_results_and_ties_keep_order() {
        let mut backend = backend();
        for hash in ["a", "b", "c"] {
            backend.index(doc(hash, "settings page", ""));
        }
        let results = backend.query("settings page", 2);
        let hashes: Vec<&str> = results.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "b"]);
    }

    #[test]
    fn precomputed_confidence_overrides_score() {
        let mut backend = backend();
        let curated = doc("a", "export report", "").with_evaluation(QualityEvaluation::from_value(
            json!({"confidence_score": 0.33}),
        ));
        let malformed = doc("b", "export report", "")
            .with_evaluation(QualityEvaluation::from_value(json!({"level": "Good"})));
        backend.index(curated);
        backend.index(malformed);

        let results = backend.query("export report", 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].confidence_score, 0.33);
        assert_eq!(results[1].confidence_score, results[1].score);
    }

    #[test]
    fn reindex_and_clear() {
        let mut backend = backend();
        assert!(!backend.index(doc("a", "one", "")));
        assert!(backend.index(doc("a", "two", "")));
        assert_eq!(backend.count(), 1);

        let replaced = backend.index_all(vec![doc("a", "three", ""), doc("b", "four", "")]);
        assert_eq!(replaced, vec![true, false]);
        assert_eq!(backend.count(), 2);

        backend.clear();
        assert_eq!(backend.count(), 0);
        assert!(backend.query("three", 5).is_empty());
    }
}
