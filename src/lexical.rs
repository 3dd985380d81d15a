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

//! Embedding-free ranking from substring, word overlap, and fuzzy signals.

use strsim::normalized_levenshtein;
use tracing::debug;

use crate::model::IndexedDocument;
use crate::model::MatchType;
use crate::model::SearchResult;
use crate::model::Signals;
use crate::search::BACKEND_LEXICAL;
use crate::search::SearchBackend;
use crate::search::sort_by_score_desc;
use crate::search::unit;
use crate::store::IndexStore;

const OCR_EXACT: f32 = 1.0;
const DESC_EXACT: f32 = 0.8;
const OCR_WORD: f32 = 0.6;
const OCR_PARTIAL: f32 = 0.3;
const DESC_WORD: f32 = 0.4;
const DESC_PARTIAL: f32 = 0.2;
const OCR_FUZZY: f32 = 0.3;
const DESC_FUZZY: f32 = 0.2;
const FUZZY_THRESHOLD: f64 = 0.6;
const MIN_WORD_LEN: usize = 3;
const MIN_FUZZY_QUERY_LEN: usize = 3;

#[derive(Debug, Default)]
pub struct LexicalBackend {
    store: IndexStore,
}

impl LexicalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn recent_first(&self) -> Vec<SearchResult> {
        let mut docs: Vec<&IndexedDocument> = self.store.iter().collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        docs.into_iter()
            .map(|doc| {
                let score = doc.confidence().unwrap_or(1.0);
                SearchResult::from_document(doc, score, MatchType::Combined, None)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordHit {
    Verbatim,
    Partial,
    Miss,
}

fn strip_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Full credit when the word occurs anywhere in the lower-cased field, so
/// prefixes and infixes of longer words count.
fn word_hit(word: &str, field: &str, field_tokens: &[&str]) -> WordHit {
    if field.contains(word) {
        WordHit::Verbatim
    } else if field_tokens.iter().any(|token| token.contains(word)) {
        WordHit::Partial
    } else {
        WordHit::Miss
    }
}

fn fuzzy_ratio(query: &str, field: &str) -> f32 {
    let ratio = normalized_levenshtein(query, field);
    if ratio > FUZZY_THRESHOLD {
        ratio as f32
    } else {
        0.0
    }
}

/// Scores one document against a lower-cased, trimmed, non-empty query.
///
/// `text` and `visual` in the returned signals hold the OCR-side and
/// description-side contributions used for the match type.
pub fn score_document(query: &str, doc: &IndexedDocument) -> (f32, Signals) {
    let ocr = doc.ocr_text.to_lowercase();
    let desc = doc.visual_description.to_lowercase();

    let ocr_exact = if ocr.contains(query) { OCR_EXACT } else { 0.0 };
    let desc_exact = if desc.contains(query) { DESC_EXACT } else { 0.0 };
    let exact = unit(ocr_exact + desc_exact);

    let ocr_tokens: Vec<&str> = ocr.split_whitespace().collect();
    let desc_tokens: Vec<&str> = desc.split_whitespace().collect();
    let words: Vec<&str> = query
        .split_whitespace()
        .map(strip_punctuation)
        .filter(|word| word.chars().count() >= MIN_WORD_LEN)
        .collect();
    let (mut ocr_words, mut desc_words) = (0.0f32, 0.0f32);
    for word in &words {
        ocr_words += match word_hit(word, &ocr, &ocr_tokens) {
            WordHit::Verbatim => OCR_WORD,
            WordHit::Partial => OCR_PARTIAL,
            WordHit::Miss => 0.0,
        };
        desc_words += match word_hit(word, &desc, &desc_tokens) {
            WordHit::Verbatim => DESC_WORD,
            WordHit::Partial => DESC_PARTIAL,
            WordHit::Miss => 0.0,
        };
    }
    if !words.is_empty() {
        ocr_words /= words.len() as f32;
        desc_words /= words.len() as f32;
    }
    let overlap = unit(ocr_words + desc_words);

    let (ocr_fuzzy, desc_fuzzy) = if query.chars().count() > MIN_FUZZY_QUERY_LEN {
        (
            OCR_FUZZY * fuzzy_ratio(query, &ocr),
            DESC_FUZZY * fuzzy_ratio(query, &desc),
        )
    } else {
        (0.0, 0.0)
    };
    let fuzzy = unit(ocr_fuzzy + desc_fuzzy);

    let signals = Signals {
        semantic: None,
        exact: Some(exact),
        text: ocr_exact + ocr_words + ocr_fuzzy,
        visual: desc_exact + desc_words + desc_fuzzy,
        fuzzy: Some(fuzzy),
    };
    (unit(exact + overlap + fuzzy), signals)
}

impl SearchBackend for LexicalBackend {
    fn name(&self) -> &'static str {
        BACKEND_LEXICAL
    }

    fn index(&mut self, doc: IndexedDocument) -> bool {
        self.store.upsert(doc)
    }

    fn query(&self, text: &str, top_k: usize) -> Vec<SearchResult> {
        let query = text.trim().to_lowercase();
        if query.is_empty() {
            return self.recent_first();
        }

        let mut scored: Vec<(&IndexedDocument, f32, Signals)> = self
            .store
            .iter()
            .filter_map(|doc| {
                let (score, signals) = score_document(&query, doc);
                (score > 0.0).then_some((doc, score, signals))
            })
            .collect();
        sort_by_score_desc(&mut scored, |(_, score, _)| *score);
        scored.truncate(top_k);

        debug!(query = text, hits = scored.len(), "lexical query");
        scored
            .into_iter()
            .map(|(doc, score, signals)| {
                let match_type = MatchType::classify(signals.text, signals.visual);
                SearchResult::from_document(doc, score, match_type, Some(signals))
            })
            .collect()
    }

    fn clear(&mut self) {
        self.store.clear();
    }

    fn count(&self) -> usize {
        self.store.count()
    }
}
