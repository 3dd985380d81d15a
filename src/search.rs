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

//! Ranking backend interface shared by the semantic and lexical engines.
//!
//! Mutations take `&mut self` and queries take `&self`, so a backend shared
//! across threads has to sit behind a lock that serializes writers.

use std::cmp::Ordering;

use crate::embed::Embedder;
use crate::lexical::LexicalBackend;
use crate::model::IndexedDocument;
use crate::model::SearchResult;
use crate::semantic::SemanticBackend;

pub const BACKEND_SEMANTIC: &str = "semantic";
pub const BACKEND_LEXICAL: &str = "lexical";

pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Indexes one document. Returns true when it replaced an entry with the same hash.
    fn index(&mut self, doc: IndexedDocument) -> bool;

    /// Indexes documents in input order. Returns the replacement flag of each.
    fn index_all(&mut self, docs: Vec<IndexedDocument>) -> Vec<bool> {
        docs.into_iter().map(|doc| self.index(doc)).collect()
    }

    fn query(&self, text: &str, top_k: usize) -> Vec<SearchResult>;

    fn clear(&mut self);

    fn count(&self) -> usize;
}

/// Semantic ranking when an embedder is available, lexical otherwise.
pub fn backend_for(embedder: Option<Box<dyn Embedder>>) -> Box<dyn SearchBackend> {
    match embedder {
        Some(embedder) => Box::new(SemanticBackend::new(embedder)),
        None => Box::new(LexicalBackend::new()),
    }
}

/// Stable descending sort; equal scores keep insertion order and NaN sorts last.
pub(crate) fn sort_by_score_desc<T>(items: &mut [T], score: impl Fn(&T) -> f32) {
    items.sort_by(|a, b| score_cmp(score(a), score(b)));
}

fn score_cmp(a: f32, b: f32) -> Ordering {
    let key = |v: f32| if v.is_nan() { f32::NEG_INFINITY } else { v };
    key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal)
}

/// Clamps to `[0, 1]` and maps NaN to 0.
pub(crate) fn unit(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keeps_insertion_order_for_ties() {
        let mut items = vec![("a", 0.5), ("b", 0.9), ("c", 0.5), ("d", f32::NAN), ("e", 0.9)];
        sort_by_score_desc(&mut items, |item| item.1);
        let names: Vec<&str> = items.iter().map(|item| item.0).collect();
        assert_eq!(names, vec!["b", "e", "a", "c", "d"]);
    }

    #[test]
    fn unit_clamps() {
        assert_eq!(unit(f32::NAN), 0.0);
        assert_eq!(unit(1.8), 1.0);
        assert_eq!(unit(-0.2), 0.0);
    }
}
