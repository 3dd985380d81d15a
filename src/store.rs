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

use crate::model::IndexedDocument;

/// In-memory documents keyed by content hash, kept in insertion order.
#[derive(Debug, Default)]
pub struct IndexStore {
    docs: Vec<IndexedDocument>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry with the same hash in place, or appends.
    /// Returns true when an entry was replaced.
    pub fn upsert(&mut self, doc: IndexedDocument) -> bool {
        match self.docs.iter_mut().find(|d| d.hash == doc.hash) {
            Some(existing) => {
                *existing = doc;
                true
            }
            None => {
                self.docs.push(doc);
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.docs.clear();
    }

    pub fn count(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, hash: &str) -> Option<&IndexedDocument> {
        self.docs.iter().find(|d| d.hash == hash)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexedDocument> {
        self.docs.iter()
    }
}
