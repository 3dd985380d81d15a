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

//! Evaluate, record, and index each incoming extraction.

use serde_json::json;
use tracing::info;

use crate::evaluate::EvaluationReport;
use crate::evaluate::evaluate;
use crate::model::IndexedDocument;
use crate::model::QualityEvaluation;
use crate::model::SearchResult;
use crate::search::SearchBackend;
use crate::tracker::PerformanceSummary;
use crate::tracker::PerformanceTracker;

#[derive(Debug)]
pub struct IngestOutcome {
    pub hash: String,
    pub name: String,
    /// Present when the pipeline evaluated the document itself.
    pub report: Option<EvaluationReport>,
    pub replaced: bool,
}

pub struct Pipeline {
    backend: Box<dyn SearchBackend>,
    tracker: PerformanceTracker,
    strategy: String,
    evaluate: bool,
}

impl Pipeline {
    pub fn new(backend: Box<dyn SearchBackend>, strategy: impl Into<String>) -> Self {
        let strategy = strategy.into();
        info!(backend = backend.name(), strategy = %strategy, "pipeline ready");
        Self {
            backend,
            tracker: PerformanceTracker::new(),
            strategy,
            evaluate: true,
        }
    }

    /// Skips evaluation for documents without a precomputed one.
    pub fn without_evaluation(mut self) -> Self {
        self.evaluate = false;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn ingest(&mut self, doc: IndexedDocument) -> IngestOutcome {
        let (doc, report) = self.prepare(doc);
        let hash = doc.hash.clone();
        let name = doc.name.clone();
        let replaced = self.backend.index(doc);
        IngestOutcome {
            hash,
            name,
            report,
            replaced,
        }
    }

    /// Ingests a batch through the backend's batch path, in input order.
    pub fn ingest_all(&mut self, docs: Vec<IndexedDocument>) -> Vec<IngestOutcome> {
        let mut outcomes = Vec::with_capacity(docs.len());
        let mut prepared = Vec::with_capacity(docs.len());
        for doc in docs {
            let (doc, report) = self.prepare(doc);
            outcomes.push(IngestOutcome {
                hash: doc.hash.clone(),
                name: doc.name.clone(),
                report,
                replaced: false,
            });
            prepared.push(doc);
        }
        let flags = self.backend.index_all(prepared);
        for (outcome, replaced) in outcomes.iter_mut().zip(flags) {
            outcome.replaced = replaced;
        }
        info!(
            backend = self.backend.name(),
            ingested = outcomes.len(),
            indexed = self.backend.count(),
            "batch ingested"
        );
        outcomes
    }

    fn prepare(&mut self, doc: IndexedDocument) -> (IndexedDocument, Option<EvaluationReport>) {
        if doc.evaluation.is_some() || !self.evaluate {
            return (doc, None);
        }
        let report = evaluate(&doc.ocr_text, &doc.visual_description);
        self.tracker.record(
            &self.strategy,
            report.confidence_score,
            json!({ "name": doc.name, "hash": doc.hash }),
        );
        let doc = doc.with_evaluation(QualityEvaluation::from_report(&report));
        (doc, Some(report))
    }

    pub fn query(&self, text: &str, top_k: usize) -> Vec<SearchResult> {
        self.backend.query(text, top_k)
    }

    pub fn clear(&mut self) {
        self.backend.clear();
    }

    pub fn count(&self) -> usize {
        self.backend.count()
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn summary(&self) -> PerformanceSummary {
        self.tracker.summarize(&self.strategy)
    }
}
