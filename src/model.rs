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

//! Shared domain types used across ingestion, ranking, and output.

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::evaluate::EvaluationReport;

#[derive(Debug, Clone, Serialize)]
pub struct IndexedDocument {
    pub hash: String,
    pub name: String,
    pub ocr_text: String,
    pub visual_description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub evaluation: Option<QualityEvaluation>,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl IndexedDocument {
    pub fn new(
        hash: impl Into<String>,
        name: impl Into<String>,
        ocr_text: impl Into<String>,
        visual_description: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            ocr_text: ocr_text.into(),
            visual_description: visual_description.into(),
            created_at,
            evaluation: None,
            embedding: None,
        }
    }

    pub fn with_evaluation(mut self, evaluation: QualityEvaluation) -> Self {
        self.evaluation = Some(evaluation);
        self
    }

    /// Text fed to the embedding function.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.ocr_text, self.visual_description)
    }

    /// Precomputed confidence, if the attached evaluation carries one.
    pub fn confidence(&self) -> Option<f32> {
        self.evaluation
            .as_ref()
            .and_then(|evaluation| evaluation.confidence)
            .map(|c| c as f32)
    }
}

/// A quality evaluation attached to a document before indexing.
///
/// `confidence` is `None` when the payload has no usable `confidence_score`;
/// backends then fall back to their own score.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct QualityEvaluation {
    #[serde(skip)]
    pub confidence: Option<f64>,
    pub payload: Value,
}

impl QualityEvaluation {
    pub fn from_report(report: &EvaluationReport) -> Self {
        Self {
            confidence: Some(report.confidence_score),
            payload: serde_json::to_value(report).unwrap_or(Value::Null),
        }
    }

    pub fn from_value(payload: Value) -> Self {
        let confidence = payload
            .get("confidence_score")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0));
        if confidence.is_none() {
            tracing::debug!("evaluation payload has no usable confidence_score");
        }
        Self {
            confidence,
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Text,
    Visual,
    Combined,
}

impl MatchType {
    /// Picks the signal that dominates by more than 1.5x, else `Combined`.
    pub fn classify(text_score: f32, visual_score: f32) -> Self {
        if text_score > visual_score * 1.5 {
            MatchType::Text
        } else if visual_score > text_score * 1.5 {
            MatchType::Visual
        } else {
            MatchType::Combined
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            MatchType::Text => "text",
            MatchType::Visual => "visual",
            MatchType::Combined => "combined",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Signals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<f32>,
    pub text: f32,
    pub visual: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub hash: String,
    pub name: String,
    pub score: f32,
    pub confidence_score: f32,
    pub ocr_text: String,
    pub visual_description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub match_type: MatchType,
    pub evaluation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<Signals>,
}

impl SearchResult {
    /// Builds a result, letting a precomputed confidence override `score`
    /// in `confidence_score`.
    pub fn from_document(
        doc: &IndexedDocument,
        score: f32,
        match_type: MatchType,
        signals: Option<Signals>,
    ) -> Self {
        let confidence_score = match doc.confidence() {
            Some(confidence) => confidence,
            None => score,
        };
        Self {
            hash: doc.hash.clone(),
            name: doc.name.clone(),
            score,
            confidence_score,
            ocr_text: doc.ocr_text.clone(),
            visual_description: doc.visual_description.clone(),
            created_at: doc.created_at,
            match_type,
            evaluation: doc.evaluation.as_ref().map(|e| e.payload.clone()),
            signals,
        }
    }
}
