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

use serde::Serialize;
use tracing::debug;

use crate::rubric::Criterion;
use crate::rubric::EvaluationResult;
use crate::rubric::RUBRIC;

const MAX_SUGGESTIONS: usize = 5;
const HINT_THRESHOLD_PCT: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum QualityLevel {
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.60 {
            QualityLevel::Excellent
        } else if confidence >= 0.45 {
            QualityLevel::Good
        } else if confidence >= 0.30 {
            QualityLevel::Fair
        } else if confidence >= 0.15 {
            QualityLevel::Poor
        } else {
            QualityLevel::VeryPoor
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            QualityLevel::Excellent => "Excellent",
            QualityLevel::Good => "Good",
            QualityLevel::Fair => "Fair",
            QualityLevel::Poor => "Poor",
            QualityLevel::VeryPoor => "Very Poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionInfo {
    pub name: &'static str,
    pub weight: f64,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub confidence_score: f64,
    pub quality_level: QualityLevel,
    pub total_score: f64,
    pub max_score: f64,
    pub evaluations: Vec<EvaluationResult>,
    pub overall_suggestions: Vec<String>,
    pub rubric: Vec<CriterionInfo>,
}

impl EvaluationReport {
    pub fn criterion(&self, criterion: Criterion) -> Option<&EvaluationResult> {
        let name = criterion.spec().name;
        self.evaluations.iter().find(|e| e.criteria == name)
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Scores an extraction pair against every rubric criterion.
pub fn evaluate(ocr_text: &str, visual_description: &str) -> EvaluationReport {
    let evaluations: Vec<EvaluationResult> = RUBRIC
        .iter()
        .map(|spec| spec.criterion.score(ocr_text, visual_description))
        .collect();

    let mut total = 0.0;
    let mut max_total = 0.0;
    for (result, spec) in evaluations.iter().zip(RUBRIC.iter()) {
        let weight = spec.weight();
        if result.max_score > 0.0 {
            let weighted = result.score / result.max_score * weight;
            debug!(
                criterion = spec.name,
                score = result.score,
                max = result.max_score,
                weighted,
                reasoning = %result.reasoning,
                "criterion scored"
            );
            total += weighted;
        }
        max_total += weight;
    }

    let mut confidence = if max_total > 0.0 {
        total / max_total
    } else {
        0.0
    };
    if !confidence.is_finite() {
        confidence = 0.0;
    }
    let confidence = confidence.clamp(0.0, 1.0);
    let quality_level = QualityLevel::from_confidence(confidence);
    debug!(
        confidence,
        quality = quality_level.as_label(),
        "evaluation finished"
    );

    let mut overall_suggestions: Vec<String> = Vec::new();
    for suggestion in evaluations.iter().flat_map(|e| e.suggestions.iter()) {
        if !overall_suggestions.contains(suggestion) {
            overall_suggestions.push(suggestion.clone());
        }
    }
    overall_suggestions.truncate(MAX_SUGGESTIONS);

    EvaluationReport {
        confidence_score: round_to(confidence, 3),
        quality_level,
        total_score: round_to(total, 2),
        max_score: round_to(max_total, 2),
        evaluations,
        overall_suggestions,
        rubric: RUBRIC
            .iter()
            .map(|spec| CriterionInfo {
                name: spec.name,
                weight: spec.weight(),
                description: spec.description,
            })
            .collect(),
    }
}

/// A concrete change to the extraction strategy for a weak criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyHint {
    pub category: &'static str,
    pub issue: &'static str,
    pub suggestion: &'static str,
    pub prompt_addition: &'static str,
}

const HINTS: &[(Criterion, StrategyHint)] = &[
    (
        Criterion::TextCompleteness,
        StrategyHint {
            category: "Text Extraction",
            issue: "Low text completeness score",
            suggestion: "Add instruction to scan all areas of the image systematically",
            prompt_addition: "Please scan the entire image systematically from top to bottom, left to right, including headers, footers, sidebars, and any overlay text.",
        },
    ),
    (
        Criterion::VisualCoverage,
        StrategyHint {
            category: "Visual Description",
            issue: "Limited visual element coverage",
            suggestion: "Enhance visual element identification instructions",
            prompt_addition: "Identify and describe all UI elements including buttons, icons, input fields, dropdowns, navigation menus, images, and their positions.",
        },
    ),
    (
        Criterion::LayoutDescription,
        StrategyHint {
            category: "Layout Analysis",
            issue: "Poor spatial relationship description",
            suggestion: "Add specific layout analysis instructions",
            prompt_addition: "Describe the spatial layout including the arrangement of elements (top, bottom, left, right, center), grid structures, columns, and visual hierarchy.",
        },
    ),
    (
        Criterion::ColorStyle,
        StrategyHint {
            category: "Visual Style",
            issue: "Limited color and style recognition",
            suggestion: "Include detailed style analysis",
            prompt_addition: "Note the color scheme, design style (modern, minimal, etc.), visual effects (shadows, gradients), and overall aesthetic.",
        },
    ),
];

pub fn strategy_hints(report: &EvaluationReport) -> Vec<StrategyHint> {
    HINTS
        .iter()
        .filter(|(criterion, _)| {
            report
                .criterion(*criterion)
                .is_none_or(|result| result.percentage < HINT_THRESHOLD_PCT)
        })
        .map(|(_, hint)| hint.clone())
        .collect()
}
