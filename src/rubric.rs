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

//! Fixed scoring rubric for (OCR text, visual description) pairs.
//!
//! Each criterion is a pure function returning a score in `[0, MAX_SCORE]`.
//! Weights are integer percentages so the table sums to exactly 1.0.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    TextCompleteness,
    TextAccuracy,
    VisualCoverage,
    LayoutDescription,
    ColorStyle,
    Searchability,
}

#[derive(Debug, Clone, Copy)]
pub struct CriterionSpec {
    pub criterion: Criterion,
    pub name: &'static str,
    pub weight_pct: u32,
    pub description: &'static str,
}

impl CriterionSpec {
    pub fn weight(&self) -> f64 {
        f64::from(self.weight_pct) / 100.0
    }
}

pub const RUBRIC: [CriterionSpec; 6] = [
    CriterionSpec {
        criterion: Criterion::TextCompleteness,
        name: "Text Completeness",
        weight_pct: 15,
        description: "How completely the OCR captures all visible text",
    },
    CriterionSpec {
        criterion: Criterion::TextAccuracy,
        name: "Text Accuracy",
        weight_pct: 10,
        description: "Accuracy of extracted text without errors or gibberish",
    },
    CriterionSpec {
        criterion: Criterion::VisualCoverage,
        name: "Visual Element Coverage",
        weight_pct: 30,
        description: "How well buttons, icons and other UI components are described",
    },
    CriterionSpec {
        criterion: Criterion::LayoutDescription,
        name: "Layout Description",
        weight_pct: 20,
        description: "Quality of spatial relationships and layout description",
    },
    CriterionSpec {
        criterion: Criterion::ColorStyle,
        name: "Color and Style Recognition",
        weight_pct: 15,
        description: "Accuracy in identifying colors, themes, and visual styles",
    },
    CriterionSpec {
        criterion: Criterion::Searchability,
        name: "Searchability",
        weight_pct: 10,
        description: "How well the extraction enables effective searching",
    },
];

const fn total_weight_pct() -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < RUBRIC.len() {
        total += RUBRIC[i].weight_pct;
        i += 1;
    }
    total
}

const _: () = assert!(total_weight_pct() == 100, "rubric weights must sum to 1.0");

const UI_TEXT_PATTERNS: &[&str] = &["button", "click", "menu", "submit", "cancel", "save", "delete"];

const VISUAL_CATEGORIES: &[(&str, &[&str])] = &[
    ("buttons", &["button", "btn", "clickable"]),
    ("icons", &["icon", "symbol", "glyph"]),
    ("images", &["image", "photo", "picture", "graphic"]),
    ("forms", &["input", "field", "textbox", "dropdown", "checkbox"]),
    ("layout", &["header", "footer", "sidebar", "navigation", "menu"]),
];

const SPATIAL_TERMS: &[&str] = &[
    "top", "bottom", "left", "right", "center", "middle", "above", "below", "beside", "next to",
    "corner",
];

const STRUCTURE_TERMS: &[&str] = &["grid", "row", "column", "panel"];

const COLOR_TERMS: &[&str] = &[
    "red", "blue", "green", "yellow", "black", "white", "gray", "orange", "purple", "pink",
    "dark", "light", "bright",
];

const STYLE_TERMS: &[&str] = &[
    "modern",
    "minimal",
    "flat",
    "gradient",
    "shadow",
    "rounded",
    "border",
    "transparent",
    "bold",
    "italic",
];

static GIBBERISH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]{5,}").expect("gibberish pattern"));
static ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,}\b").expect("acronym pattern"));
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\b").expect("number pattern"));

/// Score of a single criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub criteria: String,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub reasoning: String,
    pub suggestions: Vec<String>,
}

impl Criterion {
    pub fn spec(self) -> &'static CriterionSpec {
        RUBRIC
            .iter()
            .find(|spec| spec.criterion == self)
            .unwrap_or(&RUBRIC[0])
    }

    pub fn score(self, ocr_text: &str, visual_description: &str) -> EvaluationResult {
        match self {
            Criterion::TextCompleteness => text_completeness(ocr_text),
            Criterion::TextAccuracy => text_accuracy(ocr_text),
            Criterion::VisualCoverage => visual_coverage(visual_description),
            Criterion::LayoutDescription => layout_description(visual_description),
            Criterion::ColorStyle => color_style(visual_description),
            Criterion::Searchability => searchability(ocr_text, visual_description),
        }
    }
}

fn finish(
    criterion: Criterion,
    score: f64,
    reasoning: String,
    suggestions: Vec<String>,
) -> EvaluationResult {
    let score = if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_SCORE)
    };
    let percentage = (score / MAX_SCORE * 1000.0).round() / 10.0;
    EvaluationResult {
        criteria: criterion.spec().name.to_string(),
        score,
        max_score: MAX_SCORE,
        percentage,
        reasoning,
        suggestions,
    }
}

fn count_terms(haystack: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|term| haystack.contains(*term)).count()
}

pub fn text_completeness(ocr_text: &str) -> EvaluationResult {
    let mut suggestions = Vec::new();
    let length = ocr_text.trim().chars().count();
    let words = ocr_text.split_whitespace().count();

    let (mut score, mut reasoning) = match length {
        0 => {
            suggestions.push("Ensure the screenshot contains visible text".to_string());
            suggestions.push("Check if the image quality is sufficient for OCR".to_string());
            (0.0, "No text extracted from the screenshot".to_string())
        }
        1..50 => {
            suggestions.push("Verify if all visible text areas are being processed".to_string());
            (3.0, format!("Minimal text extracted ({words} words)"))
        }
        50..150 => {
            suggestions.push(
                "Check for text in headers, footers, or sidebars that might be missed".to_string(),
            );
            (6.0, format!("Moderate amount of text extracted ({words} words)"))
        }
        150..500 => (8.0, format!("Good amount of text extracted ({words} words)")),
        500..1000 => (9.0, format!("Very good amount of text extracted ({words} words)")),
        _ => (10.0, format!("Excellent amount of text extracted ({words} words)")),
    };

    let lower = ocr_text.to_lowercase();
    if count_terms(&lower, UI_TEXT_PATTERNS) > 3 {
        score = f64::min(MAX_SCORE, score + 1.0);
        reasoning.push_str(". Good coverage of UI text elements");
    }

    finish(Criterion::TextCompleteness, score, reasoning, suggestions)
}

/// True when the text has cased characters and they are all upper or all lower.
fn uniform_case(text: &str) -> bool {
    let mut upper = false;
    let mut lower = false;
    for ch in text.chars() {
        if ch.is_uppercase() {
            upper = true;
        } else if ch.is_lowercase() {
            lower = true;
        }
    }
    upper != lower
}

pub fn text_accuracy(ocr_text: &str) -> EvaluationResult {
    let mut score = 8.0;
    let mut suggestions = Vec::new();
    let mut reasoning = "Text appears to be accurately extracted".to_string();

    if GIBBERISH.is_match(ocr_text) {
        score -= 3.0;
        reasoning = "Detected potential OCR errors or gibberish text".to_string();
        suggestions.push("Improve image quality or resolution for better OCR".to_string());
    }

    if uniform_case(ocr_text) {
        score -= 1.0;
        suggestions.push("Check if case sensitivity is being preserved correctly".to_string());
    }

    if ocr_text
        .split_whitespace()
        .any(|word| word.chars().count() > 30)
    {
        score -= 2.0;
        reasoning = "Found unusually long words suggesting OCR errors".to_string();
        suggestions.push("Review word segmentation in the OCR process".to_string());
    }

    finish(Criterion::TextAccuracy, score, reasoning, suggestions)
}

pub fn visual_coverage(visual_description: &str) -> EvaluationResult {
    let lower = visual_description.to_lowercase();
    let mut suggestions = Vec::new();
    let mut score = 0.0;

    let found: Vec<&str> = VISUAL_CATEGORIES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(category, _)| *category)
        .collect();
    score += 2.0 * found.len() as f64;

    let length = visual_description.trim().chars().count();
    if length > 500 {
        score += 2.0;
    } else if length > 200 {
        score += 1.0;
    }

    let reasoning = match found.len() {
        0 if length > 200 => {
            score = f64::max(score, 4.0);
            suggestions.push("Try to identify specific UI components more explicitly".to_string());
            "Detailed visual description provided, but specific UI elements not clearly identified"
                .to_string()
        }
        0 => {
            suggestions.push("Enhance visual element detection in the description".to_string());
            suggestions.push("Include more specific UI component identification".to_string());
            "No specific visual elements identified".to_string()
        }
        1 => {
            suggestions.push("Expand coverage of visual elements".to_string());
            let mut reasoning = format!("Some visual elements described: {}", found.join(", "));
            if length > 300 {
                reasoning.push_str(" with good detail");
            }
            reasoning
        }
        _ => {
            let mut reasoning = format!("Good coverage of visual elements: {}", found.join(", "));
            if length > 400 {
                reasoning.push_str(" with excellent detail");
            }
            reasoning
        }
    };

    finish(Criterion::VisualCoverage, score, reasoning, suggestions)
}

pub fn layout_description(visual_description: &str) -> EvaluationResult {
    let lower = visual_description.to_lowercase();
    let mut suggestions = Vec::new();

    let (mut score, mut reasoning) = match count_terms(&lower, SPATIAL_TERMS) {
        0 => {
            suggestions.push("Add spatial and positional descriptions".to_string());
            (2.0, "No spatial relationships described".to_string())
        }
        1 | 2 => {
            suggestions.push("Provide more detailed layout descriptions".to_string());
            (5.0, "Basic spatial relationships described".to_string())
        }
        _ => (8.0, "Good spatial and layout descriptions".to_string()),
    };

    if count_terms(&lower, STRUCTURE_TERMS) > 0 {
        score = f64::min(MAX_SCORE, score + 2.0);
        reasoning.push_str(". Includes structural layout information");
    }

    finish(Criterion::LayoutDescription, score, reasoning, suggestions)
}

pub fn color_style(visual_description: &str) -> EvaluationResult {
    let lower = visual_description.to_lowercase();
    let mut suggestions = Vec::new();

    let colors = count_terms(&lower, COLOR_TERMS);
    let styles = count_terms(&lower, STYLE_TERMS);
    let score = f64::min(MAX_SCORE, (colors * 2 + styles * 2) as f64);

    if colors == 0 {
        suggestions.push("Include color information in descriptions".to_string());
    }
    if styles == 0 {
        suggestions.push("Describe visual styles and design patterns".to_string());
    }

    let reasoning = if score < 4.0 {
        "Minimal color and style information"
    } else if score < 7.0 {
        "Some color and style details included"
    } else {
        "Good color and style recognition"
    };

    finish(Criterion::ColorStyle, score, reasoning.to_string(), suggestions)
}

pub fn searchability(ocr_text: &str, visual_description: &str) -> EvaluationResult {
    let combined = format!("{ocr_text} {visual_description}");
    let mut suggestions = Vec::new();

    let word_count = combined.split_whitespace().count();
    let lower = combined.to_lowercase();
    let unique_words = lower.split_whitespace().collect::<HashSet<_>>().len();

    let (mut score, reasoning) = if word_count < 20 {
        suggestions.push("Extract more detailed information from screenshots".to_string());
        (2.0, "Insufficient content for effective searching")
    } else if (unique_words as f64) / (word_count as f64) < 0.3 {
        suggestions.push("Improve variety in descriptions".to_string());
        (4.0, "Low keyword diversity may limit search effectiveness")
    } else {
        (8.0, "Good keyword coverage for searching")
    };

    if ACRONYM.is_match(&combined) {
        score = f64::min(MAX_SCORE, score + 1.0);
    }
    if NUMBER.is_match(&combined) {
        score = f64::min(MAX_SCORE, score + 1.0);
    }

    finish(
        Criterion::Searchability,
        score,
        reasoning.to_string(),
        suggestions,
    )
}

/// Plain-text rendering of the rubric, one criterion per line.
pub fn render_table() -> String {
    RUBRIC
        .iter()
        .map(|spec| format!("{:<28}{:.2}  {}", spec.name, spec.weight(), spec.description))
        .collect::<Vec<_>>()
        .join("\n")
}
